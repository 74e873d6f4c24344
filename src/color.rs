use serde::{Deserialize, Serialize};

use crate::error::{PosterError, PosterResult};

/// Straight (non-premultiplied) 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Straight (non-premultiplied) 8-bit RGBA color used for draw calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgb8 {
    pub const BLACK: Rgb8 = Rgb8::new(0, 0, 0);
    pub const WHITE: Rgb8 = Rgb8::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb`, `#rrggbb` (the leading `#` is optional).
    pub fn parse_hex(s: &str) -> PosterResult<Self> {
        parse_hex(s).map_err(PosterError::validation)
    }

    /// Resolve the draw color for an opacity in `0..=100`.
    ///
    /// Opacity counts how much of the background shows through, so `0` is a
    /// fully opaque foreground and `100` is invisible.
    pub fn with_opacity(self, opacity: u8) -> Rgba8 {
        Rgba8 {
            r: self.r,
            g: self.g,
            b: self.b,
            a: opacity_to_alpha(opacity),
        }
    }
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_premul(self) -> [u8; 4] {
        let af = u16::from(self.a);
        let premul = |c: u8| -> u8 { ((u16::from(c) * af + 127) / 255) as u8 };
        [premul(self.r), premul(self.g), premul(self.b), self.a]
    }
}

impl From<[u8; 3]> for Rgb8 {
    fn from(c: [u8; 3]) -> Self {
        let [r, g, b] = c;
        Rgb8 { r, g, b }
    }
}

pub fn opacity_to_alpha(opacity: u8) -> u8 {
    // round((1 - opacity / 100) * 255) in integer arithmetic
    let visible = 100 - u32::from(opacity.min(100));
    ((visible * 255 + 50) / 100) as u8
}

impl<'de> Deserialize<'de> for Rgb8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            RgbObj { r: u8, g: u8, b: u8 },
            Arr(Vec<u8>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => parse_hex(&s).map_err(serde::de::Error::custom),
            Repr::RgbObj { r, g, b } => Ok(Rgb8 { r, g, b }),
            Repr::Arr(v) => {
                if v.len() == 3 {
                    Ok(Rgb8::new(v[0], v[1], v[2]))
                } else {
                    Err(serde::de::Error::custom(
                        "rgb array must have len 3 ([r,g,b])",
                    ))
                }
            }
        }
    }
}

fn parse_hex(s: &str) -> Result<Rgb8, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if !s.is_ascii() {
        return Err("hex color must be ascii".to_owned());
    }

    match s.len() {
        3 => {
            // #abc expands each digit: a -> aa
            let mut out = [0u8; 3];
            for (i, c) in s.chars().enumerate() {
                let pair: String = [c, c].iter().collect();
                out[i] = hex_byte(&pair)?;
            }
            Ok(Rgb8::from(out))
        }
        6 => Ok(Rgb8::new(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
        )),
        _ => Err("hex color must be #RGB or #RRGGBB (case-insensitive)".to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_short_and_long_hex() {
        let c: Rgb8 = serde_json::from_value(json!("#fff")).unwrap();
        assert_eq!(c, Rgb8::WHITE);

        let c: Rgb8 = serde_json::from_value(json!("#ff8000")).unwrap();
        assert_eq!(c, Rgb8::new(255, 128, 0));

        let c = Rgb8::parse_hex("0a0B0c").unwrap();
        assert_eq!(c, Rgb8::new(10, 11, 12));
    }

    #[test]
    fn parses_array_and_object() {
        let c: Rgb8 = serde_json::from_value(json!([1, 2, 3])).unwrap();
        assert_eq!(c, Rgb8::new(1, 2, 3));

        let c: Rgb8 = serde_json::from_value(json!({"r": 9, "g": 8, "b": 7})).unwrap();
        assert_eq!(c, Rgb8::new(9, 8, 7));

        assert!(serde_json::from_value::<Rgb8>(json!([1, 2])).is_err());
    }

    #[test]
    fn rejects_bad_hex() {
        assert!(Rgb8::parse_hex("#12345").is_err());
        assert!(Rgb8::parse_hex("#zzz").is_err());
    }

    #[test]
    fn opacity_is_inverted_alpha() {
        assert_eq!(opacity_to_alpha(0), 255);
        assert_eq!(opacity_to_alpha(100), 0);
        assert_eq!(opacity_to_alpha(50), 128);
        assert_eq!(opacity_to_alpha(250), 0);
        assert_eq!(Rgb8::BLACK.with_opacity(30).a, 179);
    }

    #[test]
    fn premul_scales_channels() {
        assert_eq!(Rgba8::new(255, 100, 0, 255).to_premul(), [255, 100, 0, 255]);
        assert_eq!(Rgba8::new(200, 100, 50, 0).to_premul(), [0, 0, 0, 0]);
        let half_white = Rgba8::new(255, 255, 255, 128);
        assert_eq!(half_white.to_premul(), [128, 128, 128, 128]);
    }
}
