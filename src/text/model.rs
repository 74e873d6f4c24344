use std::{path::PathBuf, str::FromStr};

use crate::{
    color::Rgb8,
    error::{PosterError, PosterResult},
};

/// Unknown names deserialize to [`HorizontalAlign::Left`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum HorizontalAlign {
    #[default]
    Left,
    Center,
    Right,
    /// Stretch word gaps so the line spans the full box width.
    Justify,
}

/// Unknown names deserialize to [`VerticalAlign::Top`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum VerticalAlign {
    #[default]
    Top,
    Center,
    Bottom,
    /// Spread the lines so the block spans the full box height.
    Justify,
}

impl FromStr for HorizontalAlign {
    type Err = PosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            "justify" => Ok(Self::Justify),
            other => Err(PosterError::validation(format!(
                "unknown horizontal alignment '{other}'"
            ))),
        }
    }
}

impl FromStr for VerticalAlign {
    type Err = PosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "center" => Ok(Self::Center),
            "bottom" => Ok(Self::Bottom),
            "justify" => Ok(Self::Justify),
            other => Err(PosterError::validation(format!(
                "unknown vertical alignment '{other}'"
            ))),
        }
    }
}

impl From<String> for HorizontalAlign {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_else(|err| {
            tracing::debug!(%err, "falling back to left alignment");
            Self::default()
        })
    }
}

impl From<String> for VerticalAlign {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_else(|err| {
            tracing::debug!(%err, "falling back to top alignment");
            Self::default()
        })
    }
}

/// Everything that controls how a text block looks, apart from its box.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// Initial size in points; the fit loop only ever shrinks it.
    pub font_size: u32,
    /// Baseline advance as a multiple of the font size.
    pub line_height: f32,
    pub color: Rgb8,
    /// 0 is fully opaque, 100 fully transparent.
    pub opacity: u8,
    pub horizontal: HorizontalAlign,
    pub vertical: VerticalAlign,
    pub font_file: Option<PathBuf>,
    /// Counter-clockwise rotation in degrees.
    pub angle: f32,
    pub debug: bool,
    /// Seed for the debug overlay colour; random when unset.
    pub debug_seed: Option<u64>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 48,
            line_height: 1.5,
            color: Rgb8::BLACK,
            opacity: 0,
            horizontal: HorizontalAlign::Left,
            vertical: VerticalAlign::Top,
            font_file: None,
            angle: 0.0,
            debug: false,
            debug_seed: None,
        }
    }
}

impl TextStyle {
    /// Checks the style and returns the font file it names.
    pub fn validate(&self) -> PosterResult<&std::path::Path> {
        if self.font_size == 0 {
            return Err(PosterError::validation("font size must be at least 1"));
        }
        if !self.line_height.is_finite() || self.line_height <= 0.0 {
            return Err(PosterError::validation(format!(
                "line height must be a positive number, got {}",
                self.line_height
            )));
        }
        if self.opacity > 100 {
            return Err(PosterError::validation(format!(
                "opacity must be within 0..=100, got {}",
                self.opacity
            )));
        }
        if !self.angle.is_finite() {
            return Err(PosterError::validation("angle must be finite"));
        }
        self.font_file
            .as_deref()
            .ok_or_else(|| PosterError::invalid_font("no font file configured"))
    }

    /// Distance between consecutive baselines at `font_size`.
    pub fn advance(&self, font_size: u32) -> f32 {
        font_size as f32 * self.line_height
    }
}

/// Target rectangle for a text block, in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i64, height: i64) -> PosterResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(PosterError::invalid_geometry(format!(
                "text box must have a positive size, got {width}x{height}"
            )));
        }
        let width = u32::try_from(width)
            .map_err(|_| PosterError::invalid_geometry(format!("box width {width} too large")))?;
        let height = u32::try_from(height).map_err(|_| {
            PosterError::invalid_geometry(format!("box height {height} too large"))
        })?;
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    pub fn validate(&self) -> PosterResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PosterError::invalid_geometry(format!(
                "text box must have a positive size, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Region a drawn block actually occupies; feed `bottom()` into the next block's `y`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Boundary {
    pub x: i32,
    pub y: i32,
    /// Widest line's ink width.
    pub width: u32,
    /// Line count times the baseline advance.
    pub height: u32,
}

impl Boundary {
    pub fn bottom(&self) -> i32 {
        let height = i32::try_from(self.height).unwrap_or(i32::MAX);
        self.y.saturating_add(height)
    }
}

/// One line produced by the line breaker.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct WrappedLine {
    pub text: String,
    pub ink_width: f32,
    /// Last line of an explicit paragraph.
    pub paragraph_end: bool,
}

impl WrappedLine {
    pub fn words(&self) -> usize {
        self.text.split(' ').filter(|w| !w.is_empty()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let style = TextStyle::default();
        assert_eq!(style.font_size, 48);
        assert_eq!(style.line_height, 1.5);
        assert_eq!(style.color, Rgb8::BLACK);
        assert_eq!(style.opacity, 0);
        assert_eq!(style.horizontal, HorizontalAlign::Left);
        assert_eq!(style.vertical, VerticalAlign::Top);
        assert!(!style.debug);
    }

    #[test]
    fn validate_requires_font_file() {
        let err = TextStyle::default().validate().unwrap_err();
        assert!(matches!(err, PosterError::InvalidFont(_)));
    }

    #[test]
    fn validate_rejects_bad_numbers() {
        let base = TextStyle {
            font_file: Some("a.ttf".into()),
            ..TextStyle::default()
        };
        assert!(base.validate().is_ok());

        for bad in [
            TextStyle {
                font_size: 0,
                ..base.clone()
            },
            TextStyle {
                line_height: 0.0,
                ..base.clone()
            },
            TextStyle {
                line_height: f32::NAN,
                ..base.clone()
            },
            TextStyle {
                opacity: 101,
                ..base.clone()
            },
        ] {
            assert!(matches!(bad.validate(), Err(PosterError::Validation(_))));
        }
    }

    #[test]
    fn bounding_box_rejects_empty_sizes() {
        assert!(matches!(
            BoundingBox::new(0, 0, 0, 10),
            Err(PosterError::InvalidGeometry(_))
        ));
        assert!(matches!(
            BoundingBox::new(0, 0, 10, -3),
            Err(PosterError::InvalidGeometry(_))
        ));
        assert!(BoundingBox::new(-5, -5, 10, 10).is_ok());
    }

    #[test]
    fn alignments_parse_case_insensitively() {
        assert_eq!(
            "Justify".parse::<HorizontalAlign>().unwrap(),
            HorizontalAlign::Justify
        );
        assert_eq!(
            " bottom ".parse::<VerticalAlign>().unwrap(),
            VerticalAlign::Bottom
        );
        assert!("middle".parse::<VerticalAlign>().is_err());
    }

    #[test]
    fn alignment_json_goes_through_the_same_parser() {
        let h: HorizontalAlign = serde_json::from_str(r#""RIGHT""#).unwrap();
        assert_eq!(h, HorizontalAlign::Right);
        let v: VerticalAlign = serde_json::from_str(r#""Center""#).unwrap();
        assert_eq!(v, VerticalAlign::Center);
    }

    #[test]
    fn unknown_alignment_json_falls_back_to_default() {
        let h: HorizontalAlign = serde_json::from_str(r#""start""#).unwrap();
        assert_eq!(h, HorizontalAlign::Left);
        let v: VerticalAlign = serde_json::from_str(r#""middle""#).unwrap();
        assert_eq!(v, VerticalAlign::Top);
        assert_eq!(
            serde_json::to_string(&HorizontalAlign::Justify).unwrap(),
            r#""justify""#
        );
    }

    #[test]
    fn boundary_bottom_stacks_blocks() {
        let b = Boundary {
            x: 10,
            y: 20,
            width: 100,
            height: 75,
        };
        assert_eq!(b.bottom(), 95);
    }

    #[test]
    fn word_count_ignores_extra_spaces() {
        let line = WrappedLine {
            text: "a  b c".into(),
            ink_width: 0.0,
            paragraph_end: false,
        };
        assert_eq!(line.words(), 3);
    }
}
