//! Resize and crop arithmetic shared by the editor operations.

use std::str::FromStr;

use crate::error::{PosterError, PosterResult};

/// How `resize` treats a requested size whose aspect ratio differs from the image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ResizeMode {
    /// Use the requested size as is, distorting if needed.
    Exact,
    /// Largest size with the image's ratio inside the request.
    #[default]
    Contain,
    /// Smallest size with the image's ratio covering the request.
    Cover,
}

/// Crop anchor used by `fit`. Unknown names deserialize to [`FitPosition::Center`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case", from = "String")]
pub enum FitPosition {
    TopLeft,
    Top,
    TopRight,
    Left,
    #[default]
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl FromStr for FitPosition {
    type Err = PosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "top-left" => Self::TopLeft,
            "top" => Self::Top,
            "top-right" => Self::TopRight,
            "left" => Self::Left,
            "center" => Self::Center,
            "right" => Self::Right,
            "bottom-left" => Self::BottomLeft,
            "bottom" => Self::Bottom,
            "bottom-right" => Self::BottomRight,
            other => {
                return Err(PosterError::validation(format!(
                    "unknown fit position '{other}'"
                )));
            }
        })
    }
}

impl From<String> for FitPosition {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_else(|err| {
            tracing::debug!(%err, "falling back to center crop");
            Self::default()
        })
    }
}

impl TryFrom<String> for ResizeMode {
    type Error = PosterError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl FromStr for ResizeMode {
    type Err = PosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "contain" => Ok(Self::Contain),
            "cover" => Ok(Self::Cover),
            other => Err(PosterError::validation(format!(
                "unknown resize mode '{other}'"
            ))),
        }
    }
}

impl FitPosition {
    /// Top-left corner of a `width` x `height` window anchored inside `outer`.
    pub fn origin(self, outer: (u32, u32), width: u32, height: u32) -> (i64, i64) {
        let free_x = i64::from(outer.0) - i64::from(width);
        let free_y = i64::from(outer.1) - i64::from(height);
        let (fx, fy) = match self {
            Self::TopLeft => (0, 0),
            Self::Top => (1, 0),
            Self::TopRight => (2, 0),
            Self::Left => (0, 1),
            Self::Center => (1, 1),
            Self::Right => (2, 1),
            Self::BottomLeft => (0, 2),
            Self::Bottom => (1, 2),
            Self::BottomRight => (2, 2),
        };
        // integer division truncates toward zero, matching the centred crop
        (free_x * fx / 2, free_y * fy / 2)
    }
}

/// Offset that centres `inner` on `outer`, rounded up.
pub fn find_center(outer: i64, inner: i64) -> i64 {
    let diff = outer - inner;
    // ceil(diff / 2) for both signs
    diff.div_euclid(2) + diff.rem_euclid(2)
}

/// Fills a missing side from the source aspect ratio.
pub fn complete_size(
    source: (u32, u32),
    width: Option<u32>,
    height: Option<u32>,
) -> PosterResult<(u32, u32)> {
    let (sw, sh) = source;
    if sw == 0 || sh == 0 {
        return Err(PosterError::invalid_geometry("source image has no pixels"));
    }
    let ratio = f64::from(sw) / f64::from(sh);
    let (w, h) = match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, (f64::from(w) / ratio) as u32),
        (None, Some(h)) => ((f64::from(h) * ratio) as u32, h),
        (None, None) => (sw, sh),
    };
    if w == 0 || h == 0 {
        return Err(PosterError::invalid_geometry(format!(
            "resolved size {w}x{h} is empty"
        )));
    }
    Ok((w, h))
}

/// Adjusts a requested size to the source `ratio` under `mode`.
pub fn calc_resizes(width: u32, height: u32, ratio: f64, mode: ResizeMode) -> (u32, u32) {
    let requested = f64::from(width) / f64::from(height.max(1));
    let from_height = || ((f64::from(height) * ratio) as u32).max(1);
    let from_width = || ((f64::from(width) / ratio) as u32).max(1);
    match mode {
        ResizeMode::Exact => (width, height),
        ResizeMode::Contain if requested > ratio => (from_height(), height),
        ResizeMode::Contain => (width, from_width()),
        ResizeMode::Cover if requested > ratio => (width, from_width()),
        ResizeMode::Cover => (from_height(), height),
    }
}
