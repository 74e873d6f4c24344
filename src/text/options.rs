use std::path::PathBuf;

use crate::{
    color::Rgb8,
    error::{PosterError, PosterResult},
};

use super::model::{BoundingBox, HorizontalAlign, TextStyle, VerticalAlign};

/// Per-call text options; unset fields fall back to the image's default style.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TextOptions {
    pub x: Option<i32>,
    pub y: Option<i32>,
    /// Defaults to the canvas width remaining right of `x`.
    pub width: Option<i64>,
    /// Defaults to the canvas height remaining below `y`.
    pub height: Option<i64>,
    pub fontsize: Option<u32>,
    pub color: Option<Rgb8>,
    pub lineheight: Option<f32>,
    /// Clamped to `0..=100`.
    pub opacity: Option<i64>,
    pub horizontal: Option<HorizontalAlign>,
    pub vertical: Option<VerticalAlign>,
    #[serde(alias = "fontpath")]
    pub fontfile: Option<PathBuf>,
    pub angle: Option<f32>,
    pub debug: Option<bool>,
    pub seed: Option<u64>,
}

impl TextOptions {
    /// Merges these options over `defaults` and resolves the target box on a
    /// `canvas_width` x `canvas_height` canvas.
    pub fn resolve(
        &self,
        defaults: &TextStyle,
        canvas_width: u32,
        canvas_height: u32,
    ) -> PosterResult<(BoundingBox, TextStyle)> {
        let x = self.x.unwrap_or(0);
        let y = self.y.unwrap_or(0);
        let width = self
            .width
            .unwrap_or_else(|| i64::from(canvas_width) - i64::from(x));
        let height = self
            .height
            .unwrap_or_else(|| i64::from(canvas_height) - i64::from(y));
        let bbox = BoundingBox::new(x, y, width, height)?;

        let style = TextStyle {
            font_size: self.fontsize.unwrap_or(defaults.font_size),
            line_height: self.lineheight.unwrap_or(defaults.line_height),
            color: self.color.unwrap_or(defaults.color),
            opacity: match self.opacity {
                Some(op) => op.clamp(0, 100) as u8,
                None => defaults.opacity,
            },
            horizontal: self.horizontal.unwrap_or(defaults.horizontal),
            vertical: self.vertical.unwrap_or(defaults.vertical),
            font_file: self.fontfile.clone().or_else(|| defaults.font_file.clone()),
            angle: self.angle.unwrap_or(defaults.angle),
            debug: self.debug.unwrap_or(defaults.debug),
            debug_seed: self.seed.or(defaults.debug_seed),
        };
        if style.font_size == 0 {
            return Err(PosterError::validation("fontsize must be at least 1"));
        }
        Ok((bbox, style))
    }
}
