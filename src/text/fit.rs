use crate::error::PosterResult;

use super::{
    metrics::FontMetrics,
    model::{BoundingBox, HorizontalAlign, TextStyle, WrappedLine},
    wrap::LineBreaker,
};

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FitOutcome {
    pub font_size: u32,
    pub lines: Vec<WrappedLine>,
    /// False when the loop stopped at size 1 without fitting.
    pub converged: bool,
}

/// Shrinks the font size until the wrapped block fits its box.
pub struct FitSolver<'a, M: ?Sized> {
    metrics: &'a M,
}

impl<'a, M: FontMetrics + ?Sized> FitSolver<'a, M> {
    pub fn new(metrics: &'a M) -> Self {
        Self { metrics }
    }

    pub fn fit(
        &self,
        text: &str,
        bbox: &BoundingBox,
        style: &TextStyle,
    ) -> PosterResult<FitOutcome> {
        bbox.validate()?;
        let font_file = style.validate()?;

        let breaker = LineBreaker::new(self.metrics, font_file).with_angle(style.angle);
        let max_width = bbox.width as f32;
        let max_height = bbox.height as f32;
        let mut font_size = style.font_size;

        loop {
            let lines = breaker.wrap(text, max_width, font_size)?;
            let block_height = style.advance(font_size) * lines.len() as f32;
            let fits_width = style.horizontal != HorizontalAlign::Justify
                || lines.iter().all(|l| l.ink_width <= max_width);

            if block_height <= max_height && fits_width {
                return Ok(FitOutcome {
                    font_size,
                    lines,
                    converged: true,
                });
            }
            if font_size <= 1 {
                tracing::debug!(
                    lines = lines.len(),
                    block_height,
                    max_height,
                    "text does not fit even at size 1"
                );
                return Ok(FitOutcome {
                    font_size,
                    lines,
                    converged: false,
                });
            }
            font_size -= 1;
        }
    }
}
