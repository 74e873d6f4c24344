use std::path::Path;

use crate::error::PosterResult;

use super::{metrics::FontMetrics, model::WrappedLine};

/// Greedy word wrapper driven by measured ink widths.
///
/// Paragraphs are split on line breaks (`\n`, `\r\n`, `\r`); words on single
/// spaces, with runs of spaces collapsing. A word wider than the box on its own
/// stays on its own line rather than being split.
pub struct LineBreaker<'a, M: ?Sized> {
    metrics: &'a M,
    font_file: &'a Path,
    angle: f32,
}

impl<'a, M: FontMetrics + ?Sized> LineBreaker<'a, M> {
    pub fn new(metrics: &'a M, font_file: &'a Path) -> Self {
        Self {
            metrics,
            font_file,
            angle: 0.0,
        }
    }

    /// Measure lines rotated by `angle` degrees.
    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    fn width_of(&self, text: &str, font_size: u32) -> PosterResult<f32> {
        Ok(self
            .metrics
            .measure(text, self.font_file, font_size, self.angle)?
            .ink_width)
    }

    pub fn wrap(
        &self,
        text: &str,
        max_width: f32,
        font_size: u32,
    ) -> PosterResult<Vec<WrappedLine>> {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let mut lines = Vec::new();

        for paragraph in normalized.split('\n') {
            let start = lines.len();
            let mut current = String::new();
            let mut current_width = 0.0f32;

            for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
                if current.is_empty() {
                    current.push_str(word);
                    current_width = self.width_of(&current, font_size)?;
                    continue;
                }

                let candidate = format!("{current} {word}");
                let candidate_width = self.width_of(&candidate, font_size)?;
                if candidate_width > max_width {
                    lines.push(WrappedLine {
                        text: std::mem::take(&mut current),
                        ink_width: current_width,
                        paragraph_end: false,
                    });
                    current.push_str(word);
                    current_width = self.width_of(&current, font_size)?;
                } else {
                    current = candidate;
                    current_width = candidate_width;
                }
            }

            if !current.is_empty() || lines.len() == start {
                lines.push(WrappedLine {
                    text: current,
                    ink_width: current_width,
                    paragraph_end: false,
                });
            }
            if let Some(last) = lines.last_mut() {
                last.paragraph_end = true;
            }
        }

        Ok(lines)
    }
}
