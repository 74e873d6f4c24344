use super::model::{Boundary, BoundingBox, HorizontalAlign, TextStyle, VerticalAlign, WrappedLine};

/// A line with its resolved draw origin.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    /// Baseline y in canvas space.
    pub baseline: f32,
    pub ink_width: f32,
    /// Width after justify stretching; equals `ink_width` otherwise.
    pub drawn_width: f32,
    pub advance: f32,
    /// Extra pixels added to each inter-word gap.
    pub word_spacing: f32,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct LayoutResult {
    pub font_size: u32,
    pub advance: f32,
    pub lines: Vec<PlacedLine>,
    pub boundary: Boundary,
    pub converged: bool,
}

/// Resolves per-line origins for `lines` wrapped at `font_size`.
pub fn place(
    lines: Vec<WrappedLine>,
    bbox: &BoundingBox,
    style: &TextStyle,
    font_size: u32,
) -> LayoutResult {
    let size = font_size as f32;
    let advance = style.advance(font_size);
    let count = lines.len();
    let block_height = advance * count as f32;
    let first_baseline = bbox.y as f32 + size + (advance - size) / 2.0;
    let box_width = bbox.width as f32;

    let slack = bbox.height as f32 - block_height;
    let shift_for = vertical_shift(style.vertical, slack, count);

    let mut max_ink = 0.0f32;
    let placed = lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            max_ink = max_ink.max(line.ink_width);
            let free = box_width - line.ink_width;

            let (x, word_spacing) = match style.horizontal {
                HorizontalAlign::Left => (bbox.x as f32, 0.0),
                HorizontalAlign::Center => (bbox.x as f32 + free / 2.0, 0.0),
                HorizontalAlign::Right => (bbox.x as f32 + free, 0.0),
                HorizontalAlign::Justify => {
                    let gaps = line.words().saturating_sub(1);
                    let spacing = if line.paragraph_end || gaps == 0 || free <= 0.0 {
                        0.0
                    } else {
                        free / gaps as f32
                    };
                    (bbox.x as f32, spacing)
                }
            };
            let gaps = line.words().saturating_sub(1) as f32;

            PlacedLine {
                x,
                baseline: first_baseline + i as f32 * advance + shift_for(i),
                ink_width: line.ink_width,
                drawn_width: line.ink_width + word_spacing * gaps,
                advance,
                word_spacing,
                text: line.text,
            }
        })
        .collect();

    LayoutResult {
        font_size,
        advance,
        lines: placed,
        boundary: Boundary {
            x: bbox.x,
            y: bbox.y,
            width: max_ink as u32,
            height: block_height as u32,
        },
        converged: true,
    }
}

fn vertical_shift(mode: VerticalAlign, slack: f32, count: usize) -> impl Fn(usize) -> f32 {
    let (uniform, per_gap, remainder) = match mode {
        VerticalAlign::Top => (0.0, 0, 0),
        VerticalAlign::Center => (slack / 2.0, 0, 0),
        VerticalAlign::Bottom => (slack, 0, 0),
        VerticalAlign::Justify if count > 1 && slack > 0.0 => {
            let extra = slack.floor() as i64;
            let gaps = (count - 1) as i64;
            (0.0, extra / gaps, extra % gaps)
        }
        VerticalAlign::Justify => (0.0, 0, 0),
    };
    move |i| {
        let mut shift = uniform + (per_gap * i as i64) as f32;
        if count > 1 && i == count - 1 {
            shift += remainder as f32;
        }
        shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, ink: f32, paragraph_end: bool) -> WrappedLine {
        WrappedLine {
            text: text.into(),
            ink_width: ink,
            paragraph_end,
        }
    }

    fn style(h: HorizontalAlign, v: VerticalAlign) -> TextStyle {
        TextStyle {
            line_height: 1.5,
            horizontal: h,
            vertical: v,
            font_file: Some("f.ttf".into()),
            ..TextStyle::default()
        }
    }

    fn bbox() -> BoundingBox {
        BoundingBox::new(10, 20, 200, 300).unwrap()
    }

    /// Places `lines` at size 20 in the default 200x300 box.
    fn placed(lines: Vec<WrappedLine>, h: HorizontalAlign, v: VerticalAlign) -> LayoutResult {
        place(lines, &bbox(), &style(h, v), 20)
    }

    #[test]
    fn first_baseline_centres_the_font_in_its_advance() {
        let lines = vec![line("a", 5.0, true)];
        let out = placed(lines, HorizontalAlign::Left, VerticalAlign::Top);
        // advance 30, offset 20 + 5
        assert_eq!(out.advance, 30.0);
        assert_eq!(out.lines[0].baseline, 45.0);
        assert_eq!(out.lines[0].x, 10.0);
        let expected = Boundary {
            x: 10,
            y: 20,
            width: 5,
            height: 30,
        };
        assert_eq!(out.boundary, expected);
    }

    #[test]
    fn horizontal_modes() {
        let lines = || vec![line("ab", 50.0, true)];
        let center = placed(lines(), HorizontalAlign::Center, VerticalAlign::Top);
        assert_eq!(center.lines[0].x, 85.0);
        let right = placed(lines(), HorizontalAlign::Right, VerticalAlign::Top);
        assert_eq!(right.lines[0].x, 160.0);
    }

    #[test]
    fn justify_stretches_only_inner_paragraph_lines() {
        let lines = vec![
            line("aa bb cc", 140.0, false),
            line("dd", 20.0, false),
            line("ee ff", 60.0, true),
        ];
        let out = placed(lines, HorizontalAlign::Justify, VerticalAlign::Top);
        assert_eq!(out.lines[0].word_spacing, 30.0);
        assert_eq!(out.lines[0].drawn_width, 200.0);
        assert_eq!(out.lines[1].word_spacing, 0.0);
        assert_eq!(out.lines[2].word_spacing, 0.0);
        assert_eq!(out.lines[2].drawn_width, 60.0);
        assert!(out.lines.iter().all(|l| l.x == 10.0));
    }

    #[test]
    fn vertical_center_and_bottom() {
        let lines = || vec![line("a", 1.0, false), line("b", 1.0, true)];
        // block 60 in 300: slack 240
        let center = placed(lines(), HorizontalAlign::Left, VerticalAlign::Center);
        assert_eq!(center.lines[0].baseline, 45.0 + 120.0);
        let bottom = placed(lines(), HorizontalAlign::Left, VerticalAlign::Bottom);
        assert_eq!(bottom.lines[1].baseline, 45.0 + 30.0 + 240.0);
    }

    #[test]
    fn vertical_justify_carries_remainder_to_last_gap() {
        let bb = BoundingBox::new(0, 0, 100, 121).unwrap();
        let st = style(HorizontalAlign::Left, VerticalAlign::Justify);
        let lines = vec![
            line("a", 1.0, false),
            line("b", 1.0, false),
            line("c", 1.0, true),
        ];
        // block 90, slack 31 -> 15 per gap, remainder 1 on the last line
        let out = place(lines, &bb, &st, 20);
        let b: Vec<f32> = out.lines.iter().map(|l| l.baseline).collect();
        assert_eq!(b, vec![25.0, 25.0 + 30.0 + 15.0, 25.0 + 60.0 + 31.0]);
    }

    #[test]
    fn vertical_justify_ignores_single_line_and_overflow() {
        let lines = vec![line("a", 1.0, true)];
        let single = placed(lines, HorizontalAlign::Left, VerticalAlign::Justify);
        assert_eq!(single.lines[0].baseline, 45.0);

        let bb = BoundingBox::new(0, 0, 100, 10).unwrap();
        let st = style(HorizontalAlign::Left, VerticalAlign::Justify);
        let lines = vec![line("a", 1.0, false), line("b", 1.0, true)];
        let out = place(lines, &bb, &st, 20);
        assert_eq!(out.lines[1].baseline, 25.0 + 30.0);
    }
}
