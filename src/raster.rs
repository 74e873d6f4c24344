//! Vector drawing onto a [`Surface`] through `vello_cpu`.
//!
//! Every call rasterizes into a scratch pixmap covering just the drawing's
//! bounds and blends it over the existing pixels, so the draw color's alpha
//! applies once per call even where a path overlaps itself.

use kurbo::{Affine, Point, Rect, Shape};

use crate::{
    color::Rgba8,
    composite_cpu::{self, Placement},
    error::{PosterError, PosterResult},
    surface::{PixelRect, Surface},
    text::{LoadedFont, TextRun},
};

const TOLERANCE: f64 = 0.1;
/// Antialiasing bleed around a drawing's bounds, in pixels.
const MARGIN: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Paint {
    Fill,
    /// Centered stroke of the given width in pixels.
    Stroke(f64),
}

pub fn draw_shape(
    surface: &mut Surface,
    shape: &impl Shape,
    paint: Paint,
    color: Rgba8,
) -> PosterResult<()> {
    let path = shape.to_path(TOLERANCE);
    let bounds = match paint {
        Paint::Fill => path.bounding_box(),
        Paint::Stroke(width) => path.bounding_box().inflate(width / 2.0, width / 2.0),
    };
    render_layer(surface, color, bounds, |ctx, offset| {
        ctx.set_transform(offset);
        match paint {
            Paint::Fill => ctx.fill_path(&path),
            Paint::Stroke(width) => {
                ctx.set_stroke(kurbo::Stroke::new(width));
                ctx.stroke_path(&path);
            }
        }
    })
}

/// Draws one line of text with its baseline origin at `(run.x, run.baseline)`.
pub fn draw_glyphs(
    surface: &mut Surface,
    font: &LoadedFont,
    run: &TextRun<'_>,
) -> PosterResult<()> {
    let size = run.font_size as f32;
    let placed = font.positioned_glyphs(run.text, size, run.word_spacing);
    if placed.is_empty() {
        return Ok(());
    }

    let origin = Point::new(f64::from(run.x), f64::from(run.baseline));
    let rotation = if run.angle == 0.0 {
        Affine::IDENTITY
    } else {
        // counter-clockwise on screen
        Affine::rotate_about(-f64::from(run.angle).to_radians(), origin)
    };
    let bounds = rotation.transform_rect_bbox(font.run_bounds(&placed, size) + origin.to_vec2());

    let glyphs: Vec<vello_cpu::Glyph> = placed
        .into_iter()
        .map(|g| vello_cpu::Glyph {
            id: u32::from(g.id),
            x: run.x + g.x,
            y: run.baseline,
        })
        .collect();

    render_layer(surface, run.color, bounds, |ctx, offset| {
        ctx.set_transform(offset * rotation);
        ctx.glyph_run(font.font_data())
            .font_size(size)
            .fill_glyphs(glyphs.into_iter());
    })
}

/// Renders `draw` into a pixmap over `bounds` and blends it onto `surface`.
///
/// `draw` receives the canvas-to-scratch transform and must apply it.
fn render_layer(
    surface: &mut Surface,
    color: Rgba8,
    bounds: Rect,
    draw: impl FnOnce(&mut vello_cpu::RenderContext, Affine),
) -> PosterResult<()> {
    if color.a == 0 {
        return Ok(());
    }
    let Some(area) = scratch_area(bounds, surface.width(), surface.height()) else {
        return Ok(());
    };
    let width = side(area.width)?;
    let height = side(area.height)?;

    let mut ctx = vello_cpu::RenderContext::new(width, height);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        color.r, color.g, color.b, 255,
    ));
    let offset = Affine::translate((-area.x as f64, -area.y as f64));
    draw(&mut ctx, offset);
    ctx.flush();

    let mut pixmap = vello_cpu::Pixmap::new(width, height);
    ctx.render_to_pixmap(&mut pixmap);
    let at = Placement {
        dst_width: surface.width(),
        dst_height: surface.height(),
        x: area.x,
        y: area.y,
    };
    composite_cpu::over_at(
        surface.data_mut(),
        pixmap.data_as_u8_slice(),
        area.width,
        area.height,
        at,
        f32::from(color.a) / 255.0,
    )
}

/// Whole pixels covering `bounds` plus [`MARGIN`], clipped to a `width` x `height` surface.
fn scratch_area(bounds: Rect, width: u32, height: u32) -> Option<PixelRect> {
    if !bounds.is_finite() {
        return None;
    }
    let x0 = (bounds.x0 - MARGIN).floor().max(0.0);
    let y0 = (bounds.y0 - MARGIN).floor().max(0.0);
    let x1 = (bounds.x1 + MARGIN).ceil().min(f64::from(width));
    let y1 = (bounds.y1 + MARGIN).ceil().min(f64::from(height));
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some(PixelRect::new(
        x0 as i64,
        y0 as i64,
        (x1 - x0) as u32,
        (y1 - y0) as u32,
    ))
}

fn side(v: u32) -> PosterResult<u16> {
    u16::try_from(v)
        .map_err(|_| PosterError::invalid_geometry(format!("surface side {v} exceeds u16")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_rect_with_opaque_color() {
        let mut s = Surface::new(8, 8).unwrap();
        let rect = Rect::new(2.0, 2.0, 6.0, 6.0);
        draw_shape(&mut s, &rect, Paint::Fill, Rgba8::new(255, 0, 0, 255)).unwrap();
        assert_eq!(s.pixel(3, 3), Some([255, 0, 0, 255]));
        assert_eq!(s.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(s.pixel(6, 6), Some([0, 0, 0, 0]));
    }

    #[test]
    fn translucent_fill_blends_over_existing_pixels() {
        let mut s = Surface::new(4, 4).unwrap();
        s.fill([255, 255, 255, 255]);
        let rect = Rect::new(0.0, 0.0, 4.0, 4.0);
        draw_shape(&mut s, &rect, Paint::Fill, Rgba8::new(0, 0, 0, 128)).unwrap();
        let px = s.pixel(1, 1).unwrap();
        assert_eq!(px[3], 255);
        assert!((i32::from(px[0]) - 127).abs() <= 1, "got {px:?}");
    }

    #[test]
    fn stroke_leaves_interior_untouched() {
        let mut s = Surface::new(16, 16).unwrap();
        let ellipse = kurbo::Ellipse::new((8.0, 8.0), (6.0, 6.0), 0.0);
        let blue = Rgba8::new(0, 0, 255, 255);
        draw_shape(&mut s, &ellipse, Paint::Stroke(2.0), blue).unwrap();
        assert_eq!(s.pixel(8, 8), Some([0, 0, 0, 0]));
        assert!(s.pixel(8, 2).unwrap()[3] > 0);
    }

    #[test]
    fn invisible_color_is_a_no_op() {
        let mut s = Surface::new(4, 4).unwrap();
        let rect = Rect::new(0.0, 0.0, 4.0, 4.0);
        draw_shape(&mut s, &rect, Paint::Fill, Rgba8::new(9, 9, 9, 0)).unwrap();
        assert!(s.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn offset_shape_lands_where_requested() {
        let mut s = Surface::new(64, 48).unwrap();
        let rect = Rect::new(40.0, 30.0, 44.0, 36.0);
        draw_shape(&mut s, &rect, Paint::Fill, Rgba8::new(0, 255, 0, 255)).unwrap();
        assert_eq!(s.pixel(40, 30), Some([0, 255, 0, 255]));
        assert_eq!(s.pixel(43, 35), Some([0, 255, 0, 255]));
        assert_eq!(s.pixel(39, 30), Some([0, 0, 0, 0]));
        assert_eq!(s.pixel(44, 36), Some([0, 0, 0, 0]));
        let painted = s.data().chunks_exact(4).filter(|px| px[3] > 0).count();
        assert_eq!(painted, 24);
    }

    #[test]
    fn shapes_past_the_edge_are_clipped() {
        let mut s = Surface::new(8, 8).unwrap();
        let rect = Rect::new(-5.0, -5.0, 3.0, 3.0);
        draw_shape(&mut s, &rect, Paint::Fill, Rgba8::new(255, 0, 0, 255)).unwrap();
        assert_eq!(s.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(s.pixel(2, 2), Some([255, 0, 0, 255]));
        assert_eq!(s.pixel(3, 3), Some([0, 0, 0, 0]));

        let mut s = Surface::new(8, 8).unwrap();
        let far = Rect::new(20.0, 20.0, 30.0, 30.0);
        draw_shape(&mut s, &far, Paint::Fill, Rgba8::new(255, 0, 0, 255)).unwrap();
        assert!(s.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn scratch_area_covers_bounds_with_margin() {
        let area = scratch_area(Rect::new(10.2, 5.0, 20.0, 7.5), 100, 100);
        assert_eq!(area, Some(PixelRect::new(9, 4, 12, 5)));

        let clipped = scratch_area(Rect::new(-3.0, 90.0, 4.0, 120.0), 100, 100);
        assert_eq!(clipped, Some(PixelRect::new(0, 89, 5, 11)));

        let nan = Rect::new(0.0, 0.0, f64::NAN, 1.0);
        assert_eq!(scratch_area(nan, 10, 10), None);
        let outside = Rect::new(50.0, 0.0, 60.0, 5.0);
        assert_eq!(scratch_area(outside, 10, 10), None);
    }
}
