//! The user-facing poster editor.

use std::path::Path;

use anyhow::Context;

use crate::{
    codec::{self, ImageKind},
    color::{Rgb8, Rgba8},
    error::{PosterError, PosterResult},
    filters::{self, Filter},
    geometry::{self, FitPosition, ResizeMode},
    raster::{self, Paint},
    surface::{PixelRect, Surface},
    text::{
        Boundary, FontCache, LayoutResult, TextOptions, TextRenderer, TextRun, TextStyle,
        TextSurface,
    },
};

/// Color, opacity and stroke settings for `line`, `rectangle` and `ellipse`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ShapeOptions {
    pub color: Rgb8,
    /// 0 is fully opaque, 100 invisible.
    pub opacity: u8,
    /// Stroke width for lines and outlines.
    #[serde(alias = "width")]
    pub thickness: u32,
    /// Stroke the shape instead of filling it.
    pub outline: bool,
}

impl Default for ShapeOptions {
    fn default() -> Self {
        Self {
            color: Rgb8::BLACK,
            opacity: 0,
            thickness: 1,
            outline: false,
        }
    }
}

impl ShapeOptions {
    fn paint(&self) -> Paint {
        if self.outline {
            Paint::Stroke(f64::from(self.thickness.max(1)))
        } else {
            Paint::Fill
        }
    }

    fn rgba(&self) -> Rgba8 {
        self.color.with_opacity(self.opacity)
    }
}

/// Placement of a pasted file; missing values are derived from the file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct InsertOptions {
    /// Centered horizontally when unset.
    pub x: Option<i64>,
    /// Centered vertically when unset.
    pub y: Option<i64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// An editable raster image.
///
/// Cloning copies the pixel buffer, so clones can be edited independently.
#[derive(Clone, Debug)]
pub struct Image {
    surface: Surface,
    kind: ImageKind,
    fonts: FontCache,
    text_defaults: TextStyle,
}

impl Image {
    fn from_surface(surface: Surface, kind: ImageKind) -> Self {
        Self {
            surface,
            kind,
            fonts: FontCache::new(),
            text_defaults: TextStyle::default(),
        }
    }

    /// Transparent canvas; square when `height` is `None`.
    pub fn canvas(width: u32, height: Option<u32>) -> PosterResult<Self> {
        let surface = Surface::new(width, height.unwrap_or(width))?;
        Ok(Self::from_surface(surface, ImageKind::Png))
    }

    #[tracing::instrument]
    pub fn make(path: &Path) -> PosterResult<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> PosterResult<Self> {
        let (surface, kind) = codec::decode_image(bytes)?;
        Ok(Self::from_surface(surface, kind))
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: ImageKind) -> &mut Self {
        self.kind = kind;
        self
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn text_defaults(&self) -> &TextStyle {
        &self.text_defaults
    }

    pub fn set_text_defaults(&mut self, style: TextStyle) -> &mut Self {
        self.text_defaults = style;
        self
    }

    pub fn resize(
        &mut self,
        width: Option<u32>,
        height: Option<u32>,
        mode: ResizeMode,
    ) -> PosterResult<&mut Self> {
        let source = (self.width(), self.height());
        let (w, h) = geometry::complete_size(source, width, height)?;
        let ratio = f64::from(source.0) / f64::from(source.1);
        let (w, h) = geometry::calc_resizes(w, h, ratio, mode);
        self.surface = self.surface.scaled(w, h)?;
        Ok(self)
    }

    /// Cuts a `width` x `height` window at `(x, y)`, centered when unset.
    pub fn crop(
        &mut self,
        width: u32,
        height: u32,
        x: Option<i64>,
        y: Option<i64>,
    ) -> PosterResult<&mut Self> {
        let x = x.unwrap_or_else(|| {
            geometry::find_center(i64::from(self.width()), i64::from(width))
        });
        let y = y.unwrap_or_else(|| {
            geometry::find_center(i64::from(self.height()), i64::from(height))
        });
        let mut out = Surface::new(width, height)?;
        out.draw_over(&self.surface, -x, -y)?;
        self.surface = out;
        Ok(self)
    }

    /// Covers `width` x `height` keeping the aspect ratio, then crops at `position`.
    pub fn fit(
        &mut self,
        width: u32,
        height: u32,
        position: FitPosition,
    ) -> PosterResult<&mut Self> {
        self.resize(Some(width), Some(height), ResizeMode::Cover)?;
        let (x, y) = position.origin((self.width(), self.height()), width, height);
        self.crop(width, height, Some(x), Some(y))
    }

    pub fn line(
        &mut self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        options: &ShapeOptions,
    ) -> PosterResult<&mut Self> {
        // through pixel centers so 1px lines stay crisp
        let line = kurbo::Line::new(
            (f64::from(x1) + 0.5, f64::from(y1) + 0.5),
            (f64::from(x2) + 0.5, f64::from(y2) + 0.5),
        );
        let paint = Paint::Stroke(f64::from(options.thickness.max(1)));
        raster::draw_shape(&mut self.surface, &line, paint, options.rgba())?;
        Ok(self)
    }

    /// Outlines are stroked inside the `width` x `height` area.
    pub fn rectangle(
        &mut self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        options: &ShapeOptions,
    ) -> PosterResult<&mut Self> {
        let (x0, y0) = (f64::from(x), f64::from(y));
        let (x1, y1) = (x0 + f64::from(width), y0 + f64::from(height));
        let rect = match options.paint() {
            Paint::Fill => kurbo::Rect::new(x0, y0, x1, y1),
            Paint::Stroke(t) => {
                let half = t / 2.0;
                kurbo::Rect::new(x0 + half, y0 + half, x1 - half, y1 - half)
            }
        };
        raster::draw_shape(&mut self.surface, &rect, options.paint(), options.rgba())?;
        Ok(self)
    }

    /// Ellipse centered on `(cx, cy)` with the given full width and height.
    pub fn ellipse(
        &mut self,
        cx: i32,
        cy: i32,
        width: u32,
        height: u32,
        options: &ShapeOptions,
    ) -> PosterResult<&mut Self> {
        let ellipse = kurbo::Ellipse::new(
            (f64::from(cx), f64::from(cy)),
            (f64::from(width) / 2.0, f64::from(height) / 2.0),
            0.0,
        );
        raster::draw_shape(&mut self.surface, &ellipse, options.paint(), options.rgba())?;
        Ok(self)
    }

    /// `level` in `-100..=100`; each step shifts channels by 2.55.
    pub fn brightness(&mut self, level: i32) -> PosterResult<&mut Self> {
        let offset = (level.clamp(-100, 100) as f32 * 2.55) as i32;
        filters::apply(&mut self.surface, Filter::Brightness { offset })?;
        Ok(self)
    }

    /// `level` in `-100..=100`; positive values increase contrast.
    ///
    /// The sign is the reverse of GD's `IMG_FILTER_CONTRAST`, where positive
    /// levels flatten the image. Negate levels tuned for GD.
    pub fn contrast(&mut self, level: i32) -> PosterResult<&mut Self> {
        filters::apply(&mut self.surface, Filter::Contrast { level })?;
        Ok(self)
    }

    pub fn grayscale(&mut self) -> PosterResult<&mut Self> {
        filters::apply(&mut self.surface, Filter::Grayscale)?;
        Ok(self)
    }

    /// One pass of the 3x3 smoothing kernel.
    pub fn gaussian_blur(&mut self) -> PosterResult<&mut Self> {
        filters::apply(&mut self.surface, Filter::smooth())?;
        Ok(self)
    }

    /// Strong blur: smooth at a quarter, then half, then full size.
    pub fn blur(&mut self) -> PosterResult<&mut Self> {
        let (w, h) = (self.width(), self.height());
        let mut layer = self.surface.scaled((w / 4).max(1), (h / 4).max(1))?;
        for (sw, sh) in [((w / 2).max(1), (h / 2).max(1)), (w, h)] {
            filters::apply(&mut layer, Filter::smooth())?;
            layer = layer.scaled(sw, sh)?;
        }
        filters::apply(&mut layer, Filter::smooth())?;
        self.surface = layer;
        Ok(self)
    }

    pub fn invert(&mut self) -> PosterResult<&mut Self> {
        filters::apply(&mut self.surface, Filter::Negate)?;
        Ok(self)
    }

    /// Darkens the whole image with a black layer covering `level` percent.
    pub fn blackout(&mut self, level: u8) -> PosterResult<&mut Self> {
        let options = ShapeOptions {
            color: Rgb8::BLACK,
            opacity: 100 - level.min(100),
            ..ShapeOptions::default()
        };
        let (w, h) = (self.width(), self.height());
        self.rectangle(0, 0, w, h, &options)
    }

    /// Pastes another image at `(x, y)`, centered when unset.
    pub fn append(
        &mut self,
        other: &Image,
        x: Option<i64>,
        y: Option<i64>,
    ) -> PosterResult<&mut Self> {
        let x = x.unwrap_or_else(|| {
            geometry::find_center(i64::from(self.width()), i64::from(other.width()))
        });
        let y = y.unwrap_or_else(|| {
            geometry::find_center(i64::from(self.height()), i64::from(other.height()))
        });
        self.surface.draw_over(&other.surface, x, y)?;
        Ok(self)
    }

    /// Decodes `path` and pastes it scaled into the requested area.
    #[tracing::instrument(skip(self))]
    pub fn insert(&mut self, path: &Path, options: InsertOptions) -> PosterResult<&mut Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
        let (src, _) = codec::decode_image(&bytes)?;
        let (w, h) =
            geometry::complete_size((src.width(), src.height()), options.width, options.height)?;
        let x = options
            .x
            .unwrap_or_else(|| geometry::find_center(i64::from(self.width()), i64::from(w)));
        let y = options
            .y
            .unwrap_or_else(|| geometry::find_center(i64::from(self.height()), i64::from(h)));

        self.surface.resample_from(
            &src,
            PixelRect::new(x, y, w, h),
            PixelRect::new(0, 0, src.width(), src.height()),
        )?;
        Ok(self)
    }

    /// Draws a fitted text block and returns the area it occupies.
    #[tracing::instrument(skip(self, content, options), fields(chars = content.len()))]
    pub fn text(&mut self, content: &str, options: &TextOptions) -> PosterResult<Boundary> {
        let (bbox, style) = options.resolve(&self.text_defaults, self.width(), self.height())?;
        let mut target = CanvasText {
            surface: &mut self.surface,
            fonts: &self.fonts,
        };
        TextRenderer::new(&self.fonts).draw(&mut target, content, &bbox, &style)
    }

    /// Fits and places a text block without drawing it.
    pub fn layout_text(&self, content: &str, options: &TextOptions) -> PosterResult<LayoutResult> {
        let (bbox, style) = options.resolve(&self.text_defaults, self.width(), self.height())?;
        TextRenderer::new(&self.fonts).layout(content, &bbox, &style)
    }

    /// Encodes to `kind`, or the remembered format when `None`.
    pub fn encode(&self, kind: Option<ImageKind>, quality: u8) -> PosterResult<Vec<u8>> {
        codec::encode_image(&self.surface, kind.unwrap_or(self.kind), quality)
    }

    /// Writes the image; the format comes from `format`, then the extension,
    /// then the remembered format. The parent directory must already exist.
    #[tracing::instrument(skip(self))]
    pub fn save(&self, path: &Path, quality: u8, format: Option<ImageKind>) -> PosterResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.is_dir()
        {
            return Err(PosterError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("directory '{}' does not exist", parent.display()),
            )));
        }
        let kind = format
            .or_else(|| ImageKind::from_path(path))
            .unwrap_or(self.kind);
        let bytes = self.encode(Some(kind), quality)?;
        std::fs::write(path, bytes)?;
        tracing::debug!(path = %path.display(), ?kind, "image saved");
        Ok(())
    }
}

/// Text drawing target backed by an image buffer and its font cache.
struct CanvasText<'a> {
    surface: &'a mut Surface,
    fonts: &'a FontCache,
}

impl TextSurface for CanvasText<'_> {
    fn fill_rect(&mut self, rect: PixelRect, color: Rgba8) -> PosterResult<()> {
        let (x, y) = (rect.x as f64, rect.y as f64);
        let shape = kurbo::Rect::new(x, y, x + f64::from(rect.width), y + f64::from(rect.height));
        raster::draw_shape(self.surface, &shape, Paint::Fill, color)
    }

    fn draw_text(&mut self, run: &TextRun<'_>) -> PosterResult<()> {
        let font = self.fonts.get(run.font_file)?;
        raster::draw_glyphs(self.surface, &font, run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, px: [u8; 4]) -> Image {
        let mut img = Image::canvas(w, Some(h)).unwrap();
        img.surface.fill(px);
        img
    }

    #[test]
    fn canvas_defaults_to_square_and_transparent() {
        let img = Image::canvas(12, None).unwrap();
        assert_eq!((img.width(), img.height()), (12, 12));
        assert!(img.surface().data().iter().all(|&b| b == 0));
        assert!(matches!(
            Image::canvas(0, Some(3)),
            Err(PosterError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn resize_modes() {
        let mut img = solid(200, 100, [255, 0, 0, 255]);
        img.resize(Some(50), Some(50), ResizeMode::Contain).unwrap();
        assert_eq!((img.width(), img.height()), (50, 25));

        let mut img = solid(200, 100, [255, 0, 0, 255]);
        img.resize(Some(50), Some(50), ResizeMode::Cover).unwrap();
        assert_eq!((img.width(), img.height()), (100, 50));

        let mut img = solid(200, 100, [255, 0, 0, 255]);
        img.resize(Some(50), Some(50), ResizeMode::Exact).unwrap();
        assert_eq!((img.width(), img.height()), (50, 50));

        let mut img = solid(200, 100, [255, 0, 0, 255]);
        img.resize(None, Some(10), ResizeMode::Contain).unwrap();
        assert_eq!((img.width(), img.height()), (20, 10));
    }

    #[test]
    fn crop_defaults_to_center() {
        let mut img = solid(10, 10, [0, 0, 0, 255]);
        let white = ShapeOptions {
            color: Rgb8::WHITE,
            ..ShapeOptions::default()
        };
        img.rectangle(4, 4, 2, 2, &white).unwrap();
        img.crop(2, 2, None, None).unwrap();
        assert_eq!((img.width(), img.height()), (2, 2));
        let pixels = img.surface().data();
        assert!(pixels.chunks_exact(4).all(|px| px == [255, 255, 255, 255]));
    }

    #[test]
    fn crop_past_the_edge_leaves_transparency() {
        let mut img = solid(4, 4, [0, 0, 255, 255]);
        img.crop(4, 4, Some(2), Some(0)).unwrap();
        assert_eq!(img.surface().pixel(0, 0), Some([0, 0, 255, 255]));
        assert_eq!(img.surface().pixel(3, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn fit_produces_exact_size() {
        let mut img = solid(300, 100, [10, 20, 30, 255]);
        img.fit(50, 50, FitPosition::Left).unwrap();
        assert_eq!((img.width(), img.height()), (50, 50));
        assert_eq!(img.surface().pixel(25, 25), Some([10, 20, 30, 255]));
    }

    #[test]
    fn blackout_full_level_is_black() {
        let mut img = solid(4, 4, [255, 255, 255, 255]);
        img.blackout(100).unwrap();
        assert_eq!(img.surface().pixel(2, 2), Some([0, 0, 0, 255]));

        let mut img = solid(4, 4, [255, 255, 255, 255]);
        img.blackout(0).unwrap();
        assert_eq!(img.surface().pixel(2, 2), Some([255, 255, 255, 255]));
    }

    #[test]
    fn positive_contrast_pushes_away_from_gray() {
        let mut img = solid(2, 2, [100, 100, 100, 255]);
        img.contrast(50).unwrap();
        let stronger = img.surface().pixel(0, 0).unwrap();
        assert!(stronger[0] < 90, "got {stronger:?}");

        let mut img = solid(2, 2, [100, 100, 100, 255]);
        img.contrast(-50).unwrap();
        let flatter = img.surface().pixel(0, 0).unwrap();
        assert!(flatter[0] > 110, "got {flatter:?}");
    }

    #[test]
    fn clones_diverge() {
        let original = solid(4, 4, [255, 255, 255, 255]);
        let mut copy = original.clone();
        copy.invert().unwrap();
        assert_eq!(original.surface().pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(copy.surface().pixel(0, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn append_centers_by_default() {
        let mut base = solid(6, 6, [0, 0, 0, 255]);
        let patch = solid(2, 2, [255, 0, 0, 255]);
        base.append(&patch, None, None).unwrap();
        assert_eq!(base.surface().pixel(2, 2), Some([255, 0, 0, 255]));
        assert_eq!(base.surface().pixel(1, 1), Some([0, 0, 0, 255]));
    }

    #[test]
    fn blur_keeps_size_and_flat_color() {
        let mut img = solid(17, 9, [40, 80, 120, 255]);
        img.blur().unwrap();
        assert_eq!((img.width(), img.height()), (17, 9));
        let px = img.surface().pixel(8, 4).unwrap();
        assert!((i32::from(px[0]) - 40).abs() <= 1, "got {px:?}");
    }

    #[test]
    fn text_without_font_is_invalid_font() {
        let mut img = Image::canvas(100, Some(50)).unwrap();
        let err = img.text("hello", &TextOptions::default()).unwrap_err();
        assert!(matches!(err, PosterError::InvalidFont(_)));
    }

    #[test]
    fn image_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Image>();
    }
}
