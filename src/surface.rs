//! Premultiplied RGBA8 pixel buffer owned by one [`crate::Image`].

use image::{RgbaImage, imageops};

use crate::{
    composite_cpu::{self, Placement},
    error::{PosterError, PosterResult},
};

/// Largest side the vector rasterizer can address.
pub const MAX_SIDE: u32 = u16::MAX as u32;

/// Integer pixel rectangle; `x`/`y` may be negative for partially visible regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Surface {
    /// Fully transparent buffer.
    pub fn new(width: u32, height: u32) -> PosterResult<Self> {
        check_dims(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * 4],
        })
    }

    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> PosterResult<Self> {
        check_dims(width, height)?;
        if data.len() != width as usize * height as usize * 4 {
            return Err(PosterError::validation(
                "premultiplied buffer length must be width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_straight(image: RgbaImage) -> PosterResult<Self> {
        let (width, height) = image.dimensions();
        let mut data = image.into_raw();
        premultiply_rgba8_in_place(&mut data);
        Self::from_premul(width, height, data)
    }

    pub fn to_straight(&self) -> RgbaImage {
        let mut data = self.data.clone();
        unpremultiply_rgba8_in_place(&mut data);
        // length is width*height*4 by construction
        RgbaImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Premultiplied pixel at `(x, y)`, `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    pub fn fill(&mut self, premul: [u8; 4]) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&premul);
        }
    }

    /// Composite `src` over this buffer with its top-left corner at `(x, y)`.
    pub fn draw_over(&mut self, src: &Surface, x: i64, y: i64) -> PosterResult<()> {
        composite_cpu::over_at(
            &mut self.data,
            &src.data,
            src.width,
            src.height,
            Placement {
                dst_width: self.width,
                dst_height: self.height,
                x,
                y,
            },
            1.0,
        )
    }

    /// Scale the `src_rect` region of `src` to `dst_rect` and blend it over this buffer.
    ///
    /// Source regions reaching outside `src` are clamped to its bounds.
    pub fn resample_from(
        &mut self,
        src: &Surface,
        dst_rect: PixelRect,
        src_rect: PixelRect,
    ) -> PosterResult<()> {
        if dst_rect.is_empty() || src_rect.is_empty() {
            return Ok(());
        }

        let sx = src_rect.x.clamp(0, i64::from(src.width)) as u32;
        let sy = src_rect.y.clamp(0, i64::from(src.height)) as u32;
        let sw = src_rect.width.min(src.width - sx);
        let sh = src_rect.height.min(src.height - sy);
        if sw == 0 || sh == 0 {
            return Ok(());
        }

        // Premultiplied channels interpolate correctly without unpremultiplying.
        let whole = RgbaImage::from_raw(src.width, src.height, src.data.clone())
            .ok_or_else(|| PosterError::validation("source buffer length mismatch"))?;
        let region = imageops::crop_imm(&whole, sx, sy, sw, sh).to_image();
        let scaled = if (sw, sh) == (dst_rect.width, dst_rect.height) {
            region
        } else {
            imageops::resize(
                &region,
                dst_rect.width,
                dst_rect.height,
                imageops::FilterType::Triangle,
            )
        };

        let layer = Surface::from_premul(dst_rect.width, dst_rect.height, scaled.into_raw())?;
        self.draw_over(&layer, dst_rect.x, dst_rect.y)
    }

    /// Whole buffer scaled to `width`x`height` on a fresh transparent buffer.
    pub fn scaled(&self, width: u32, height: u32) -> PosterResult<Surface> {
        let mut out = Surface::new(width, height)?;
        out.resample_from(
            self,
            PixelRect::new(0, 0, width, height),
            PixelRect::new(0, 0, self.width, self.height),
        )?;
        Ok(out)
    }
}

fn check_dims(width: u32, height: u32) -> PosterResult<()> {
    if width == 0 || height == 0 {
        return Err(PosterError::invalid_geometry(format!(
            "canvas must be at least 1x1, got {width}x{height}"
        )));
    }
    if width > MAX_SIDE || height > MAX_SIDE {
        return Err(PosterError::invalid_geometry(format!(
            "canvas side exceeds {MAX_SIDE}px: {width}x{height}"
        )));
    }
    Ok(())
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[..3].fill(0);
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}
