use crate::{
    error::{PosterError, PosterResult},
    surface::Surface,
};

/// Sigma of the classic 3x3 `[1 2 1]` smoothing kernel: `exp(-1 / (2 sigma^2)) == 1/2`.
pub const SMOOTH_3X3_SIGMA: f32 = 0.849_321_8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Filter {
    /// Adds `offset` to every color channel (`-255..=255`).
    Brightness { offset: i32 },
    /// Scales channel distance from mid-gray; `level` in `-100..=100`, positive is stronger.
    Contrast { level: i32 },
    Grayscale,
    Negate,
    GaussianBlur { radius_px: u32, sigma: f32 },
}

impl Filter {
    pub fn smooth() -> Self {
        Filter::GaussianBlur {
            radius_px: 1,
            sigma: SMOOTH_3X3_SIGMA,
        }
    }
}

pub fn apply(surface: &mut Surface, filter: Filter) -> PosterResult<()> {
    match filter {
        Filter::Brightness { offset } => {
            let offset = offset.clamp(-255, 255);
            map_straight(surface, |rgb| rgb.map(|c| clamp_u8(i32::from(c) + offset)));
            Ok(())
        }
        Filter::Contrast { level } => {
            let factor = (100.0 + level.clamp(-100, 100) as f32) / 100.0;
            let factor = factor * factor;
            map_straight(surface, |rgb| {
                rgb.map(|c| {
                    let v = ((f32::from(c) / 255.0 - 0.5) * factor + 0.5) * 255.0;
                    clamp_u8(v.round() as i32)
                })
            });
            Ok(())
        }
        Filter::Grayscale => {
            map_straight(surface, |[r, g, b]| {
                let l = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
                let l = clamp_u8(l.round() as i32);
                [l, l, l]
            });
            Ok(())
        }
        Filter::Negate => {
            map_straight(surface, |rgb| rgb.map(|c| 255 - c));
            Ok(())
        }
        Filter::GaussianBlur { radius_px, sigma } => {
            let blurred = gaussian_blur(
                surface.data(),
                surface.width(),
                surface.height(),
                radius_px,
                sigma,
            )?;
            surface.data_mut().copy_from_slice(&blurred);
            Ok(())
        }
    }
}

/// Run `f` on the straight color of every pixel; alpha is left untouched.
fn map_straight(surface: &mut Surface, f: impl Fn([u8; 3]) -> [u8; 3]) {
    for px in surface.data_mut().chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 {
            continue;
        }
        let unpremul = |c: u8| ((u32::from(c) * 255 + a / 2) / a).min(255) as u8;
        let out = f([unpremul(px[0]), unpremul(px[1]), unpremul(px[2])]);
        for (dst, c) in px[..3].iter_mut().zip(out) {
            *dst = ((u32::from(c) * a + 127) / 255) as u8;
        }
    }
}

fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Separable gaussian blur over premultiplied RGBA8 with clamp-to-edge sampling.
pub fn gaussian_blur(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> PosterResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| PosterError::validation("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(PosterError::validation(
            "gaussian_blur expects src matching width*height*4",
        ));
    }
    if radius == 0 {
        return Ok(src.to_vec());
    }

    let kernel = kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];
    convolve(src, &mut tmp, width, height, &kernel, Axis::Horizontal);
    convolve(&tmp, &mut out, width, height, &kernel, Axis::Vertical);
    Ok(out)
}

fn kernel_q16(radius: u32, sigma: f32) -> PosterResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(PosterError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(PosterError::validation("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();

    // Push the rounding error into the center tap so the kernel sums to exactly 1.0.
    let total: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let mid = weights.len() / 2;
    weights[mid] = (i64::from(weights[mid]) + 65536 - total).clamp(0, 65536) as u32;
    Ok(weights)
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

fn convolve(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], axis: Axis) {
    let radius = (k.len() / 2) as i64;
    let (w, h) = (i64::from(width), i64::from(height));
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let d = ki as i64 - radius;
                let (sx, sy) = match axis {
                    Axis::Horizontal => ((x + d).clamp(0, w - 1), y),
                    Axis::Vertical => (x, (y + d).clamp(0, h - 1)),
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for (c, a) in acc.iter_mut().enumerate() {
                    *a += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for (c, a) in acc.iter().enumerate() {
                dst[out_idx + c] = (((a + 32768) >> 16).min(255)) as u8;
            }
        }
    }
}
