use crate::error::{PosterError, PosterResult};

pub type PremulRgba8 = [u8; 4];

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

/// Destination buffer and placement for [`over_at`].
#[derive(Clone, Copy, Debug)]
pub struct Placement {
    pub dst_width: u32,
    pub dst_height: u32,
    pub x: i64,
    pub y: i64,
}

/// Composite a `src_width`x`src_height` premultiplied buffer over `dst` with its
/// top-left corner at `(at.x, at.y)`. Pixels falling outside `dst` are clipped.
pub fn over_at(
    dst: &mut [u8],
    src: &[u8],
    src_width: u32,
    src_height: u32,
    at: Placement,
    opacity: f32,
) -> PosterResult<()> {
    let dst_len = (at.dst_width as usize) * (at.dst_height as usize) * 4;
    let src_len = (src_width as usize) * (src_height as usize) * 4;
    if dst.len() != dst_len || src.len() != src_len {
        return Err(PosterError::validation(
            "over_at expects buffers matching their width*height*4",
        ));
    }

    let (dw, dh) = (i64::from(at.dst_width), i64::from(at.dst_height));
    let x0 = at.x.max(0);
    let y0 = at.y.max(0);
    let x1 = (at.x + i64::from(src_width)).min(dw);
    let y1 = (at.y + i64::from(src_height)).min(dh);
    if x0 >= x1 || y0 >= y1 {
        return Ok(());
    }

    for y in y0..y1 {
        let sy = (y - at.y) as usize;
        for x in x0..x1 {
            let sx = (x - at.x) as usize;
            let si = (sy * src_width as usize + sx) * 4;
            let di = ((y * dw + x) as usize) * 4;
            let out = over(
                [dst[di], dst[di + 1], dst[di + 2], dst[di + 3]],
                [src[si], src[si + 1], src[si + 2], src[si + 3]],
                opacity,
            );
            dst[di..di + 4].copy_from_slice(&out);
        }
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}
