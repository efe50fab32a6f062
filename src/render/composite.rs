use crate::foundation::{
    core::RasterImage,
    error::{WatermarkError, WatermarkResult},
};

/// Premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Source-over for one premultiplied pixel.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let sa = src[3];
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(sa);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255(u16::from(dst[i]), inv));
    }
    out
}

/// Source-over of two equally sized premultiplied buffers.
pub fn over_in_place(dst: &mut [u8], src: &[u8]) -> WatermarkResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(WatermarkError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Draw `overlay` onto `canvas` with its top-left corner at `(x, y)`.
///
/// Only the part that lands on the canvas is drawn; origins may be negative or past the far edge.
pub fn blit_over(canvas: &mut RasterImage, overlay: &RasterImage, x: i64, y: i64) {
    let cw = i64::from(canvas.width());
    let ch = i64::from(canvas.height());
    let ow = i64::from(overlay.width());
    let oh = i64::from(overlay.height());

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = x.saturating_add(ow).min(cw);
    let y1 = y.saturating_add(oh).min(ch);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let span = ((x1 - x0) * 4) as usize;
    let src = overlay.as_premul_rgba8();
    let dst = canvas.data_mut();
    for row in y0..y1 {
        let d = ((row * cw + x0) * 4) as usize;
        let s = (((row - y) * ow + (x0 - x)) * 4) as usize;
        for (dp, sp) in dst[d..d + span]
            .chunks_exact_mut(4)
            .zip(src[s..s + span].chunks_exact(4))
        {
            let out = over([dp[0], dp[1], dp[2], dp[3]], [sp[0], sp[1], sp[2], sp[3]]);
            dp.copy_from_slice(&out);
        }
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Rgba8;

    #[test]
    fn over_src_alpha_0_is_noop() {
        let dst = [10, 20, 30, 40];
        let src = [0, 0, 0, 0];
        assert_eq!(over(dst, src), dst);
    }

    #[test]
    fn over_src_opaque_replaces_dst() {
        let dst = [0, 0, 0, 255];
        let src = [255, 0, 0, 255];
        assert_eq!(over(dst, src), src);
    }

    #[test]
    fn over_dst_transparent_returns_src() {
        let dst = [0, 0, 0, 0];
        let src = [100, 110, 120, 200];
        assert_eq!(over(dst, src), src);
    }

    #[test]
    fn over_half_alpha_mixes() {
        let dst = [0, 0, 255, 255];
        let src = [128, 0, 0, 128];
        assert_eq!(over(dst, src), [128, 0, 127, 255]);
    }

    #[test]
    fn over_in_place_rejects_mismatched_lengths() {
        let mut dst = vec![0u8; 8];
        assert!(over_in_place(&mut dst, &[0u8; 4]).is_err());
    }

    #[test]
    fn blit_clips_to_canvas() {
        let mut canvas = RasterImage::solid(4, 4, Rgba8::BLACK);
        let red = RasterImage::solid(3, 3, Rgba8::rgb(255, 0, 0));
        blit_over(&mut canvas, &red, -1, 2);

        for y in 0..4 {
            for x in 0..4 {
                let expected = if x < 2 && y >= 2 {
                    [255, 0, 0, 255]
                } else {
                    [0, 0, 0, 255]
                };
                assert_eq!(canvas.pixel(x, y).unwrap(), expected, "({x}, {y})");
            }
        }
    }

    #[test]
    fn blit_fully_off_canvas_is_noop() {
        let base = RasterImage::solid(4, 4, Rgba8::BLACK);
        let mut canvas = base.clone();
        blit_over(&mut canvas, &RasterImage::solid(2, 2, Rgba8::WHITE), 10, -10);
        assert_eq!(canvas, base);
    }

    #[test]
    fn blit_at_extreme_origins_is_noop() {
        let base = RasterImage::solid(4, 4, Rgba8::BLACK);
        let mut canvas = base.clone();
        let white = RasterImage::solid(2, 2, Rgba8::WHITE);
        blit_over(&mut canvas, &white, i64::MAX, 0);
        blit_over(&mut canvas, &white, 0, i64::MAX);
        blit_over(&mut canvas, &white, i64::MIN, i64::MIN);
        assert_eq!(canvas, base);
    }
}
