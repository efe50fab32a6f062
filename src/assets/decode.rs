use std::io::Cursor;

use anyhow::Context;

use crate::foundation::{
    core::RasterImage,
    error::{WatermarkError, WatermarkResult},
};

/// Largest SVG raster edge we are willing to allocate.
const MAX_SVG_DIM: u32 = 16_384;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Encoding family of a resource, decided from its name and leading bytes.
pub enum ResourceFormat {
    /// Anything the `image` crate can decode.
    Raster,
    /// SVG document rasterized with `resvg`.
    Svg,
}

impl ResourceFormat {
    /// Classify a resource by handle extension, falling back to sniffing `head`.
    pub fn detect(handle: &str, head: &[u8]) -> Self {
        let by_name = handle
            .rsplit_once('.')
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("svg"));
        if by_name {
            return Self::Svg;
        }
        let trimmed = head
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .map_or(&head[..0], |i| &head[i..]);
        if trimmed.starts_with(b"<svg") || trimmed.starts_with(b"<?xml") {
            Self::Svg
        } else {
            Self::Raster
        }
    }
}

/// Natural dimensions of an encoded raster image, read from its header only.
pub fn probe_image(bytes: &[u8]) -> WatermarkResult<(u32, u32)> {
    let dims = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("guess image format")?
        .into_dimensions()
        .context("read image dimensions")?;
    Ok(dims)
}

/// Fully decode an encoded raster image into premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> WatermarkResult<RasterImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(RasterImage::from_dynamic(&dyn_img))
}

/// Parse an SVG document.
pub fn parse_svg(bytes: &[u8]) -> WatermarkResult<usvg::Tree> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    Ok(tree)
}

/// Whole-pixel document size of a parsed SVG.
pub fn svg_size(tree: &usvg::Tree) -> WatermarkResult<(u32, u32)> {
    fn to_px(v: f32) -> WatermarkResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(WatermarkError::Other(anyhow::anyhow!(
                "svg has invalid width/height"
            )));
        }
        Ok((v.ceil() as u32).max(1))
    }

    let size = tree.size();
    Ok((to_px(size.width())?, to_px(size.height())?))
}

/// Rasterize `tree` stretched to exactly `width` x `height`.
pub fn rasterize_svg(tree: &usvg::Tree, width: u32, height: u32) -> WatermarkResult<RasterImage> {
    if width > MAX_SVG_DIM || height > MAX_SVG_DIM {
        return Err(WatermarkError::Other(anyhow::anyhow!(
            "svg raster size too large: {width}x{height} (max {MAX_SVG_DIM}x{MAX_SVG_DIM})"
        )));
    }
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| anyhow::anyhow!("failed to allocate {width}x{height} svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    RasterImage::from_premul_rgba8(width, height, pixmap.data().to_vec())
}
