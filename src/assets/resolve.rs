use image::imageops::FilterType;

use crate::{
    assets::loader::ResourceLoader,
    foundation::{
        core::RasterImage,
        error::{WatermarkError, WatermarkResult},
        units::UnitConverter,
    },
    overlay::model::{ImageOverlay, ImageSource},
};

/// Produce the pixels an image overlay draws.
///
/// Buffer sources are returned unchanged. Resource sources are probed for their natural size,
/// zero target dimensions fall back to it per axis, the result is converted to pixels with
/// `units` and the resource is decoded at exactly that size.
pub fn resolve_image(
    overlay: &ImageOverlay,
    units: &UnitConverter,
    loader: &dyn ResourceLoader,
) -> WatermarkResult<RasterImage> {
    let handle = match &overlay.source {
        Some(ImageSource::Buffer(buffer)) => return Ok(buffer.clone()),
        Some(ImageSource::Resource(handle)) => handle,
        None => {
            return Err(WatermarkError::missing_source(
                "image overlay has neither a pixel buffer nor a resource handle",
            ));
        }
    };

    let (natural_w, natural_h) = loader.probe(handle)?;
    let width_dp = if overlay.width == 0 {
        natural_w
    } else {
        overlay.width
    };
    let height_dp = if overlay.height == 0 {
        natural_h
    } else {
        overlay.height
    };

    let width = units.to_pixel_extent(width_dp);
    let height = units.to_pixel_extent(height_dp);
    if width == 0 || height == 0 {
        return Err(WatermarkError::invalid_overlay(format!(
            "image overlay '{handle}' resolves to an empty {width}x{height} pixel size"
        )));
    }
    tracing::trace!(
        %handle,
        natural_w,
        natural_h,
        width,
        height,
        "resolved overlay source size"
    );

    let decoded = loader.decode_scaled(handle, width, height)?;
    if decoded.width() != width || decoded.height() != height {
        return scale_image(&decoded, width, height);
    }
    Ok(decoded)
}

/// Resample `image` to exactly `width` x `height` with a bilinear filter.
///
/// Filtering runs on premultiplied pixels so transparent edges do not bleed dark fringes.
pub fn scale_image(image: &RasterImage, width: u32, height: u32) -> WatermarkResult<RasterImage> {
    if width == 0 || height == 0 {
        return Err(WatermarkError::invalid_overlay(format!(
            "cannot scale image to {width}x{height}"
        )));
    }
    if image.width() == width && image.height() == height {
        return Ok(image.clone());
    }

    let src = image::RgbaImage::from_raw(
        image.width(),
        image.height(),
        image.as_premul_rgba8().to_vec(),
    )
    .ok_or_else(|| WatermarkError::Other(anyhow::anyhow!("raster byte length mismatch")))?;
    let resized = image::imageops::resize(&src, width, height, FilterType::Triangle);
    RasterImage::from_premul_rgba8(width, height, resized.into_raw())
}
