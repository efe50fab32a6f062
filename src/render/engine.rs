use std::sync::Arc;

use rayon::prelude::*;

use crate::{
    assets::{
        loader::{NoResources, ResourceLoader},
        resolve::resolve_image,
    },
    foundation::{
        core::{RasterImage, Size},
        error::{WatermarkError, WatermarkResult},
        settings::WatermarkSettings,
        units::UnitConverter,
    },
    layout::position::{VerticalOrigin, resolve},
    overlay::model::{ImageOverlay, TextOverlay},
    render::{
        composite::blit_over,
        text::{TextRenderer, TextRun},
    },
};

/// Compositing engine: a base image plus ordered image and text overlays.
///
/// [`Watermark::render`] draws every image overlay, then every text overlay, each group in
/// insertion order, onto a private copy of the base image. Later overlays cover earlier ones.
/// The base image and the overlay queues are never modified by rendering, so rendering again
/// recomputes the same result from scratch.
///
/// Platform services (display density, resource decoding, text shaping) are injected rather than
/// looked up globally.
pub struct Watermark {
    base: RasterImage,
    units: UnitConverter,
    loader: Arc<dyn ResourceLoader>,
    text_renderer: Option<Box<dyn TextRenderer>>,
    parallel_decode: bool,
    image_overlays: Vec<ImageOverlay>,
    text_overlays: Vec<TextOverlay>,
    result: Option<RasterImage>,
}

impl std::fmt::Debug for Watermark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watermark")
            .field("base", &self.base)
            .field("units", &self.units)
            .field("has_text_renderer", &self.text_renderer.is_some())
            .field("parallel_decode", &self.parallel_decode)
            .field("image_overlays", &self.image_overlays.len())
            .field("text_overlays", &self.text_overlays.len())
            .field("has_result", &self.result.is_some())
            .finish()
    }
}

impl Watermark {
    /// Engine over `base` with no resource loader and no text renderer.
    pub fn new(base: RasterImage, units: UnitConverter) -> Self {
        Self {
            base,
            units,
            loader: Arc::new(NoResources),
            text_renderer: None,
            parallel_decode: false,
            image_overlays: Vec::new(),
            text_overlays: Vec::new(),
            result: None,
        }
    }

    /// Engine configured from `settings`.
    pub fn from_settings(base: RasterImage, settings: &WatermarkSettings) -> WatermarkResult<Self> {
        Ok(Self::new(base, settings.units()?).with_parallel_decode(settings.parallel_decode))
    }

    /// Use `loader` for resource-backed image overlays.
    pub fn with_loader(mut self, loader: Arc<dyn ResourceLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Use `renderer` to measure and draw text overlays.
    pub fn with_text_renderer(mut self, renderer: Box<dyn TextRenderer>) -> Self {
        self.text_renderer = Some(renderer);
        self
    }

    /// Decode image overlay sources on the rayon pool before the sequential blit phase.
    pub fn with_parallel_decode(mut self, enabled: bool) -> Self {
        self.parallel_decode = enabled;
        self
    }

    /// Queue an image overlay.
    pub fn add_image_overlay(&mut self, overlay: ImageOverlay) -> &mut Self {
        self.image_overlays.push(overlay);
        self
    }

    /// Queue a text overlay; empty text is rejected.
    pub fn add_text_overlay(&mut self, overlay: TextOverlay) -> WatermarkResult<&mut Self> {
        overlay.validate()?;
        self.text_overlays.push(overlay);
        Ok(self)
    }

    /// Composite every queued overlay onto a fresh copy of the base image.
    ///
    /// Any failure aborts the whole render and leaves no result.
    #[tracing::instrument(
        skip(self),
        fields(
            width = self.base.width(),
            height = self.base.height(),
            images = self.image_overlays.len(),
            texts = self.text_overlays.len()
        )
    )]
    pub fn render(&mut self) -> WatermarkResult<&mut Self> {
        self.result = None;

        let sources = self.resolve_sources()?;
        let mut canvas = self.base.clone();
        let canvas_size = canvas.size();

        for (index, (overlay, source)) in self.image_overlays.iter().zip(&sources).enumerate() {
            let position = overlay.position.to_pixels(&self.units);
            let origin = resolve(&position, source.size(), canvas_size, VerticalOrigin::Top);
            let (x, y) = (origin.x.round() as i64, origin.y.round() as i64);
            tracing::debug!(
                index,
                x,
                y,
                width = source.width(),
                height = source.height(),
                "image overlay"
            );
            blit_over(&mut canvas, source, x, y);
        }

        if !self.text_overlays.is_empty() {
            let renderer = self
                .text_renderer
                .as_mut()
                .ok_or_else(|| WatermarkError::render("no text renderer configured"))?;
            for (index, overlay) in self.text_overlays.iter().enumerate() {
                let run = TextRun {
                    text: &overlay.text,
                    color: overlay.color,
                    size_px: self.units.to_pixels_for_text_size(overlay.size),
                };
                let bounds = renderer.measure(&run)?;
                let extent = Size::new(f64::from(bounds.width), f64::from(bounds.height));
                let position = overlay.position.to_pixels(&self.units);
                let baseline = resolve(&position, extent, canvas_size, VerticalOrigin::Baseline);
                tracing::debug!(
                    index,
                    x = baseline.x,
                    y = baseline.y,
                    size_px = run.size_px,
                    "text overlay"
                );
                renderer.draw(&mut canvas, &run, baseline)?;
            }
        }

        self.result = Some(canvas);
        tracing::info!("watermark rendered");
        Ok(self)
    }

    fn resolve_sources(&self) -> WatermarkResult<Vec<RasterImage>> {
        let units = &self.units;
        let loader = self.loader.as_ref();
        if self.parallel_decode && self.image_overlays.len() > 1 {
            self.image_overlays
                .par_iter()
                .map(|overlay| resolve_image(overlay, units, loader))
                .collect()
        } else {
            self.image_overlays
                .iter()
                .map(|overlay| resolve_image(overlay, units, loader))
                .collect()
        }
    }

    /// Rendered image, or the untouched base image before the first successful render.
    pub fn result(&self) -> &RasterImage {
        self.result.as_ref().unwrap_or(&self.base)
    }

    /// Whether a rendered result is available.
    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }

    /// Consume the engine and return [`Watermark::result`].
    pub fn into_result(self) -> RasterImage {
        self.result.unwrap_or(self.base)
    }

    /// Base image as supplied.
    pub fn base(&self) -> &RasterImage {
        &self.base
    }

    /// Unit converter in use.
    pub fn units(&self) -> &UnitConverter {
        &self.units
    }

    /// Queued image overlays, in draw order.
    pub fn image_overlays(&self) -> &[ImageOverlay] {
        &self.image_overlays
    }

    /// Queued text overlays, in draw order.
    pub fn text_overlays(&self) -> &[TextOverlay] {
        &self.text_overlays
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{foundation::core::Rgba8, layout::position::Position};

    fn engine(base: RasterImage) -> Watermark {
        Watermark::new(base, UnitConverter::new(1.0).unwrap())
    }

    #[test]
    fn result_defaults_to_base() {
        let base = RasterImage::solid(4, 4, Rgba8::BLACK);
        let wm = engine(base.clone());
        assert!(!wm.has_result());
        assert!(wm.result().shares_storage_with(&base));
    }

    #[test]
    fn image_overlay_lands_at_resolved_corner() {
        let base = RasterImage::solid(10, 10, Rgba8::BLACK);
        let mut wm = engine(base);
        wm.add_image_overlay(
            ImageOverlay::from_buffer(RasterImage::solid(2, 3, Rgba8::WHITE))
                .with_position(Position::right_bottom(1.0, 1.0)),
        );
        wm.render().unwrap();

        let out = wm.result();
        assert_eq!(out.pixel(7, 6).unwrap(), [255, 255, 255, 255]);
        assert_eq!(out.pixel(8, 8).unwrap(), [255, 255, 255, 255]);
        assert_eq!(out.pixel(9, 9).unwrap(), [0, 0, 0, 255]);
        assert_eq!(out.pixel(6, 6).unwrap(), [0, 0, 0, 255]);
    }

    #[test]
    fn text_without_renderer_fails_and_leaves_no_result() {
        let mut wm = engine(RasterImage::solid(4, 4, Rgba8::BLACK));
        wm.add_text_overlay(TextOverlay::new("x")).unwrap();
        let err = wm.render().unwrap_err();
        assert!(matches!(err, WatermarkError::Render(_)));
        assert!(!wm.has_result());
    }

    #[test]
    fn empty_text_is_rejected_on_add() {
        let mut wm = engine(RasterImage::solid(4, 4, Rgba8::BLACK));
        assert!(matches!(
            wm.add_text_overlay(TextOverlay::new("")),
            Err(WatermarkError::InvalidOverlay(_))
        ));
        assert!(wm.text_overlays().is_empty());
    }

    #[test]
    fn from_settings_rejects_bad_density() {
        let settings = WatermarkSettings {
            density_scale: -2.0,
            ..WatermarkSettings::default()
        };
        let err = Watermark::from_settings(RasterImage::solid(1, 1, Rgba8::BLACK), &settings)
            .unwrap_err();
        assert!(matches!(err, WatermarkError::InvalidConfiguration(_)));
    }
}
