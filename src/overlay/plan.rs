use std::path::Path;

use anyhow::Context;

use crate::{
    foundation::{
        error::{WatermarkError, WatermarkResult},
        settings::WatermarkSettings,
    },
    layout::position::Position,
    overlay::model::{ImageOverlay, ResourceHandle, TextOverlay},
    render::engine::Watermark,
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
/// Resource-backed image overlay as written in a plan file.
pub struct PlannedImage {
    /// Resource handle, resolved by the engine's loader.
    pub resource: ResourceHandle,
    /// Target width in density-independent units; 0 keeps the natural width.
    #[serde(default)]
    pub width: u32,
    /// Target height in density-independent units; 0 keeps the natural height.
    #[serde(default)]
    pub height: u32,
    /// Placement rule.
    #[serde(default)]
    pub position: Position,
}

impl From<&PlannedImage> for ImageOverlay {
    fn from(p: &PlannedImage) -> Self {
        ImageOverlay::from_resource(p.resource.clone())
            .with_size(p.width, p.height)
            .with_position(p.position)
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
/// Serializable description of a full watermark job: settings plus ordered overlays.
pub struct WatermarkPlan {
    /// Engine settings.
    #[serde(default)]
    pub settings: WatermarkSettings,
    /// Image overlays in draw order.
    #[serde(default)]
    pub images: Vec<PlannedImage>,
    /// Text overlays in draw order.
    #[serde(default)]
    pub texts: Vec<TextOverlay>,
}

impl WatermarkPlan {
    /// Parse and validate a JSON plan.
    pub fn from_json_str(s: &str) -> WatermarkResult<Self> {
        let plan: Self = serde_json::from_str(s).map_err(|e| WatermarkError::serde(e.to_string()))?;
        plan.validate()?;
        Ok(plan)
    }

    /// Read, parse and validate a JSON plan file.
    pub fn from_path(path: impl AsRef<Path>) -> WatermarkResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read plan '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    /// Check settings and every overlay.
    pub fn validate(&self) -> WatermarkResult<()> {
        self.settings.validate()?;
        for image in &self.images {
            image.position.validate()?;
        }
        for text in &self.texts {
            text.validate()?;
        }
        Ok(())
    }

    /// Queue every overlay of the plan on `watermark`, preserving order.
    pub fn apply<'w>(&self, watermark: &'w mut Watermark) -> WatermarkResult<&'w mut Watermark> {
        for image in &self.images {
            watermark.add_image_overlay(ImageOverlay::from(image));
        }
        for text in &self.texts {
            watermark.add_text_overlay(text.clone())?;
        }
        Ok(watermark)
    }
}
