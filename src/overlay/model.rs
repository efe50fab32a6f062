use crate::{
    foundation::{
        core::{RasterImage, Rgba8},
        error::{WatermarkError, WatermarkResult},
    },
    layout::position::Position,
};

/// Default text size, in text-size units.
pub const DEFAULT_TEXT_SIZE: f32 = 20.0;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
/// Opaque reference to an image resource, interpreted by a [`crate::ResourceLoader`].
pub struct ResourceHandle(String);

impl ResourceHandle {
    /// Wrap a handle string.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Handle string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceHandle {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ResourceHandle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Where an image overlay's pixels come from.
pub enum ImageSource {
    /// Caller-supplied pixels, drawn as-is.
    Buffer(RasterImage),
    /// Resource loaded and scaled at render time.
    Resource(ResourceHandle),
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Image overlay descriptor.
pub struct ImageOverlay {
    /// Pixel source; `None` fails resolution with [`WatermarkError::MissingSource`].
    pub source: Option<ImageSource>,
    /// Target width in density-independent units; 0 keeps the resource's natural width.
    pub width: u32,
    /// Target height in density-independent units; 0 keeps the resource's natural height.
    pub height: u32,
    /// Placement rule.
    pub position: Position,
}

impl ImageOverlay {
    /// Overlay drawing an already-sized buffer.
    pub fn from_buffer(buffer: RasterImage) -> Self {
        Self {
            source: Some(ImageSource::Buffer(buffer)),
            ..Self::default()
        }
    }

    /// Overlay loading `handle` at render time.
    pub fn from_resource(handle: impl Into<ResourceHandle>) -> Self {
        Self {
            source: Some(ImageSource::Resource(handle.into())),
            ..Self::default()
        }
    }

    /// Set the target size (ignored for buffer sources).
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the placement rule.
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }
}

fn default_text_size() -> f32 {
    DEFAULT_TEXT_SIZE
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
/// Text overlay descriptor.
pub struct TextOverlay {
    /// Text to draw; must be non-empty.
    pub text: String,
    /// Fill color.
    #[serde(default)]
    pub color: Rgba8,
    /// Size in text-size units.
    #[serde(default = "default_text_size")]
    pub size: f32,
    /// Placement rule.
    #[serde(default)]
    pub position: Position,
}

impl TextOverlay {
    /// White text at the default size, top-left.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: Rgba8::WHITE,
            size: DEFAULT_TEXT_SIZE,
            position: Position::default(),
        }
    }

    /// Set the fill color.
    pub fn with_color(mut self, color: Rgba8) -> Self {
        self.color = color;
        self
    }

    /// Set the size in text-size units.
    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    /// Set the placement rule.
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Reject descriptors that cannot be drawn.
    pub fn validate(&self) -> WatermarkResult<()> {
        if self.text.is_empty() {
            return Err(WatermarkError::invalid_overlay("text must be non-empty"));
        }
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(WatermarkError::invalid_overlay(format!(
                "text size must be finite and > 0, got {}",
                self.size
            )));
        }
        self.position.validate()
    }
}
