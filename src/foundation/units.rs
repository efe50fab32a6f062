use crate::foundation::error::{WatermarkError, WatermarkResult};

#[derive(Clone, Copy, Debug, PartialEq)]
/// Converts density-independent lengths and text sizes into device pixels.
///
/// Lengths scale by `density_scale`; text sizes scale by `density_scale * font_scale`, the same
/// split a display platform makes between layout units and user-scalable text units.
pub struct UnitConverter {
    density_scale: f32,
    font_scale: f32,
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self {
            density_scale: 1.0,
            font_scale: 1.0,
        }
    }
}

impl UnitConverter {
    /// Converter with the given display density and a neutral font scale.
    pub fn new(density_scale: f32) -> WatermarkResult<Self> {
        Self::with_font_scale(density_scale, 1.0)
    }

    /// Converter with independent density and font scales. Both must be finite and > 0.
    pub fn with_font_scale(density_scale: f32, font_scale: f32) -> WatermarkResult<Self> {
        if !density_scale.is_finite() || density_scale <= 0.0 {
            return Err(WatermarkError::invalid_configuration(format!(
                "density scale must be finite and > 0, got {density_scale}"
            )));
        }
        if !font_scale.is_finite() || font_scale <= 0.0 {
            return Err(WatermarkError::invalid_configuration(format!(
                "font scale must be finite and > 0, got {font_scale}"
            )));
        }
        Ok(Self {
            density_scale,
            font_scale,
        })
    }

    /// Display density factor.
    pub fn density_scale(&self) -> f32 {
        self.density_scale
    }

    /// Additional factor applied to text sizes only.
    pub fn font_scale(&self) -> f32 {
        self.font_scale
    }

    /// Density-independent length to pixels.
    pub fn to_pixels(&self, length: f32) -> f32 {
        length * self.density_scale
    }

    /// Text size to pixels.
    pub fn to_pixels_for_text_size(&self, size: f32) -> f32 {
        size * self.density_scale * self.font_scale
    }

    /// Whole-pixel extent for an integer density-independent length.
    ///
    /// Converts first, then truncates toward zero.
    pub fn to_pixel_extent(&self, length: u32) -> u32 {
        let px = self.to_pixels(length as f32);
        if px.is_finite() && px > 0.0 {
            px as u32
        } else {
            0
        }
    }
}
