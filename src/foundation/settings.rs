use crate::foundation::{
    error::{WatermarkError, WatermarkResult},
    units::UnitConverter,
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Per-engine rendering configuration.
pub struct WatermarkSettings {
    /// Display density used to convert padding and overlay sizes to pixels.
    pub density_scale: f32,
    /// Extra factor applied to text sizes on top of `density_scale`.
    pub font_scale: f32,
    /// Decode resource-backed image overlays on the rayon pool before blitting.
    pub parallel_decode: bool,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            density_scale: 1.0,
            font_scale: 1.0,
            parallel_decode: false,
        }
    }
}

impl WatermarkSettings {
    /// Check that the scale factors are usable.
    pub fn validate(&self) -> WatermarkResult<()> {
        self.units().map(|_| ())
    }

    /// Unit converter for these settings.
    pub fn units(&self) -> WatermarkResult<UnitConverter> {
        UnitConverter::with_font_scale(self.density_scale, self.font_scale)
    }

    /// Apply `WATERMARK_DENSITY_SCALE`, `WATERMARK_FONT_SCALE` and `WATERMARK_PARALLEL_DECODE`.
    ///
    /// Unparseable or non-positive values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_positive_f32("WATERMARK_DENSITY_SCALE") {
            self.density_scale = v;
        }
        if let Some(v) = env_positive_f32("WATERMARK_FONT_SCALE") {
            self.font_scale = v;
        }
        if let Some(v) = std::env::var("WATERMARK_PARALLEL_DECODE")
            .ok()
            .and_then(|v| parse_flag(&v))
        {
            self.parallel_decode = v;
        }
        self
    }

    /// Parse settings from a JSON object.
    pub fn from_json_str(s: &str) -> WatermarkResult<Self> {
        let settings: Self =
            serde_json::from_str(s).map_err(|e| WatermarkError::serde(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

fn env_positive_f32(key: &str) -> Option<f32> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<f32>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_neutral() {
        let s = WatermarkSettings::default();
        let u = s.units().unwrap();
        assert_eq!(u.to_pixels(12.0), 12.0);
        assert!(!s.parallel_decode);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s = WatermarkSettings::from_json_str(r#"{"density_scale": 3.0}"#).unwrap();
        assert_eq!(s.density_scale, 3.0);
        assert_eq!(s.font_scale, 1.0);
    }

    #[test]
    fn invalid_density_fails_validation() {
        let err = WatermarkSettings::from_json_str(r#"{"density_scale": 0.0}"#).unwrap_err();
        assert!(matches!(err, WatermarkError::InvalidConfiguration(_)));

        let err = WatermarkSettings::from_json_str(r#"{"density": 2.0}"#).unwrap_err();
        assert!(matches!(err, WatermarkError::Serde(_)));
    }

    #[test]
    fn flags_parse_loosely() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
