use crate::foundation::{
    core::{Point, Size},
    error::{WatermarkError, WatermarkResult},
    units::UnitConverter,
};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
/// Placement rule for an overlay.
///
/// Padding is a non-negative density-independent length measured from the named canvas edges to
/// the overlay's own rendered extent.
pub enum Position {
    /// Anchored to the top-left corner.
    LeftTop {
        /// Distance from the left edge.
        #[serde(default)]
        padding_left: f32,
        /// Distance from the top edge.
        #[serde(default)]
        padding_top: f32,
    },
    /// Anchored to the bottom-left corner.
    LeftBottom {
        /// Distance from the left edge.
        #[serde(default)]
        padding_left: f32,
        /// Distance from the bottom edge.
        #[serde(default)]
        padding_bottom: f32,
    },
    /// Anchored to the top-right corner.
    RightTop {
        /// Distance from the right edge.
        #[serde(default)]
        padding_right: f32,
        /// Distance from the top edge.
        #[serde(default)]
        padding_top: f32,
    },
    /// Anchored to the bottom-right corner.
    RightBottom {
        /// Distance from the right edge.
        #[serde(default)]
        padding_right: f32,
        /// Distance from the bottom edge.
        #[serde(default)]
        padding_bottom: f32,
    },
    /// Centered on both axes.
    Center,
}

impl Default for Position {
    fn default() -> Self {
        Self::left_top(0.0, 0.0)
    }
}

impl Position {
    /// [`Position::LeftTop`] shorthand.
    pub fn left_top(padding_left: f32, padding_top: f32) -> Self {
        Self::LeftTop {
            padding_left,
            padding_top,
        }
    }

    /// [`Position::LeftBottom`] shorthand.
    pub fn left_bottom(padding_left: f32, padding_bottom: f32) -> Self {
        Self::LeftBottom {
            padding_left,
            padding_bottom,
        }
    }

    /// [`Position::RightTop`] shorthand.
    pub fn right_top(padding_right: f32, padding_top: f32) -> Self {
        Self::RightTop {
            padding_right,
            padding_top,
        }
    }

    /// [`Position::RightBottom`] shorthand.
    pub fn right_bottom(padding_right: f32, padding_bottom: f32) -> Self {
        Self::RightBottom {
            padding_right,
            padding_bottom,
        }
    }

    /// Padding values in declaration order.
    fn paddings(&self) -> [f32; 2] {
        match *self {
            Self::LeftTop {
                padding_left,
                padding_top,
            } => [padding_left, padding_top],
            Self::LeftBottom {
                padding_left,
                padding_bottom,
            } => [padding_left, padding_bottom],
            Self::RightTop {
                padding_right,
                padding_top,
            } => [padding_right, padding_top],
            Self::RightBottom {
                padding_right,
                padding_bottom,
            } => [padding_right, padding_bottom],
            Self::Center => [0.0, 0.0],
        }
    }

    /// Reject negative or non-finite padding.
    pub fn validate(&self) -> WatermarkResult<()> {
        for padding in self.paddings() {
            if !padding.is_finite() || padding < 0.0 {
                return Err(WatermarkError::invalid_overlay(format!(
                    "padding must be finite and >= 0, got {padding}"
                )));
            }
        }
        Ok(())
    }

    /// Same rule with every padding converted to pixels.
    pub fn to_pixels(self, units: &UnitConverter) -> Self {
        let px = |v: f32| units.to_pixels(v);
        match self {
            Self::LeftTop {
                padding_left,
                padding_top,
            } => Self::left_top(px(padding_left), px(padding_top)),
            Self::LeftBottom {
                padding_left,
                padding_bottom,
            } => Self::left_bottom(px(padding_left), px(padding_bottom)),
            Self::RightTop {
                padding_right,
                padding_top,
            } => Self::right_top(px(padding_right), px(padding_top)),
            Self::RightBottom {
                padding_right,
                padding_bottom,
            } => Self::right_bottom(px(padding_right), px(padding_bottom)),
            Self::Center => Self::Center,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Which point of the overlay the resolved `y` refers to.
pub enum VerticalOrigin {
    /// Top edge; raster blits anchor here.
    Top,
    /// Text baseline; glyphs extend upward from it.
    Baseline,
}

/// Resolve a pixel-space [`Position`] to an absolute origin on the canvas.
///
/// For [`VerticalOrigin::Top`] the result is the overlay's top-left corner. For
/// [`VerticalOrigin::Baseline`] `y` is moved down by the overlay height, which puts the baseline of
/// a glyph box of that height where its bottom edge would be. Results may be negative or past the
/// canvas when the overlay does not fit; they are never clamped.
pub fn resolve(
    position: &Position,
    overlay: Size,
    canvas: Size,
    origin: VerticalOrigin,
) -> Point {
    let (x, top) = match *position {
        Position::LeftTop {
            padding_left,
            padding_top,
        } => (f64::from(padding_left), f64::from(padding_top)),
        Position::LeftBottom {
            padding_left,
            padding_bottom,
        } => (
            f64::from(padding_left),
            canvas.height - overlay.height - f64::from(padding_bottom),
        ),
        Position::RightTop {
            padding_right,
            padding_top,
        } => (
            canvas.width - overlay.width - f64::from(padding_right),
            f64::from(padding_top),
        ),
        Position::RightBottom {
            padding_right,
            padding_bottom,
        } => (
            canvas.width - overlay.width - f64::from(padding_right),
            canvas.height - overlay.height - f64::from(padding_bottom),
        ),
        Position::Center => (
            (canvas.width - overlay.width) / 2.0,
            (canvas.height - overlay.height) / 2.0,
        ),
    };

    let y = match origin {
        VerticalOrigin::Top => top,
        VerticalOrigin::Baseline => top + overlay.height,
    };
    Point::new(x, y)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const CANVAS: Size = Size::new(500.0, 500.0);
    const OVERLAY: Size = Size::new(40.0, 30.0);

    fn image_at(p: Position) -> Point {
        resolve(&p, OVERLAY, CANVAS, VerticalOrigin::Top)
    }

    fn text_at(p: Position) -> Point {
        resolve(&p, OVERLAY, CANVAS, VerticalOrigin::Baseline)
    }

    #[test]
    fn left_top_uses_padding_directly() {
        let units = UnitConverter::new(1.0).unwrap();
        let p = Position::left_top(10.0, 20.0).to_pixels(&units);
        assert_eq!(image_at(p), Point::new(10.0, 20.0));
        assert_eq!(text_at(p), Point::new(10.0, 50.0));
    }

    #[test]
    fn corners_offset_from_far_edges() {
        assert_eq!(
            image_at(Position::left_bottom(5.0, 7.0)),
            Point::new(5.0, 500.0 - 30.0 - 7.0)
        );
        assert_eq!(
            image_at(Position::right_top(5.0, 7.0)),
            Point::new(500.0 - 40.0 - 5.0, 7.0)
        );
        assert_eq!(
            image_at(Position::right_bottom(5.0, 7.0)),
            Point::new(500.0 - 40.0 - 5.0, 500.0 - 30.0 - 7.0)
        );
    }

    #[test]
    fn bottom_anchored_text_baseline_sits_on_padding() {
        assert_eq!(
            text_at(Position::left_bottom(5.0, 7.0)),
            Point::new(5.0, 500.0 - 7.0)
        );
        assert_eq!(
            text_at(Position::right_bottom(5.0, 7.0)),
            Point::new(500.0 - 40.0 - 5.0, 500.0 - 7.0)
        );
        assert_eq!(
            text_at(Position::right_top(5.0, 7.0)),
            Point::new(500.0 - 40.0 - 5.0, 7.0 + 30.0)
        );
    }

    #[test]
    fn center_is_symmetric_and_baseline_is_one_height_lower() {
        let img = image_at(Position::Center);
        assert_eq!(img.x + OVERLAY.width / 2.0, CANVAS.width / 2.0);
        assert_eq!(img.y + OVERLAY.height / 2.0, CANVAS.height / 2.0);

        let txt = text_at(Position::Center);
        assert_eq!(txt.x, img.x);
        assert_eq!(txt.y - img.y, OVERLAY.height);
        assert_eq!(txt.y, (CANVAS.height + OVERLAY.height) / 2.0);
    }

    #[test]
    fn every_variant_keeps_the_baseline_offset() {
        for p in [
            Position::left_top(3.0, 4.0),
            Position::left_bottom(3.0, 4.0),
            Position::right_top(3.0, 4.0),
            Position::right_bottom(3.0, 4.0),
            Position::Center,
        ] {
            assert_eq!(text_at(p).y - image_at(p).y, OVERLAY.height);
        }
    }

    #[test]
    fn oversized_overlay_goes_negative_without_clamping() {
        let p = resolve(
            &Position::right_bottom(0.0, 0.0),
            Size::new(80.0, 60.0),
            Size::new(50.0, 50.0),
            VerticalOrigin::Top,
        );
        assert_eq!(p, Point::new(-30.0, -10.0));
    }

    #[test]
    fn validate_rejects_negative_and_non_finite_padding() {
        assert!(Position::right_bottom(0.0, 12.5).validate().is_ok());
        assert!(Position::Center.validate().is_ok());
        for bad in [
            Position::left_top(-1.0, 0.0),
            Position::left_bottom(0.0, f32::NAN),
            Position::right_top(f32::INFINITY, 0.0),
            Position::right_bottom(3.0, -0.5),
        ] {
            assert!(
                matches!(bad.validate(), Err(WatermarkError::InvalidOverlay(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn padding_scales_with_density() {
        let units = UnitConverter::new(2.0).unwrap();
        let p = Position::right_bottom(10.0, 4.0).to_pixels(&units);
        assert_eq!(p, Position::right_bottom(20.0, 8.0));
        assert_eq!(Position::Center.to_pixels(&units), Position::Center);
    }

    #[test]
    fn deserializes_tagged_variants_with_default_padding() {
        let p: Position =
            serde_json::from_value(json!({"kind": "right_bottom", "padding_right": 8})).unwrap();
        assert_eq!(p, Position::right_bottom(8.0, 0.0));

        let p: Position = serde_json::from_value(json!({"kind": "center"})).unwrap();
        assert_eq!(p, Position::Center);

        assert_eq!(Position::default(), Position::left_top(0.0, 0.0));
    }
}
