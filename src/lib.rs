//! Watermark composites positioned image and text overlays onto a raster image.
//!
//! A [`Watermark`] holds a base [`RasterImage`] and two ordered overlay queues. Rendering draws
//! every [`ImageOverlay`], then every [`TextOverlay`], each group in insertion order, onto a
//! private copy of the base image and keeps the result.
//!
//! # Pipeline overview
//!
//! 1. **Units**: padding, overlay sizes and text sizes are density-independent and converted to
//!    pixels by a [`UnitConverter`].
//! 2. **Sources**: resource-backed image overlays are probed, sized and decoded through a
//!    [`ResourceLoader`] ([`resolve_image`]).
//! 3. **Placement**: each overlay's [`Position`] is resolved against its own pixel extent and the
//!    canvas ([`resolve_position`]); images anchor at their top edge, text at its baseline.
//! 4. **Draw**: images are blitted source-over, text is measured and drawn by a [`TextRenderer`].
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic**: the same base image and overlay queues always produce the same pixels.
//! - **All-or-nothing**: any error aborts the render and leaves no result.
//! - **Premultiplied RGBA8** internally; [`RasterImage::to_rgba_image`] converts for encoders.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;
mod layout;
mod overlay;
mod render;

pub use assets::decode::{
    ResourceFormat, decode_image, parse_svg, probe_image, rasterize_svg, svg_size,
};
pub use assets::loader::{
    FsResourceLoader, MemoryResourceLoader, NoResources, ResourceLoader, normalize_rel_path,
};
pub use assets::resolve::{resolve_image, scale_image};
pub use foundation::core::{
    Point, RasterImage, Rgba8, Size, premultiply_rgba8_in_place, unpremultiply_rgba8_in_place,
};
pub use foundation::error::{WatermarkError, WatermarkResult};
pub use foundation::settings::WatermarkSettings;
pub use foundation::units::UnitConverter;
pub use layout::position::{Position, VerticalOrigin, resolve as resolve_position};
pub use overlay::model::{
    DEFAULT_TEXT_SIZE, ImageOverlay, ImageSource, ResourceHandle, TextOverlay,
};
pub use overlay::plan::{PlannedImage, WatermarkPlan};
pub use render::composite::{PremulRgba8, blit_over, over, over_in_place};
pub use render::engine::Watermark;
pub use render::text::{ParleyTextRenderer, TextBounds, TextBrushRgba8, TextRenderer, TextRun};
