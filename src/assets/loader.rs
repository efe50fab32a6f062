use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;

use crate::{
    assets::{
        decode::{self, ResourceFormat},
        resolve::scale_image,
    },
    foundation::{
        core::RasterImage,
        error::{WatermarkError, WatermarkResult},
    },
    overlay::model::ResourceHandle,
};

/// Raster-image provider for resource-backed image overlays.
///
/// Implementations must be shareable across threads so overlay sources can be decoded in
/// parallel; the engine still blits them one at a time.
pub trait ResourceLoader: Send + Sync {
    /// Natural pixel dimensions of the resource, without decoding its pixels where possible.
    fn probe(&self, handle: &ResourceHandle) -> WatermarkResult<(u32, u32)>;

    /// Decode the resource at its natural size.
    fn decode(&self, handle: &ResourceHandle) -> WatermarkResult<RasterImage>;

    /// Decode the resource at exactly `width` x `height` pixels.
    fn decode_scaled(
        &self,
        handle: &ResourceHandle,
        width: u32,
        height: u32,
    ) -> WatermarkResult<RasterImage> {
        let natural = self.decode(handle)?;
        scale_image(&natural, width, height)
    }
}

/// Loader with no resources; every request fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoResources;

impl ResourceLoader for NoResources {
    fn probe(&self, handle: &ResourceHandle) -> WatermarkResult<(u32, u32)> {
        Err(WatermarkError::resource_decode(
            handle.as_str(),
            "no resource loader configured",
        ))
    }

    fn decode(&self, handle: &ResourceHandle) -> WatermarkResult<RasterImage> {
        Err(WatermarkError::resource_decode(
            handle.as_str(),
            "no resource loader configured",
        ))
    }
}

fn decode_failure(handle: &ResourceHandle) -> impl FnOnce(WatermarkError) -> WatermarkError + '_ {
    move |e| match e {
        e @ WatermarkError::ResourceDecode { .. } => e,
        WatermarkError::Other(e) => {
            WatermarkError::resource_decode(handle.as_str(), format!("{e:#}"))
        }
        e => WatermarkError::resource_decode(handle.as_str(), e),
    }
}

fn probe_bytes(handle: &ResourceHandle, bytes: &[u8]) -> WatermarkResult<(u32, u32)> {
    let probed = match ResourceFormat::detect(handle.as_str(), bytes) {
        ResourceFormat::Raster => decode::probe_image(bytes),
        ResourceFormat::Svg => decode::parse_svg(bytes).and_then(|tree| decode::svg_size(&tree)),
    };
    probed.map_err(decode_failure(handle))
}

fn decode_bytes(handle: &ResourceHandle, bytes: &[u8]) -> WatermarkResult<RasterImage> {
    let decoded = match ResourceFormat::detect(handle.as_str(), bytes) {
        ResourceFormat::Raster => decode::decode_image(bytes),
        ResourceFormat::Svg => decode::parse_svg(bytes).and_then(|tree| {
            let (w, h) = decode::svg_size(&tree)?;
            decode::rasterize_svg(&tree, w, h)
        }),
    };
    decoded.map_err(decode_failure(handle))
}

fn decode_bytes_scaled(
    handle: &ResourceHandle,
    bytes: &[u8],
    width: u32,
    height: u32,
) -> WatermarkResult<RasterImage> {
    match ResourceFormat::detect(handle.as_str(), bytes) {
        ResourceFormat::Raster => {
            let natural = decode::decode_image(bytes).map_err(decode_failure(handle))?;
            scale_image(&natural, width, height)
        }
        // Vector sources are rendered at the target size instead of resampled.
        ResourceFormat::Svg => decode::parse_svg(bytes)
            .and_then(|tree| decode::rasterize_svg(&tree, width, height))
            .map_err(decode_failure(handle)),
    }
}

/// Normalize and validate a root-relative resource path.
///
/// The result uses `/` separators and has `.` segments removed; absolute paths and parent
/// traversals (`..`) are rejected.
pub fn normalize_rel_path(source: &str) -> WatermarkResult<String> {
    let s = source.replace('\\', "/");
    if s.is_empty() {
        return Err(WatermarkError::resource_decode(
            source,
            "resource path must be non-empty",
        ));
    }
    if s.starts_with('/') || s.get(1..2) == Some(":") {
        return Err(WatermarkError::resource_decode(
            source,
            "resource paths must be relative",
        ));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(WatermarkError::resource_decode(
                source,
                "resource paths must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(WatermarkError::resource_decode(
            source,
            "resource path must contain a file name",
        ));
    }
    Ok(out.join("/"))
}

#[derive(Clone, Debug)]
/// Loads resources from files below a root directory.
pub struct FsResourceLoader {
    root: PathBuf,
}

impl FsResourceLoader {
    /// Loader resolving handles relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, handle: &ResourceHandle) -> WatermarkResult<PathBuf> {
        let norm = normalize_rel_path(handle.as_str())?;
        Ok(self.root.join(norm))
    }

    fn read_bytes(&self, handle: &ResourceHandle) -> WatermarkResult<Vec<u8>> {
        let path = self.path_for(handle)?;
        std::fs::read(&path)
            .with_context(|| format!("read '{}'", path.display()))
            .map_err(|e| WatermarkError::resource_decode(handle.as_str(), format!("{e:#}")))
    }
}

impl ResourceLoader for FsResourceLoader {
    fn probe(&self, handle: &ResourceHandle) -> WatermarkResult<(u32, u32)> {
        let path = self.path_for(handle)?;
        if ResourceFormat::detect(handle.as_str(), &[]) == ResourceFormat::Svg {
            return probe_bytes(handle, &self.read_bytes(handle)?);
        }
        tracing::trace!(path = %path.display(), "probing resource header");
        image::ImageReader::open(&path)
            .with_context(|| format!("open '{}'", path.display()))
            .and_then(|r| r.with_guessed_format().context("guess image format"))
            .and_then(|r| r.into_dimensions().context("read image dimensions"))
            .map_err(|e| WatermarkError::resource_decode(handle.as_str(), format!("{e:#}")))
    }

    fn decode(&self, handle: &ResourceHandle) -> WatermarkResult<RasterImage> {
        decode_bytes(handle, &self.read_bytes(handle)?)
    }

    fn decode_scaled(
        &self,
        handle: &ResourceHandle,
        width: u32,
        height: u32,
    ) -> WatermarkResult<RasterImage> {
        decode_bytes_scaled(handle, &self.read_bytes(handle)?, width, height)
    }
}

#[derive(Clone, Debug, Default)]
/// In-memory map from handle to encoded resource bytes.
pub struct MemoryResourceLoader {
    resources: HashMap<ResourceHandle, Arc<Vec<u8>>>,
}

impl MemoryResourceLoader {
    /// Empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register encoded bytes under `handle`, replacing any previous entry.
    pub fn insert(&mut self, handle: impl Into<ResourceHandle>, bytes: Vec<u8>) -> &mut Self {
        self.resources.insert(handle.into(), Arc::new(bytes));
        self
    }

    /// Number of registered resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether no resources are registered.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    fn bytes(&self, handle: &ResourceHandle) -> WatermarkResult<&[u8]> {
        self.resources
            .get(handle)
            .map(|b| b.as_slice())
            .ok_or_else(|| WatermarkError::resource_decode(handle.as_str(), "resource not found"))
    }
}

impl ResourceLoader for MemoryResourceLoader {
    fn probe(&self, handle: &ResourceHandle) -> WatermarkResult<(u32, u32)> {
        probe_bytes(handle, self.bytes(handle)?)
    }

    fn decode(&self, handle: &ResourceHandle) -> WatermarkResult<RasterImage> {
        decode_bytes(handle, self.bytes(handle)?)
    }

    fn decode_scaled(
        &self,
        handle: &ResourceHandle,
        width: u32,
        height: u32,
    ) -> WatermarkResult<RasterImage> {
        decode_bytes_scaled(handle, self.bytes(handle)?, width, height)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([9, 8, 7, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn normalize_path_cross_platform() {
        assert_eq!(normalize_rel_path("a/b.png").unwrap(), "a/b.png");
        assert_eq!(normalize_rel_path("a\\.\\b.png").unwrap(), "a/b.png");
        assert!(normalize_rel_path("../x.png").is_err());
        assert!(normalize_rel_path("/etc/x.png").is_err());
        assert!(normalize_rel_path("C:\\x.png").is_err());
        assert!(normalize_rel_path("./").is_err());
    }

    #[test]
    fn memory_loader_probes_decodes_and_scales() {
        let mut loader = MemoryResourceLoader::new();
        loader.insert("logo.png", png_bytes(6, 4));
        let handle = ResourceHandle::new("logo.png");

        assert_eq!(loader.probe(&handle).unwrap(), (6, 4));
        let natural = loader.decode(&handle).unwrap();
        assert_eq!((natural.width(), natural.height()), (6, 4));
        let scaled = loader.decode_scaled(&handle, 12, 2).unwrap();
        assert_eq!((scaled.width(), scaled.height()), (12, 2));
        assert_eq!(scaled.pixel(5, 1).unwrap(), [9, 8, 7, 255]);
    }

    #[test]
    fn missing_and_corrupt_resources_fail_with_decode_error() {
        let mut loader = MemoryResourceLoader::new();
        loader.insert("bad.png", b"not a png".to_vec());

        for name in ["absent.png", "bad.png"] {
            let handle = ResourceHandle::new(name);
            let err = loader.probe(&handle).unwrap_err();
            assert!(
                matches!(&err, WatermarkError::ResourceDecode { handle, .. } if handle == name),
                "{err}"
            );
            assert!(matches!(
                loader.decode(&handle),
                Err(WatermarkError::ResourceDecode { .. })
            ));
        }

        assert!(matches!(
            NoResources.probe(&ResourceHandle::new("x")),
            Err(WatermarkError::ResourceDecode { .. })
        ));
    }

    #[test]
    fn svg_resources_render_at_target_size() {
        let mut loader = MemoryResourceLoader::new();
        loader.insert(
            "mark.svg",
            br##"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"><rect width="8" height="8" fill="#0000ff"/></svg>"##.to_vec(),
        );
        let handle = ResourceHandle::new("mark.svg");
        assert_eq!(loader.probe(&handle).unwrap(), (8, 8));
        let img = loader.decode_scaled(&handle, 32, 16).unwrap();
        assert_eq!((img.width(), img.height()), (32, 16));
        assert_eq!(img.pixel(16, 8).unwrap(), [0, 0, 255, 255]);
    }
}
