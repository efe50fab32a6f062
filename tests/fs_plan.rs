use std::{io::Cursor, sync::Arc};

use watermark::{
    FsResourceLoader, RasterImage, ResourceHandle, ResourceLoader, Rgba8, Watermark,
    WatermarkError, WatermarkPlan,
};

fn temp_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "watermark_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn write_png(path: &std::path::Path, width: u32, height: u32, rgba: [u8; 4]) {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, &buf).unwrap();
}

#[test]
fn fs_loader_probes_and_decodes_relative_paths() {
    let tmp = temp_dir("fs_loader");
    std::fs::create_dir_all(tmp.join("marks")).unwrap();
    write_png(&tmp.join("marks/logo.png"), 5, 3, [1, 2, 3, 255]);

    let loader = FsResourceLoader::new(&tmp);
    let handle = ResourceHandle::new("marks\\logo.png");
    assert_eq!(loader.probe(&handle).unwrap(), (5, 3));
    let img = loader.decode_scaled(&handle, 10, 6).unwrap();
    assert_eq!((img.width(), img.height()), (10, 6));

    for bad in ["marks/missing.png", "../escape.png"] {
        let err = loader.probe(&ResourceHandle::new(bad)).unwrap_err();
        assert!(
            matches!(err, WatermarkError::ResourceDecode { .. }),
            "{bad}: {err}"
        );
    }

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn plan_file_drives_a_full_render() {
    let tmp = temp_dir("plan_render");
    std::fs::create_dir_all(&tmp).unwrap();
    write_png(&tmp.join("logo.png"), 4, 4, [255, 0, 0, 255]);
    std::fs::write(
        tmp.join("badge.svg"),
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="2" height="2"><rect width="2" height="2" fill="#0000ff"/></svg>"##,
    )
    .unwrap();

    let plan_path = tmp.join("plan.json");
    std::fs::write(
        &plan_path,
        serde_json::json!({
            "settings": {"density_scale": 2.0},
            "images": [
                {"resource": "logo.png", "position": {"kind": "left_top", "padding_left": 1, "padding_top": 1}},
                {"resource": "badge.svg", "width": 3, "height": 3, "position": {"kind": "right_bottom"}}
            ]
        })
        .to_string(),
    )
    .unwrap();

    let plan = WatermarkPlan::from_path(&plan_path).unwrap();
    let mut wm = Watermark::from_settings(RasterImage::solid(32, 32, Rgba8::BLACK), &plan.settings)
        .unwrap()
        .with_loader(Arc::new(FsResourceLoader::new(&tmp)));
    plan.apply(&mut wm).unwrap();
    wm.render().unwrap();

    let out = wm.result();
    // logo: 4x4 dp -> 8x8 px at padding (2, 2).
    assert_eq!(out.pixel(2, 2).unwrap(), [255, 0, 0, 255]);
    assert_eq!(out.pixel(9, 9).unwrap(), [255, 0, 0, 255]);
    assert_eq!(out.pixel(10, 10).unwrap(), [0, 0, 0, 255]);
    // badge: 3x3 dp -> 6x6 px in the bottom-right corner.
    assert_eq!(out.pixel(27, 27).unwrap(), [0, 0, 255, 255]);
    assert_eq!(out.pixel(30, 30).unwrap(), [0, 0, 255, 255]);
    assert_eq!(out.pixel(25, 31).unwrap(), [0, 0, 0, 255]);

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn missing_plan_file_reports_path() {
    let err = WatermarkPlan::from_path("/nonexistent/plan.json").unwrap_err();
    assert!(err.to_string().contains("/nonexistent/plan.json"));
}
