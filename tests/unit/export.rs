use super::*;

fn red_frame(w: u32, h: u32) -> Frame {
    Frame {
        width: w,
        height: h,
        data: [255u8, 0, 0, 255].repeat((w * h) as usize),
    }
}

fn decode(bytes: &[u8]) -> image::RgbaImage {
    image::load_from_memory(bytes).unwrap().to_rgba8()
}

#[test]
fn media_type_lookup_is_lenient() {
    assert_eq!(
        ExportFormat::from_media_type("IMAGE/JPEG"),
        Some(ExportFormat::Jpeg)
    );
    assert_eq!(
        ExportFormat::from_media_type("image/png; charset=binary"),
        Some(ExportFormat::Png)
    );
    assert_eq!(ExportFormat::from_media_type("image/heic"), None);
    assert_eq!(ExportFormat::from_media_type(""), None);
}

#[test]
fn png_export_keeps_name_and_pixels() {
    let art = encode_frame(&red_frame(4, 3), "image/png", "pic.png", 92).unwrap();
    assert_eq!(art.media_type, "image/png");
    assert_eq!(art.file_name, "pic.png");
    let img = decode(&art.bytes);
    assert_eq!(img.dimensions(), (4, 3));
    assert_eq!(img.get_pixel(2, 1).0, [255, 0, 0, 255]);
}

#[test]
fn jpeg_export_uses_quality_and_drops_alpha() {
    let frame = red_frame(16, 16);
    let hi = encode_frame(&frame, "image/jpeg", "a.jpg", 95).unwrap();
    assert_eq!(hi.media_type, "image/jpeg");
    let px = decode(&hi.bytes).get_pixel(8, 8).0;
    assert!(px[0] > 240 && px[1] < 20 && px[2] < 20, "{px:?}");
}

#[test]
fn other_lossless_formats_round_trip_dimensions() {
    for (mt, name) in [
        ("image/webp", "a.webp"),
        ("image/bmp", "a.bmp"),
        ("image/gif", "a.gif"),
        ("image/tiff", "a.tiff"),
    ] {
        let art = encode_frame(&red_frame(5, 2), mt, name, 92).unwrap();
        assert_eq!(art.media_type, mt);
        assert_eq!(decode(&art.bytes).dimensions(), (5, 2), "{mt}");
    }
}

#[test]
fn unsupported_media_type_falls_back_to_png() {
    let art = encode_frame(&red_frame(2, 2), "image/heic", "holiday.heic", 92).unwrap();
    assert_eq!(art.media_type, "image/png");
    assert_eq!(art.file_name, "holiday.png");
    assert_eq!(
        image::guess_format(&art.bytes).unwrap(),
        image::ImageFormat::Png
    );
}

#[test]
fn zero_area_frame_is_an_export_error() {
    let empty = Frame {
        width: 0,
        height: 10,
        data: Vec::new(),
    };
    let err = encode_frame(&empty, "image/png", "x.png", 92).unwrap_err();
    assert!(matches!(err, EditorError::Export(_)));
    assert!(err.is_recoverable());
}

#[test]
fn sinks_receive_artifacts() {
    let art = encode_frame(&red_frame(2, 2), "image/png", "x.png", 92).unwrap();

    let mut mem = InMemorySink::new();
    mem.deliver(art.clone()).unwrap();
    assert_eq!(mem.artifacts, vec![art.clone()]);

    let dir = std::env::temp_dir().join(format!("snapedit-export-{}", std::process::id()));
    let mut file = FileSink::new(dir.join("nested").join("out.png"));
    file.deliver(art.clone()).unwrap();
    assert_eq!(std::fs::read(file.path()).unwrap(), art.bytes);
    let _ = std::fs::remove_dir_all(&dir);
}
