use std::io::Cursor;

use super::*;

fn png_bytes(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn file(media_type: &str, bytes: Vec<u8>) -> ImageFile {
    ImageFile {
        name: "pic.png".to_string(),
        media_type: media_type.to_string(),
        bytes,
    }
}

#[test]
fn decode_png_dimensions_and_premul() {
    let src = file("image/png", png_bytes(3, 2, [100, 50, 200, 128]));
    let img = decode_image(&src).unwrap();
    assert_eq!(img.size(), SurfaceSize::new(3, 2));
    assert_eq!(img.media_type, "image/png");
    assert_eq!(img.rgba8_premul.len(), 3 * 2 * 4);
    assert_eq!(
        &img.rgba8_premul[..4],
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn wrong_media_type_falls_back_to_sniffing() {
    let src = file("image/jpeg", png_bytes(1, 1, [1, 2, 3, 255]));
    let img = decode_image(&src).unwrap();
    assert_eq!(img.width, 1);

    let unknown = file("", png_bytes(2, 2, [1, 2, 3, 255]));
    assert_eq!(decode_image(&unknown).unwrap().height, 2);
}

fn jpeg_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(w, h, image::Rgb([40, 90, 160]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .unwrap();
    buf
}

#[test]
fn unknown_media_type_records_the_sniffed_format() {
    let img = decode_image(&file("", jpeg_bytes(4, 3))).unwrap();
    assert_eq!(img.media_type, "image/jpeg");

    let img = decode_image(&file("application/octet-stream", png_bytes(1, 1, [0; 4]))).unwrap();
    assert_eq!(img.media_type, "image/png");

    // A recognized declaration is kept even when the bytes disagree.
    let img = decode_image(&file("image/jpeg", png_bytes(1, 1, [0; 4]))).unwrap();
    assert_eq!(img.media_type, "image/jpeg");
}

#[test]
fn garbage_bytes_are_a_load_error() {
    let err = decode_image(&file("image/png", b"not an image".to_vec())).unwrap_err();
    assert!(matches!(err, EditorError::Load(_)));
    assert!(!err.is_recoverable());
}

#[test]
fn from_path_reads_name_and_media_type() {
    let dir = std::env::temp_dir().join(format!("snapedit-decode-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("tiny.png");
    std::fs::write(&path, png_bytes(1, 1, [0, 0, 0, 255])).unwrap();

    let f = ImageFile::from_path(&path).unwrap();
    assert_eq!(f.name, "tiny.png");
    assert_eq!(f.media_type, "image/png");

    assert!(ImageFile::from_path(&dir.join("missing.png")).is_err());
    let _ = std::fs::remove_dir_all(&dir);
}
