use super::*;

#[test]
fn hex_colors_parse_in_all_supported_lengths() {
    assert_eq!(Rgba8::parse_hex("#fff").unwrap(), Rgba8::WHITE);
    assert_eq!(Rgba8::parse_hex("#102030").unwrap(), Rgba8::rgb(16, 32, 48));
    assert_eq!(
        Rgba8::parse_hex("10203080").unwrap(),
        Rgba8::new(16, 32, 48, 128)
    );
    assert!(Rgba8::parse_hex("#12345").is_err());
    assert!(Rgba8::parse_hex("#zzzzzz").is_err());
}

#[test]
fn colors_serialize_as_hex_strings() {
    let json = serde_json::to_string(&Rgba8::new(255, 0, 16, 128)).unwrap();
    assert_eq!(json, "\"#ff001080\"");
    let back: Rgba8 = serde_json::from_str(&json).unwrap();
    assert_eq!(back, Rgba8::new(255, 0, 16, 128));
}

#[test]
fn background_accepts_transparent_keyword() {
    let bg: Background = serde_json::from_str("\"Transparent\"").unwrap();
    assert_eq!(bg, Background::Transparent);
    let bg: Background = serde_json::from_str("\"#000000\"").unwrap();
    assert_eq!(bg, Background::Solid(Rgba8::BLACK));
}

#[test]
fn viewport_subtracts_surface_origin() {
    let vp = Viewport::new(400, 300).with_origin(Point::new(20.0, 60.0));
    assert_eq!(vp.to_surface(Point::new(220.0, 210.0)), Point::new(200.0, 150.0));
    assert_eq!(vp.size.center(), Point::new(200.0, 150.0));
}

#[test]
fn surface_size_emptiness_and_bounds() {
    assert!(SurfaceSize::new(0, 10).is_empty());
    assert!(SurfaceSize::new(10, 0).is_empty());
    let s = SurfaceSize::new(4, 3);
    assert!(!s.is_empty());
    assert!(s.contains(Point::new(0.0, 0.0)));
    assert!(!s.contains(Point::new(4.0, 1.0)));
    assert!(!s.contains(Point::new(-0.5, 1.0)));
}
