use super::*;

fn fixture_font() -> Vec<u8> {
    std::fs::read("tests/data/fonts/DejaVuSansMono.ttf").unwrap()
}

#[test]
fn empty_book_shapes_nothing() {
    let mut book = FontBook::new();
    assert!(!book.has_fonts());
    assert!(book.shape("Hello", "sans-serif", 32).is_none());
}

#[test]
fn garbage_bytes_are_rejected() {
    let mut book = FontBook::new();
    let err = book.register(b"definitely not a font".to_vec()).unwrap_err();
    assert!(matches!(err, EditorError::Config(_)));
    assert!(!book.has_fonts());
}

#[test]
fn registered_font_shapes_and_caches() {
    let bytes = fixture_font();
    let mut book = FontBook::new();
    let family = book.register(bytes.clone()).unwrap();
    assert_eq!(book.family_names(), vec![family.as_str()]);

    // Registering the same family twice keeps one entry.
    book.register(bytes).unwrap();
    assert_eq!(book.family_names().len(), 1);

    let a = book.shape("Hello", "no-such-family", 32).unwrap();
    assert!(a.width() > 0.0);
    assert!(a.height() > 0.0);
    assert_eq!(a.glyphs().len(), 5);

    let b = book.shape("Hello", &family.to_lowercase(), 32).unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    let bigger = book.shape("Hello", &family, 64).unwrap();
    assert!(bigger.width() > a.width());
}

#[test]
fn cache_is_keyed_by_text_and_size() {
    let mut book = FontBook::new();
    book.register(fixture_font()).unwrap();
    let a = book.shape("abc", "", 20).unwrap();
    let b = book.shape("abcd", "", 20).unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(b.glyphs().len(), 4);
    // Monospace: one more glyph is one more advance.
    let advance = b.width() - a.width();
    assert!((advance - a.width() / 3.0).abs() < 0.5, "advance {advance}");
    assert!(Arc::ptr_eq(&a, &book.shape("abc", "", 20).unwrap()));
}
