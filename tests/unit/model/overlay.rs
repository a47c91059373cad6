use super::*;

fn center() -> Point {
    Point::new(200.0, 150.0)
}

fn texts(store: &OverlayStore) -> Vec<&str> {
    store.iter().map(|o| o.text.as_str()).collect()
}

#[test]
fn add_rejects_blank_text() {
    let mut store = OverlayStore::new();
    assert_eq!(store.add("", TextStyle::default(), center()), None);
    assert_eq!(store.add("  \t\n", TextStyle::default(), center()), None);
    assert!(store.is_empty());
}

#[test]
fn add_appends_on_top_at_requested_point() {
    let mut store = OverlayStore::new();
    let a = store.add("A", TextStyle::default(), center()).unwrap();
    let b = store.add("B", TextStyle::default(), center()).unwrap();
    assert!(b > a);
    assert_eq!(texts(&store), vec!["A", "B"]);
    assert_eq!(store.get(b).unwrap().position, center());
    assert_eq!(store.iter_topmost_first().next().unwrap().id, b);
}

#[test]
fn removing_middle_overlay_preserves_order_and_ids() {
    let mut store = OverlayStore::new();
    let a = store.add("A", TextStyle::default(), center()).unwrap();
    let b = store.add("B", TextStyle::default(), center()).unwrap();
    let c = store.add("C", TextStyle::default(), center()).unwrap();

    let removed = store.remove(b).unwrap();
    assert_eq!(removed.text, "B");
    assert_eq!(texts(&store), vec!["A", "C"]);
    assert_eq!(store.get(a).unwrap().id, a);
    assert_eq!(store.get(c).unwrap().id, c);
    assert!(store.remove(b).is_none());
}

#[test]
fn ids_are_not_reused_after_reset() {
    let mut store = OverlayStore::new();
    let a = store.add("A", TextStyle::default(), center()).unwrap();
    store.reset();
    assert!(store.is_empty());
    let b = store.add("B", TextStyle::default(), center()).unwrap();
    assert!(b > a);
}

#[test]
fn update_touches_only_the_matching_overlay() {
    let mut store = OverlayStore::new();
    let a = store.add("A", TextStyle::default(), center()).unwrap();
    let b = store.add("B", TextStyle::default(), center()).unwrap();

    let patch = OverlayPatch {
        text: Some("Bee".to_string()),
        size_px: Some(0),
        bold: Some(true),
        background: Some(Background::Solid(Rgba8::BLACK)),
        ..OverlayPatch::default()
    };
    assert!(store.update(b, &patch));

    let ob = store.get(b).unwrap();
    assert_eq!(ob.text, "Bee");
    assert_eq!(ob.style.size_px, 1);
    assert!(ob.style.bold);
    assert_eq!(store.get(a).unwrap().style, TextStyle::default());

    assert!(!store.update(OverlayId(999), &patch));
    assert!(!store.update(b, &patch));
}

#[test]
fn blank_text_patch_keeps_existing_text() {
    let mut store = OverlayStore::new();
    let a = store.add("keep", TextStyle::default(), center()).unwrap();
    let patch = OverlayPatch {
        text: Some("   ".to_string()),
        ..OverlayPatch::default()
    };
    assert!(!store.update(a, &patch));
    assert_eq!(store.get(a).unwrap().text, "keep");
}

#[test]
fn translate_moves_by_delta() {
    let mut store = OverlayStore::new();
    let a = store.add("A", TextStyle::default(), center()).unwrap();
    assert!(store.translate(a, Vec2::new(50.0, 0.0)));
    assert_eq!(store.get(a).unwrap().position, Point::new(250.0, 150.0));
    assert!(!store.translate(OverlayId(42), Vec2::new(1.0, 1.0)));
}

#[test]
fn patch_deserializes_from_partial_json() {
    let patch: OverlayPatch =
        serde_json::from_str(r##"{ "color": "#ff0000", "italic": true }"##).unwrap();
    assert_eq!(patch.color, Some(Rgba8::rgb(255, 0, 0)));
    assert_eq!(patch.italic, Some(true));
    assert!(patch.text.is_none());
}

#[test]
fn font_size_is_capped_on_add_and_update() {
    let mut store = OverlayStore::new();
    let huge = TextStyle {
        size_px: 4_000_000_000,
        ..TextStyle::default()
    };
    let id = store.add("Big", huge, center()).unwrap();
    assert_eq!(store.get(id).unwrap().style.size_px, MAX_FONT_SIZE_PX);

    let shrink = OverlayPatch {
        size_px: Some(48),
        ..OverlayPatch::default()
    };
    assert!(store.update(id, &shrink));
    let grow = OverlayPatch {
        size_px: Some(u32::MAX),
        ..OverlayPatch::default()
    };
    assert!(store.update(id, &grow));
    assert_eq!(store.get(id).unwrap().style.size_px, MAX_FONT_SIZE_PX);
}
