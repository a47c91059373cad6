use std::io::Cursor;
use std::time::Duration;

use super::*;
use crate::foundation::core::{Point, Vec2};

fn png_file(w: u32, h: u32, px: [u8; 4]) -> ImageFile {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    ImageFile {
        name: "photo.png".to_string(),
        media_type: "image/png".to_string(),
        bytes,
    }
}

fn open(w: u32, h: u32) -> EditorSession {
    EditorSession::open(
        &png_file(8, 6, [200, 30, 30, 255]),
        Viewport::new(w, h),
        EditorConfig::default(),
    )
    .unwrap()
}

#[test]
fn open_draws_the_first_frame() {
    let s = open(40, 30);
    assert_eq!(s.frames_drawn(), 1);
    assert_eq!(s.frame().width, 40);
    assert_eq!(s.redraw_deadline(), None);
}

#[test]
fn open_rejects_undecodable_input_and_bad_config() {
    let bad = ImageFile {
        name: "x.png".to_string(),
        media_type: "image/png".to_string(),
        bytes: vec![1, 2, 3],
    };
    let err =
        EditorSession::open(&bad, Viewport::new(10, 10), EditorConfig::default()).unwrap_err();
    assert!(matches!(err, EditorError::Load(_)));

    let cfg = EditorConfig {
        export_quality: 0,
        ..EditorConfig::default()
    };
    let err = EditorSession::open(&png_file(1, 1, [0; 4]), Viewport::new(10, 10), cfg).unwrap_err();
    assert!(matches!(err, EditorError::Config(_)));
}

#[test]
fn commands_report_changes_and_schedule_redraws() {
    let mut s = open(40, 30);
    let t0 = Instant::now();

    assert_eq!(
        s.apply(EditCommand::ScaleBy { delta: 0.5 }, t0),
        CommandOutcome::Changed
    );
    assert_eq!(s.redraw_deadline(), Some(t0 + Duration::from_millis(30)));

    assert_eq!(
        s.apply(EditCommand::SetBrightness { value: 100 }, t0),
        CommandOutcome::Unchanged
    );
    assert_eq!(
        s.apply(EditCommand::SetContrast { value: 500 }, t0),
        CommandOutcome::Changed
    );
    assert_eq!(s.filters().contrast_pct(), 200);
    assert_eq!(
        s.apply(EditCommand::RemoveOverlay { id: OverlayId(42) }, t0),
        CommandOutcome::Unchanged
    );
    assert_eq!(
        s.apply(
            EditCommand::AddText {
                text: "   ".to_string(),
                style: TextStyle::default()
            },
            t0
        ),
        CommandOutcome::Unchanged
    );
}

#[test]
fn add_text_lands_at_the_surface_center() {
    let mut s = open(400, 300);
    let outcome = s.apply(
        EditCommand::AddText {
            text: "Hello".to_string(),
            style: TextStyle::default(),
        },
        Instant::now(),
    );
    let CommandOutcome::Added(id) = outcome else {
        panic!("expected Added, got {outcome:?}");
    };
    assert_eq!(s.overlays().get(id).unwrap().position, Point::new(200.0, 150.0));
}

#[test]
fn poll_redraw_draws_once_when_due() {
    let mut s = open(40, 30);
    let t0 = Instant::now();
    s.apply(EditCommand::SetSaturation { value: 0 }, t0);
    s.apply(EditCommand::SetRotation { degrees: 45.0 }, t0 + Duration::from_millis(10));

    assert_eq!(s.poll_redraw(t0 + Duration::from_millis(20)).unwrap(), None);
    assert_eq!(
        s.poll_redraw(t0 + Duration::from_millis(40)).unwrap(),
        Some(RenderOutcome::Drawn)
    );
    assert_eq!(s.frames_drawn(), 2);
    assert_eq!(s.poll_redraw(t0 + Duration::from_millis(80)).unwrap(), None);
}

#[test]
fn stale_host_timer_is_ignored() {
    let mut s = open(40, 30);
    let t0 = Instant::now();
    s.apply(EditCommand::Pan { dx: 5.0, dy: 0.0 }, t0);
    let old = s.last_redraw_ticket().unwrap();
    s.apply(EditCommand::Pan { dx: 5.0, dy: 0.0 }, t0 + Duration::from_millis(5));
    let new = s.last_redraw_ticket().unwrap();

    assert_eq!(s.fire_redraw(old, t0 + Duration::from_millis(60)).unwrap(), None);
    assert_eq!(
        s.fire_redraw(new, t0 + Duration::from_millis(60)).unwrap(),
        Some(RenderOutcome::Drawn)
    );
}

#[test]
fn pointer_events_use_surface_local_coordinates() {
    let mut s = open(400, 300);
    let t0 = Instant::now();
    s.resize(Viewport::new(400, 300).with_origin(Point::new(100.0, 50.0)), t0);
    let id = match s.apply(
        EditCommand::AddText {
            text: "Hello".to_string(),
            style: TextStyle::default(),
        },
        t0,
    ) {
        CommandOutcome::Added(id) => id,
        other => panic!("unexpected {other:?}"),
    };

    // Surface point (200, 150) is screen point (300, 200).
    assert!(s.pointer(PointerEvent::down(300.0, 200.0), t0));
    assert_eq!(s.drag_target(), Some(DragTarget::Overlay(id)));
    s.pointer(PointerEvent::moved(310.0, 205.0), t0);
    s.pointer(PointerEvent::up(310.0, 205.0), t0);
    assert_eq!(s.overlays().get(id).unwrap().position, Point::new(210.0, 155.0));
    assert_eq!(s.drag_target(), None);
    assert!(!s.pointer(PointerEvent::moved(0.0, 0.0), t0));
}

#[test]
fn reset_all_restores_defaults() {
    let mut s = open(40, 30);
    let t0 = Instant::now();
    s.apply(EditCommand::ScaleBy { delta: 1.0 }, t0);
    s.apply(EditCommand::Pan { dx: 3.0, dy: 4.0 }, t0);
    s.apply(EditCommand::SetBrightness { value: 20 }, t0);
    s.apply(
        EditCommand::AddText {
            text: "x".to_string(),
            style: TextStyle::default(),
        },
        t0,
    );
    s.pointer(PointerEvent::down(1.0, 1.0), t0);

    assert_eq!(s.apply(EditCommand::ResetAll, t0), CommandOutcome::Changed);
    assert!(s.transform().is_identity());
    assert_eq!(s.transform().pan_offset(), Vec2::ZERO);
    assert!(s.filters().is_neutral());
    assert!(s.overlays().is_empty());
    assert_eq!(s.drag_target(), None);
    assert_eq!(s.apply(EditCommand::ResetAll, t0), CommandOutcome::Unchanged);
}

#[test]
fn save_bypasses_the_throttle() {
    let mut s = open(40, 30);
    let t0 = Instant::now();
    s.apply(EditCommand::SetBrightness { value: 0 }, t0);
    assert!(s.redraw_deadline().is_some());

    let art = s.save().unwrap();
    assert_eq!(s.redraw_deadline(), None);
    assert_eq!(art.file_name, "photo.png");
    assert_eq!(art.media_type, "image/png");
    let px = image::load_from_memory(&art.bytes)
        .unwrap()
        .to_rgba8()
        .get_pixel(20, 15)
        .0;
    assert_eq!(px, [0, 0, 0, 255]);
}

#[test]
fn save_with_zero_area_fails_and_session_survives() {
    let mut s = open(0, 0);
    let err = s.save().unwrap_err();
    assert!(matches!(err, EditorError::Export(_)));

    s.resize(Viewport::new(10, 10), Instant::now());
    let mut sink = crate::export::InMemorySink::new();
    s.save_to(&mut sink).unwrap();
    assert_eq!(sink.artifacts.len(), 1);
}

#[test]
fn snapshot_serializes_state() {
    let mut s = open(40, 30);
    s.apply(EditCommand::SetRotation { degrees: -30.0 }, Instant::now());
    let json = serde_json::to_value(s.snapshot()).unwrap();
    assert_eq!(json["source_name"], "photo.png");
    assert_eq!(json["transform"]["rotation_deg"], -30.0);
    assert_eq!(json["filters"]["brightness_pct"], 100);
    s.cancel();
}

#[test]
fn edit_commands_parse_from_json() {
    let cmds: Vec<EditCommand> = serde_json::from_str(
        r##"[
            {"op": "scale_by", "delta": 0.2},
            {"op": "add_text", "text": "Hi", "style": {"color": "#ff0000", "bold": true}},
            {"op": "update_overlay", "id": 1, "patch": {"background": "transparent"}},
            {"op": "reset_all"}
        ]"##,
    )
    .unwrap();
    assert_eq!(cmds[0], EditCommand::ScaleBy { delta: 0.2 });
    let EditCommand::AddText { style, .. } = &cmds[1] else {
        panic!("expected add_text");
    };
    assert!(style.bold);
    assert_eq!(style.size_px, 32);
    assert_eq!(cmds[3], EditCommand::ResetAll);
}
