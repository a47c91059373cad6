use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(EditorError::load("x").to_string().contains("load error:"));
    assert!(EditorError::export("x").to_string().contains("export error:"));
    assert!(EditorError::render("x").to_string().contains("render error:"));
    assert!(EditorError::config("x").to_string().contains("config error:"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = EditorError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn only_load_failures_are_fatal_for_the_session() {
    assert!(!EditorError::load("bad bytes").is_recoverable());
    assert!(EditorError::export("empty surface").is_recoverable());
    assert!(EditorError::render("size mismatch").is_recoverable());
}
