//! Tests for diff module - unified diff generation.

use omni_rewrite::generate_unified_diff;

#[test]
fn test_simple_diff() {
    let old = "line1\nline2\nline3\n";
    let new = "line1\nmodified\nline3\n";

    let diff = generate_unified_diff(old, new, "src/app.py");

    assert!(diff.contains("--- a/src/app.py"));
    assert!(diff.contains("+++ b/src/app.py"));
    assert!(diff.contains("-line2"));
    assert!(diff.contains("+modified"));
}

#[test]
fn test_no_changes() {
    let content = "same content\n";
    assert!(generate_unified_diff(content, content, "a.py").is_empty());
}

#[test]
fn test_addition_only() {
    let diff = generate_unified_diff("", "new line\n", "a.py");

    assert!(diff.contains("+new line"));
    assert!(!diff.contains("-new line"));
}

#[test]
fn test_context_is_three_lines() {
    let old: String = (1..=20).map(|i| format!("l{i}\n")).collect();
    let new = old.replace("l10\n", "changed\n");

    let diff = generate_unified_diff(&old, &new, "a.py");

    assert!(diff.contains(" l7\n"));
    assert!(diff.contains(" l13\n"));
    assert!(!diff.contains(" l6\n"));
    assert!(!diff.contains(" l14\n"));
}
