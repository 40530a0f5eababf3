//! Tests for engine module - selection, matching, conflicts and application.

use std::fs;

use tempfile::TempDir;

use omni_rewrite::{
    EngineConfig, RewriteEngine, RewriteError, RewriteRule, RuleSet, SelectionStrategy,
    SupportLang,
};

const RULES: &str = r#"
[[rule]]
name = "python/len-zero"
language = "python"
patterns = ["len($X) == 0", "0 == len($X)"]
rewrite = "not $X"

[[rule]]
name = "python/len-count"
language = "python"
pattern = "len($X)"
rewrite = "count($X)"

[[rule]]
name = "python/old-func"
language = "python"
pattern = "old_func($$$ARGS)"
rewrite = "new_func($$$ARGS)"

[[rule]]
name = "rust/old-func"
language = "rust"
pattern = "old_func($$$ARGS)"
rewrite = "new_func($$$ARGS)"
"#;

fn engine_with(config: EngineConfig) -> RewriteEngine {
    let rules = RuleSet::from_toml_str(RULES).expect("valid rules");
    RewriteEngine::new(rules, config).expect("engine")
}

fn engine() -> RewriteEngine {
    engine_with(EngineConfig::default())
}

fn names(engine: &RewriteEngine, content: &str, lang: SupportLang) -> Vec<String> {
    engine
        .candidates(content, lang)
        .into_iter()
        .map(|rule| rule.name().to_string())
        .collect()
}

#[test]
fn test_candidates_require_all_identifiers() {
    let engine = engine();

    assert_eq!(
        names(&engine, "if len(items) == 0:\n    pass\n", SupportLang::Python),
        vec!["python/len-zero", "python/len-count"]
    );
    // `0` is missing, so only the plain len rule remains.
    assert_eq!(
        names(&engine, "n = len(items)\n", SupportLang::Python),
        vec!["python/len-count"]
    );
    assert!(names(&engine, "x = 1 + 2\n", SupportLang::Python).is_empty());
}

#[test]
fn test_candidates_are_per_language() {
    let engine = engine();
    assert_eq!(
        names(&engine, "fn main() { old_func(1); }", SupportLang::Rust),
        vec!["rust/old-func"]
    );
    assert!(names(&engine, "old_func(1)", SupportLang::Go).is_empty());
}

#[test]
fn test_larger_match_wins_conflict() {
    let result = engine()
        .rewrite("if len(items) == 0:\n    pass\n", SupportLang::Python)
        .expect("rewrite");

    assert_eq!(result.modified, "if not items:\n    pass\n");
    assert_eq!(result.count(), 1);
    assert_eq!(result.rejected, 1);
    assert_eq!(result.edits[0].rule, "python/len-zero");
    assert_eq!(result.edits[0].line, 1);
    assert_eq!(result.edits[0].column, 4);
}

#[test]
fn test_multiple_edits_in_source_order() {
    let content = "def foo():\n    old_func(a, b)\n    n = len(xs)\n";
    let result = engine().rewrite(content, SupportLang::Python).expect("rewrite");

    assert_eq!(
        result.modified,
        "def foo():\n    new_func(a, b)\n    n = count(xs)\n"
    );
    assert_eq!(result.count(), 2);
    assert_eq!(result.rejected, 0);
    assert_eq!(result.edits[0].line, 2);
    assert_eq!(result.edits[1].line, 3);
    assert_eq!(result.edits[1].original_text, "len(xs)");
    assert_eq!(result.edits[1].new_text, "count(xs)");
    assert!(result.diff.contains("+    new_func(a, b)"));
}

#[test]
fn test_nested_matches_of_one_rule() {
    let result = engine()
        .rewrite("x = len(len(y))\n", SupportLang::Python)
        .expect("rewrite");

    // One pass: the outer match claims the range, the inner one is dropped.
    assert_eq!(result.modified, "x = count(len(y))\n");
    assert_eq!(result.rejected, 1);
}

#[test]
fn test_no_match_is_unchanged() {
    let content = "items = []\n";
    let result = engine().rewrite(content, SupportLang::Python).expect("rewrite");

    assert!(result.is_unchanged());
    assert_eq!(result.count(), 0);
    assert!(result.diff.is_empty());
    assert!(result.summary(None).contains("[No matches found]"));
}

#[test]
fn test_candidate_without_match() {
    // Identifiers present, structure absent.
    let result = engine()
        .rewrite("# len is a builtin\n", SupportLang::Python)
        .expect("rewrite");
    assert!(result.is_unchanged());
}

#[test]
fn test_exhaustive_selection_agrees() {
    let indexed = engine();
    let exhaustive = engine_with(EngineConfig {
        selection: SelectionStrategy::Exhaustive,
        ..Default::default()
    });

    let samples = [
        "if len(items) == 0:\n    pass\n",
        "if 0 == len(items):\n    old_func()\n",
        "n = len(xs)\nold_func(n, 2)\n",
        "print('nothing to see')\n",
    ];
    for sample in samples {
        assert_eq!(
            names(&indexed, sample, SupportLang::Python),
            names(&exhaustive, sample, SupportLang::Python)
        );
        assert_eq!(
            indexed.rewrite(sample, SupportLang::Python).expect("rewrite").modified,
            exhaustive.rewrite(sample, SupportLang::Python).expect("rewrite").modified
        );
    }
}

#[test]
fn test_rule_filter() {
    let engine = engine_with(EngineConfig {
        rule_filter: Some("python/len-.*".to_string()),
        ..Default::default()
    });

    assert_eq!(engine.rule_count(), 2);
    assert!(!engine.has_rules_for(SupportLang::Rust));
    assert!(names(&engine, "old_func(1)", SupportLang::Python).is_empty());
}

#[test]
fn test_rule_filter_matches_whole_name() {
    let engine = engine_with(EngineConfig {
        rule_filter: Some("python/len|python/len-zero".to_string()),
        ..Default::default()
    });

    assert_eq!(engine.rule_count(), 1);
    let result = engine
        .rewrite("if len(items) == 0:\n    pass\n", SupportLang::Python)
        .expect("rewrite");
    assert_eq!(result.modified, "if not items:\n    pass\n");
}

#[test]
fn test_rule_built_in_code() {
    let mut rules = RuleSet::new();
    rules
        .push(RewriteRule::new("print-to-log", "python", ["print($ARG)"], "log.info($ARG)").expect("rule"))
        .expect("push");
    let engine = RewriteEngine::new(rules, EngineConfig::default()).expect("engine");

    let result = engine
        .rewrite("print('a')\nprint('b')\n", SupportLang::Python)
        .expect("rewrite");
    assert_eq!(result.modified, "log.info('a')\nlog.info('b')\n");
}

#[test]
fn test_rewrite_file_dry_run() {
    let dir = TempDir::new().expect("Create temp dir");
    let file = dir.path().join("app.py");
    fs::write(&file, "old_func(a)\n").expect("Write file");

    let result = engine().rewrite_file(&file, None).expect("rewrite");

    assert_eq!(result.modified, "new_func(a)\n");
    assert!(result.diff.contains("app.py"));
    assert_eq!(fs::read_to_string(&file).expect("Read file"), "old_func(a)\n");
}

#[test]
fn test_rewrite_file_writes_back() {
    let dir = TempDir::new().expect("Create temp dir");
    let file = dir.path().join("script.txt");
    fs::write(&file, "old_func(a)\n").expect("Write file");

    let engine = engine_with(EngineConfig {
        dry_run: false,
        ..Default::default()
    });
    let result = engine.rewrite_file(&file, Some("python")).expect("rewrite");

    assert_eq!(result.count(), 1);
    assert_eq!(fs::read_to_string(&file).expect("Read file"), "new_func(a)\n");
}

#[test]
fn test_rewrite_file_too_large() {
    let dir = TempDir::new().expect("Create temp dir");
    let file = dir.path().join("big.py");
    fs::write(&file, "old_func(a)\n".repeat(10)).expect("Write file");

    let engine = engine_with(EngineConfig {
        max_file_size: 16,
        ..Default::default()
    });

    assert!(matches!(
        engine.rewrite_file(&file, None),
        Err(RewriteError::FileTooLarge { limit: 16, .. })
    ));
}

#[test]
fn test_rewrite_file_unknown_language() {
    let dir = TempDir::new().expect("Create temp dir");
    let file = dir.path().join("notes.unknownext");
    fs::write(&file, "old_func(a)\n").expect("Write file");

    assert!(matches!(
        engine().rewrite_file(&file, None),
        Err(RewriteError::UnsupportedLanguage(_))
    ));
}

#[test]
fn test_engine_shared_across_threads() {
    let engine = engine();
    let inputs = ["old_func(1)\n", "n = len(a)\n", "if len(b) == 0: pass\n"];

    let outputs: Vec<String> = std::thread::scope(|s| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|input| {
                let engine = &engine;
                s.spawn(move || engine.rewrite(input, SupportLang::Python).expect("rewrite").modified)
            })
            .collect();
        handles.into_iter().map(|h| h.join().expect("join")).collect()
    });

    assert_eq!(outputs, vec!["new_func(1)\n", "n = count(a)\n", "if not b: pass\n"]);
}
