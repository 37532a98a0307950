//! Processing many files with on-disk configuration.

use std::fs;
use std::path::Path;

use klint::config::{TomlPropertySource, CONFIG_FILE_NAME};
use klint::rules::Preset;
use klint::{Code, RuleEngine};
use tempfile::TempDir;

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn engine() -> RuleEngine {
    RuleEngine::builder()
        .preset(Preset::Standard)
        .config_source(TomlPropertySource::default())
        .build()
        .unwrap()
}

#[test]
fn configuration_cascades_per_directory() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("project");
    write(
        &root.join(CONFIG_FILE_NAME),
        "root = true\nmax_line_length = 20\n",
    );
    write(
        &root.join("legacy").join(CONFIG_FILE_NAME),
        "max_line_length = \"off\"\nktlint_standard_no-wildcard-imports = \"disabled\"\n",
    );
    let long = "import a.b.*\n\nval something = \"a long string value\"\n";
    write(&root.join("src").join("Main.kt"), long);
    write(&root.join("legacy").join("Old.kt"), long);

    let engine = engine();
    let codes = vec![
        Code::from_path(root.join("src").join("Main.kt")).unwrap(),
        Code::from_path(root.join("legacy").join("Old.kt")).unwrap(),
    ];
    let result = engine.lint_all(&codes);

    assert_eq!(result.files_checked(), 2);
    let rules: Vec<&str> = result.files[0]
        .violations
        .iter()
        .map(|v| v.rule.as_str())
        .collect();
    assert_eq!(rules, ["standard:no-wildcard-imports", "standard:max-line-length"]);
    assert!(result.files[1].violations.is_empty());
}

#[test]
fn parse_errors_are_reported_per_file() {
    let engine = engine();
    let codes = vec![
        Code::with_path("val a = 1  \n", "A.kt"),
        Code::with_path("fun broken( {\n", "B.kt"),
    ];
    let result = engine.lint_all(&codes);

    assert_eq!(result.files.len(), 2);
    assert_eq!(result.files[0].violations.len(), 1);
    assert!(result.files[0].error.is_none());
    let error = result.files[1].error.as_deref().unwrap();
    assert!(error.starts_with("B.kt: Not a valid Kotlin file ("));
    assert!(result.has_errors());
}

#[test]
fn format_all_keeps_input_order() {
    let engine = engine();
    let codes: Vec<Code> = (0..16)
        .map(|i| Code::with_path(format!("val v{i}  = {i}\n"), format!("F{i}.kt")))
        .collect();
    let result = engine.format_all(&codes);

    for (i, file) in result.files.iter().enumerate() {
        assert_eq!(file.formatted.as_deref(), Some(format!("val v{i} = {i}\n").as_str()));
    }
    assert_eq!(result.count(), (0, 16));
}

#[test]
fn results_serialize_to_json() {
    let engine = engine();
    let result = engine.lint_all(&[Code::with_path("val a = 1  \n", "A.kt")]);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "files": [{
                "path": "A.kt",
                "violations": [{
                    "rule": "standard:no-trailing-spaces",
                    "location": { "line": 1, "column": 10, "offset": 9 },
                    "message": "Trailing space(s)",
                    "can_be_autocorrected": true,
                    "corrected": false
                }],
                "did_not_stabilize": false,
                "partial": false
            }]
        })
    );
}
