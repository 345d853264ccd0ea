use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use refdoc_config::{Config, ConfigError, ConfigSourceKind, LoadOptions};
use tempfile::TempDir;

fn write_file(path: impl AsRef<Path>, contents: &str) {
    let mut file = fs::File::create(path).expect("create config");
    file.write_all(contents.as_bytes()).expect("write config");
}

fn canonical(path: impl AsRef<Path>) -> PathBuf {
    fs::canonicalize(path).expect("canonicalize path")
}

#[test]
fn loads_defaults_when_no_files_present() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());

    let config = Config::load(LoadOptions::default().with_working_dir(working_dir.clone()))
        .expect("load defaults");

    assert_eq!(config.generator.package, None);
    assert!(config.generator.types.is_empty());
    assert_eq!(config.generator.out_file, None);
    assert_eq!(config.model.root, working_dir.join("."));
    assert_eq!(config.display.directive_namespace, "reference-gen");
    assert_eq!(
        config.display.aliases,
        BTreeMap::from([("time.Duration".to_owned(), "duration".to_owned())])
    );
    assert_eq!(config.sources.layers.len(), 1);
    assert_eq!(config.sources.layers[0].kind, ConfigSourceKind::Default);
}

#[test]
fn applies_precedence_and_merges_fields() {
    let temp = TempDir::new().expect("tempdir");
    let git_root = canonical(temp.path());
    fs::create_dir(git_root.join(".git")).expect("create .git");

    write_file(
        git_root.join(".refdoc.toml"),
        r#"
        [generator]
        package = "github.com/example/root"
        types = ["RootType"]
        header_file = "docs/header.md"

        [model]
        root = "models"

        [display.aliases]
        "k8s.io/apimachinery/pkg/apis/meta/v1.Duration" = "duration"
        "#,
    );

    let workspace = git_root.join("workspace");
    fs::create_dir(&workspace).expect("create workspace");

    write_file(
        workspace.join(".refdoc.toml"),
        r#"
        [generator]
        package = "github.com/example/workspace"
        out_file = "reference.md"

        [display.aliases]
        "time.Duration" = "Duration"
        "#,
    );

    let override_path = workspace.join("override.toml");
    write_file(
        &override_path,
        r#"
        [generator]
        types = ["Options", "Upstream"]

        [display]
        directive_namespace = "docs-gen"
        "#,
    );

    let config = Config::load(
        LoadOptions::default()
            .with_working_dir(&workspace)
            .with_override_path("override.toml"),
    )
    .expect("load layered config");

    assert_eq!(
        config.generator.package.as_deref(),
        Some("github.com/example/workspace")
    );
    assert_eq!(config.generator.types, vec!["Options", "Upstream"]);
    assert_eq!(
        config.generator.header_file,
        Some(git_root.join("docs/header.md"))
    );
    assert_eq!(config.generator.out_file, Some(workspace.join("reference.md")));
    assert_eq!(config.model.root, git_root.join("models"));
    assert_eq!(config.display.directive_namespace, "docs-gen");
    assert_eq!(
        config.display.aliases,
        BTreeMap::from([
            (
                "k8s.io/apimachinery/pkg/apis/meta/v1.Duration".to_owned(),
                "duration".to_owned()
            ),
            ("time.Duration".to_owned(), "Duration".to_owned()),
        ])
    );

    let kinds: Vec<_> = config.sources.layers.iter().map(|layer| layer.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ConfigSourceKind::Default,
            ConfigSourceKind::GitRoot,
            ConfigSourceKind::Local,
            ConfigSourceKind::Override,
        ]
    );
}

#[test]
fn missing_override_is_reported() {
    let temp = TempDir::new().expect("tempdir");
    let err = Config::load(
        LoadOptions::default()
            .with_working_dir(temp.path())
            .with_override_path("missing.toml"),
    )
    .expect_err("override missing");
    assert!(matches!(err, ConfigError::OverrideNotFound { .. }));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let temp = TempDir::new().expect("tempdir");
    write_file(temp.path().join(".refdoc.toml"), "[generator\npackage = 1");
    let err = Config::load(LoadOptions::default().with_working_dir(temp.path()))
        .expect_err("parse fails");
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn validation_errors_are_collected() {
    let temp = TempDir::new().expect("tempdir");
    write_file(
        temp.path().join(".refdoc.toml"),
        r#"
        [generator]
        package = ""
        types = ["Good", " "]

        [display]
        directive_namespace = "has space"
        "#,
    );
    let err = Config::load(LoadOptions::default().with_working_dir(temp.path()))
        .expect_err("validation fails");
    match err {
        ConfigError::Validation(errors) => {
            let contexts: Vec<_> = errors
                .iter()
                .filter_map(|err| err.context.clone())
                .collect();
            assert_eq!(
                contexts,
                vec![
                    "generator.package".to_owned(),
                    "generator.types".to_owned(),
                    "display.directive_namespace".to_owned(),
                ]
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}
