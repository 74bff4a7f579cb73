// tests/integration/error_handling.rs

use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use incbuild::config::load_and_validate;
use incbuild::errors::IncbuildError;
use incbuild::types::{HashStorageMode, UnitRole};

fn descriptor(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn config_error(contents: &str) -> String {
    let file = descriptor(contents);
    match load_and_validate(file.path()) {
        Err(IncbuildError::ConfigError(msg)) => msg,
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_association_returns_config_error() {
    let msg = config_error(
        r#"
[unit.ShapeTest]
source = "ShapeTest.java"
association = "Shape"
"#,
    );
    assert!(msg.contains("unknown association 'Shape'"), "{msg}");
}

#[test]
fn test_self_association_is_rejected() {
    let msg = config_error(
        r#"
[unit.Shape]
source = "Shape.java"
association = "Shape"
"#,
    );
    assert!(msg.contains("cannot be associated with itself"), "{msg}");
}

#[test]
fn test_shared_source_is_rejected() {
    let msg = config_error(
        r#"
[unit.A]
source = "Both.java"

[unit.B]
source = "Both.java"
"#,
    );
    assert!(msg.contains("share the source file"), "{msg}");
}

#[test]
fn test_invalid_unit_name_is_rejected() {
    let msg = config_error(
        r#"
[unit."pkg.1Bad"]
source = "pkg/Bad.java"
"#,
    );
    assert!(msg.contains("is not a valid (qualified) class name"), "{msg}");
}

#[test]
fn test_invalid_watch_pattern_is_rejected() {
    let msg = config_error(
        r#"
[watch]
include = ["src/[unterminated"]
"#,
    );
    assert!(msg.contains("invalid watch pattern"), "{msg}");
}

#[test]
fn test_empty_compiler_program_is_rejected() {
    let msg = config_error(
        r#"
[compiler]
program = "  "
"#,
    );
    assert!(msg.contains("[compiler].program must not be empty"), "{msg}");
}

#[test]
fn test_invalid_toml_returns_toml_error() {
    let file = descriptor("[project\nsource_root = ");
    match load_and_validate(file.path()) {
        Err(IncbuildError::TomlError(_)) => {}
        other => panic!("Expected TomlError, got: {:?}", other),
    }
}

#[test]
fn test_unknown_role_returns_toml_error() {
    let file = descriptor(
        r#"
[unit.A]
source = "A.java"
role = "widget"
"#,
    );
    assert!(matches!(
        load_and_validate(file.path()),
        Err(IncbuildError::TomlError(_))
    ));
}

#[test]
fn test_missing_descriptor_returns_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("Incbuild.toml"));
    assert!(matches!(result, Err(IncbuildError::IoError(_))));
}

#[test]
fn test_valid_descriptor_fills_defaults() {
    let file = descriptor(
        r#"
[project]
source_root = "src"
classpath = ["lib/junit.jar"]

[watch]
use_hash = true
hash_storage = "file"

[unit.Shape]
source = "Shape.java"

[unit.ShapeTest]
source = "ShapeTest.java"
role = "unit_test"
association = "Shape"
compiled = false

[unit."junit.framework.TestCase"]
"#,
    );

    let project = load_and_validate(file.path()).unwrap();

    assert_eq!(project.project.source_root, PathBuf::from("src"));
    assert_eq!(project.project.output_dir, PathBuf::from("classes"));
    assert_eq!(project.project.classpath, vec![PathBuf::from("lib/junit.jar")]);
    assert!(project.project.discover);
    assert_eq!(project.compiler.program, "javac");
    assert!(project.compiler.args.is_empty());
    assert_eq!(project.watch.include, vec!["**/*.java".to_string()]);
    assert!(project.watch.use_hash);
    assert_eq!(project.watch.hash_storage, HashStorageMode::File);

    let test = &project.unit["ShapeTest"];
    assert_eq!(test.role, Some(UnitRole::UnitTest));
    assert_eq!(test.association.as_deref(), Some("Shape"));
    assert_eq!(test.compiled, Some(false));
    assert!(project.unit["junit.framework.TestCase"].source.is_none());
}
