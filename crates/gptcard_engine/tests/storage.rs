use std::fs;

use gptcard_engine::{GptConfig, LocalStorage, StorageContents, StorageError};
use tempfile::TempDir;

#[test]
fn missing_file_is_empty_storage() {
    let temp = TempDir::new().unwrap();
    let storage = LocalStorage::open(temp.path().join("storage.ron")).unwrap();
    assert_eq!(storage.gpt_config(), &GptConfig::default());
    assert_eq!(storage.insert_template(), "");
}

#[test]
fn reads_partial_file_with_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("storage.ron");
    fs::write(&path, r#"(gpt_config: (api_key: "sk-file", max_tokens: Some(32)))"#).unwrap();

    let storage = LocalStorage::open(&path).unwrap();
    assert_eq!(storage.gpt_config().api_key, "sk-file");
    assert_eq!(storage.gpt_config().max_tokens(), 32);
    assert_eq!(storage.insert_template(), "");
}

#[test]
fn take_insert_template_clears_it_on_disk() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("storage.ron");
    let mut storage = LocalStorage::open(&path).unwrap();
    storage.set_insert_template("<h2>Meeting notes</h2>").unwrap();

    let reopened = LocalStorage::open(&path).unwrap();
    assert_eq!(reopened.insert_template(), "<h2>Meeting notes</h2>");

    assert_eq!(
        storage.take_insert_template().unwrap().as_deref(),
        Some("<h2>Meeting notes</h2>")
    );
    assert_eq!(storage.take_insert_template().unwrap(), None);

    let reopened = LocalStorage::open(&path).unwrap();
    assert_eq!(reopened.insert_template(), "");
}

#[test]
fn take_sees_template_written_after_open() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("storage.ron");
    let mut storage = LocalStorage::open(&path).unwrap();
    assert_eq!(storage.take_insert_template().unwrap(), None);

    fs::write(
        &path,
        r#"(gpt_config: (api_key: "sk-options"), insert_template: "<h2>Later</h2>")"#,
    )
    .unwrap();
    assert_eq!(
        storage.take_insert_template().unwrap().as_deref(),
        Some("<h2>Later</h2>")
    );

    let reopened = LocalStorage::open(&path).unwrap();
    assert_eq!(reopened.insert_template(), "");
    assert_eq!(reopened.gpt_config().api_key, "sk-options");
}

#[test]
fn reload_reports_config_changes_only() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("storage.ron");
    fs::write(&path, r#"(gpt_config: (api_key: "one"))"#).unwrap();
    let mut storage = LocalStorage::open(&path).unwrap();

    fs::write(&path, r#"(gpt_config: (api_key: "one"), insert_template: "<p>x</p>")"#).unwrap();
    assert!(!storage.reload().unwrap());
    assert_eq!(storage.insert_template(), "<p>x</p>");

    fs::write(&path, r#"(gpt_config: (api_key: "two"))"#).unwrap();
    assert!(storage.reload().unwrap());
    assert_eq!(storage.gpt_config().api_key, "two");
}

#[test]
fn garbage_file_is_a_parse_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("storage.ron");
    fs::write(&path, "{ not ron").unwrap();
    assert!(matches!(
        LocalStorage::open(&path),
        Err(StorageError::Parse { .. })
    ));
}

#[test]
fn in_memory_storage_never_touches_disk() {
    let mut storage = LocalStorage::in_memory(StorageContents {
        insert_template: "<p>t</p>".to_string(),
        ..StorageContents::default()
    });
    assert_eq!(storage.take_insert_template().unwrap().as_deref(), Some("<p>t</p>"));
    assert!(!storage.reload().unwrap());
}
