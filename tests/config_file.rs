use std::io::Write;

use recall_chat::config::{Config, SearchProviderKind};
use recall_chat::error::RecallChatError;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn loads_sections_and_fills_defaults() {
    let file = write_config(
        r#"{
            "openai": {"api_key": "sk-file", "model": "gpt-4o-mini"},
            "store": {"api_key": "pat-file", "base_id": "appFile", "table_name": "Chats",
                      "history_limit": 3},
            "search": {"provider": "brave", "api_key": "brave-file", "max_results": 5},
            "server": {"port": 8080}
        }"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.openai().model(), "gpt-4o-mini");
    assert_eq!(config.openai().generation_params().max_tokens, 300);
    assert_eq!(config.store().history_limit(), 3);
    assert_eq!(config.store().bot_id(), "recall_chat_web");

    let search = config.search().unwrap();
    assert_eq!(search.provider(), SearchProviderKind::Brave);
    assert_eq!(search.max_results(), 5);

    assert_eq!(config.server().host(), "0.0.0.0");
    assert_eq!(config.server().port(), 8080);
}

#[test]
fn disabled_search_section_is_hidden() {
    let file = write_config(
        r#"{
            "openai": {"api_key": "sk-file"},
            "store": {"api_key": "pat-file", "base_id": "appFile", "table_name": "Chats"},
            "search": {"enabled": false, "provider": "brave"}
        }"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    config.validate().unwrap();
    assert!(config.search().is_none());
}

#[test]
fn missing_credentials_fail_validation() {
    let file = write_config(r#"{"openai": {"api_key": "sk-file"}, "store": {"base_id": "appFile"}}"#);

    let config = Config::from_file(file.path()).unwrap();
    match config.validate() {
        Err(RecallChatError::Config(message)) => assert!(message.contains("store.api_key")),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn unreadable_or_malformed_files_are_config_errors() {
    let file = write_config("{ this is not json");
    assert!(matches!(
        Config::from_file(file.path()),
        Err(RecallChatError::Config(_))
    ));

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");
    match Config::from_file(&missing) {
        Err(RecallChatError::Config(message)) => assert!(message.contains("absent.json")),
        other => panic!("expected config error, got {other:?}"),
    }
}
