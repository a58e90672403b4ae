use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use domassist::config::Config;
use domassist::storage::{KeyValueStore, MemoryStorage, SqliteStorage};
use domassist::webhook::http::ReqwestTransport;
use domassist::webhook::WebhookClient;
use domassist::ChatWidget;
use tempfile::TempDir;

#[allow(dead_code)]
pub const WEBHOOK_PATH: &str = "/webhook/domassist";

#[allow(dead_code)]
pub fn create_temp_storage() -> (SqliteStorage, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("state.db");
    let storage =
        SqliteStorage::new_with_path(db_path).expect("failed to create sqlite storage with path");
    (storage, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Configuration pointed at a mock server, durable state under `dir`
#[allow(dead_code)]
pub fn config_for(server_uri: &str, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.webhook.url = format!("{}{}", server_uri, WEBHOOK_PATH);
    config.webhook.timeout_seconds = Some(5);
    config.storage.db_path = Some(dir.path().join("state.db"));
    config
}

/// Widget talking HTTP to `config.webhook.url`
#[allow(dead_code)]
pub fn http_widget(config: Config) -> (ChatWidget, Arc<MemoryStorage>) {
    let endpoint = url::Url::parse(&config.webhook.url).expect("valid url");
    let transport =
        ReqwestTransport::new(endpoint, Some(Duration::from_secs(5))).expect("transport");
    let durable: Arc<dyn KeyValueStore> =
        Arc::new(SqliteStorage::open(&config.storage).expect("sqlite storage"));
    let session = Arc::new(MemoryStorage::new());
    let widget = ChatWidget::new(
        config,
        WebhookClient::new(Arc::new(transport)),
        durable,
        session.clone(),
    );
    (widget, session)
}
