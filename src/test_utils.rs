//! Test utilities for DomAssist
//!
//! Temporary directories, configuration fixtures and assertion helpers
//! shared by the unit tests.

use crate::config::Config;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: anyhow::Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Default configuration pointed at `webhook_url`, with the durable
/// database placed at `dir/state.db`
pub fn test_config(dir: &Path, webhook_url: &str) -> Config {
    let mut config = Config::default();
    config.webhook.url = webhook_url.to_string();
    config.storage.db_path = Some(dir.join("state.db"));
    config
}

/// Minimal configuration YAML
pub fn test_config_yaml() -> String {
    r#"
webhook:
  url: http://localhost:5678/webhook/domassist
  timeout_seconds: 10
widget:
  assistant_name: TestAssist
  enable_voice: false
  quick_actions:
    - Preise anzeigen
history:
  context_window: 3
lead:
  qualified_after_actions: 2
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomassistError;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "clip.webm", b"RIFF");
        assert_eq!(std::fs::read(&path).unwrap(), b"RIFF");
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: anyhow::Result<()> =
            Err(DomassistError::Config("test error message".to_string()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        assert_error_contains(Ok(()), "error");
    }

    #[test]
    fn test_test_config_is_valid() {
        let dir = temp_dir();
        let config = test_config(dir.path(), "http://127.0.0.1:9/webhook");
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.db_path, Some(dir.path().join("state.db")));
    }

    #[test]
    fn test_test_config_yaml() {
        let config: Config = serde_yaml::from_str(&test_config_yaml()).unwrap();
        assert_eq!(config.widget.assistant_name, "TestAssist");
        assert!(!config.widget.enable_voice);
        assert_eq!(config.history.context_window, 3);
        assert_eq!(config.lead.qualified_after_actions, 2);
        assert!(config.validate().is_ok());
    }
}
