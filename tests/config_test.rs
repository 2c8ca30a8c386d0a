use serial_test::serial;
use tempfile::TempDir;
use ticketdesk::config::{API_TOKEN_ENV, CONFIG_PATH_ENV};
use ticketdesk::{Config, HttpBackend, TicketConsole, TicketDeskError};

/// Restores an environment variable when dropped
struct EnvGuard {
    key: &'static str,
    previous: Option<String>,
}

impl EnvGuard {
    fn set(key: &'static str, value: &str) -> Self {
        let previous = std::env::var(key).ok();
        // SAFETY: tests touching the environment are serialized
        unsafe { std::env::set_var(key, value) };
        Self { key, previous }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        // SAFETY: tests touching the environment are serialized
        unsafe {
            match &self.previous {
                Some(value) => std::env::set_var(self.key, value),
                None => std::env::remove_var(self.key),
            }
        }
    }
}

#[test]
#[serial]
fn test_missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_from(&dir.path().join("absent.yaml")).unwrap();
    assert_eq!(config.filters.max_active, 4);
    assert_eq!(config.list.page_size, 10);
    assert!(config.backend.base_url.is_none());
}

#[test]
#[serial]
fn test_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".ticketdesk").join("config.yaml");

    let mut config = Config::default();
    config.filters.max_active = 6;
    config.filters.pinned_field = Some("ticket_id".to_string());
    config.list.page_size = 25;
    config.backend.base_url = Some("https://desk.example.com/api".to_string());
    config.backend.routes.update = "/v2/tickets/{id}".to_string();
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded.filters, config.filters);
    assert_eq!(loaded.list.page_size, 25);
    assert_eq!(loaded.backend.routes.update, "/v2/tickets/{id}");
    assert_eq!(loaded.backend.routes.list, "/tickets");
}

#[test]
#[serial]
fn test_invalid_values_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "list:\n  page_size: 0\n").unwrap();
    assert!(matches!(
        Config::load_from(&path),
        Err(TicketDeskError::Config(_))
    ));

    std::fs::write(&path, "backend:\n  timeout_secs: 0\n").unwrap();
    assert!(matches!(
        Config::load_from(&path),
        Err(TicketDeskError::Config(_))
    ));

    std::fs::write(&path, "filters: [not, a, map]\n").unwrap();
    assert!(matches!(
        Config::load_from(&path),
        Err(TicketDeskError::YamlParse(_))
    ));
}

#[test]
#[serial]
fn test_config_path_env_override() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.yaml");
    std::fs::write(&path, "filters:\n  max_active: 2\n").unwrap();

    let _guard = EnvGuard::set(CONFIG_PATH_ENV, path.to_str().unwrap());
    assert_eq!(Config::config_path(), path);
    let config = Config::load().unwrap();
    assert_eq!(config.filters.max_active, 2);
}

#[test]
#[serial]
fn test_api_token_env_wins() {
    let mut config = Config::default();
    config.backend.api_token = Some("from-file".to_string());
    assert_eq!(config.api_token().as_deref(), Some("from-file"));

    let _guard = EnvGuard::set(API_TOKEN_ENV, "from-env");
    assert_eq!(config.api_token().as_deref(), Some("from-env"));
}

#[test]
#[serial]
fn test_config_drives_console_and_backend() {
    let mut config = Config::default();
    config.filters.max_active = 1;
    config.filters.pinned_field = Some("ticket_id".to_string());
    config.list.page_size = 50;

    let mut console = TicketConsole::new(config.clone());
    console.install_schema(&serde_json::json!([
        {"name": "priority", "type": "dropdown"},
        {"name": "subject", "type": "text"}
    ]));
    console.activate_filter("priority").unwrap();
    assert!(matches!(
        console.activate_filter("subject"),
        Err(TicketDeskError::FilterLimitExceeded { cap: 1 })
    ));
    assert_eq!(console.selector().query().page_size, 50);

    assert!(matches!(
        HttpBackend::from_config(&config),
        Err(TicketDeskError::Config(_))
    ));
    config.backend.base_url = Some("not a url".to_string());
    assert!(matches!(
        HttpBackend::from_config(&config),
        Err(TicketDeskError::Url(_))
    ));
}
