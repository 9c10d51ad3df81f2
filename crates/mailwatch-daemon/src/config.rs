//! Configuration loading. The file is optional; every field falls back to
//! its default and the floors are always applied.
//!
//! ```toml
//! accounts = ["imap.example.com,user@example.com,app-password"]
//!
//! [watch]
//! interval = 3.0
//! text_limit = 50
//! recreate_interval = 120
//! check_timeout = 30
//! dedup_clear_interval = 300
//! recency_window = 120
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use mailwatch_core::{AccountSource, PollConfig};

pub(crate) struct LoadedConfig {
    pub config: PollConfig,
    pub accounts: Vec<String>,
}

impl Default for LoadedConfig {
    fn default() -> Self {
        Self {
            config: PollConfig::default(),
            accounts: Vec::new(),
        }
    }
}

pub(crate) fn load_config(path: &Path) -> LoadedConfig {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return LoadedConfig::default(),
    };
    let value: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "invalid config file, using defaults");
            return LoadedConfig::default();
        }
    };

    let accounts = value
        .get("accounts")
        .and_then(|v| v.as_array())
        .map(|list| {
            list.iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let mut config = PollConfig::default();
    if let Some(watch) = value.get("watch") {
        if let Some(interval) = watch.get("interval").and_then(toml_float) {
            config.interval_secs = interval;
        }
        if let Some(limit) = watch.get("text_limit").and_then(|v| v.as_integer()) {
            config.text_limit = limit.max(0) as usize;
        }
        if let Some(secs) = duration_field(watch, "recreate_interval") {
            config.recreate_interval = secs;
        }
        if let Some(secs) = duration_field(watch, "check_timeout") {
            config.check_timeout = secs;
        }
        if let Some(secs) = duration_field(watch, "dedup_clear_interval") {
            config.dedup_clear_interval = secs;
        }
        if let Some(secs) = duration_field(watch, "recency_window") {
            config.recency_window = secs;
        }
    }

    LoadedConfig {
        config: config.normalized(),
        accounts,
    }
}

fn toml_float(value: &toml::Value) -> Option<f64> {
    value
        .as_float()
        .or_else(|| value.as_integer().map(|v| v as f64))
}

fn duration_field(table: &toml::Value, key: &str) -> Option<Duration> {
    table
        .get(key)
        .and_then(|v| v.as_integer())
        .map(|secs| Duration::from_secs(secs.max(0) as u64))
}

/// Reads the account list from the config file on every access, so a
/// `reload_accounts` picks up edits without restarting.
pub(crate) struct TomlAccountSource {
    path: PathBuf,
}

impl TomlAccountSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl AccountSource for TomlAccountSource {
    fn descriptors(&self) -> Vec<String> {
        load_config(&self.path).accounts
    }
}

/// Fixed account list: the environment fallback, and tests.
pub(crate) struct StaticAccountSource {
    descriptors: Vec<String>,
}

impl StaticAccountSource {
    pub fn new(descriptors: Vec<String>) -> Self {
        Self { descriptors }
    }
}

impl AccountSource for StaticAccountSource {
    fn descriptors(&self) -> Vec<String> {
        self.descriptors.clone()
    }
}

/// `MAILWATCH_HOST`/`MAILWATCH_USER`/`MAILWATCH_SECRET` as a single
/// account descriptor.
pub(crate) fn env_descriptor() -> Option<String> {
    let host = std::env::var("MAILWATCH_HOST").ok()?;
    let user = std::env::var("MAILWATCH_USER").ok()?;
    let secret = std::env::var("MAILWATCH_SECRET").ok()?;
    Some(format!("{},{},{}", host, user, secret))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use mailwatch_core::{AccountSource, MIN_INTERVAL_SECS, MIN_TEXT_LIMIT};

    use super::{TomlAccountSource, load_config};

    fn temp_config_path() -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("mailwatch-config-{}-{}.toml", std::process::id(), ts))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let loaded = load_config(&PathBuf::from("/nonexistent/mailwatch.toml"));
        assert_eq!(loaded.config.interval_secs, 3.0);
        assert_eq!(loaded.config.text_limit, 50);
        assert!(loaded.accounts.is_empty());
    }

    #[test]
    fn invalid_toml_yields_defaults() {
        let path = temp_config_path();
        std::fs::write(&path, "accounts = [").unwrap();
        let loaded = load_config(&path);
        assert!(loaded.accounts.is_empty());
        assert_eq!(loaded.config.interval_secs, 3.0);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn full_config_is_read_with_floors_applied() {
        let path = temp_config_path();
        std::fs::write(
            &path,
            r#"
accounts = ["imap.example.com,user@example.com,secret"]

[watch]
interval = 0.1
text_limit = 2
recreate_interval = 60
check_timeout = 10
dedup_clear_interval = 600
recency_window = 90
"#,
        )
        .unwrap();

        let loaded = load_config(&path);
        assert_eq!(
            loaded.accounts,
            vec!["imap.example.com,user@example.com,secret".to_string()]
        );
        assert_eq!(loaded.config.interval_secs, MIN_INTERVAL_SECS);
        assert_eq!(loaded.config.text_limit, MIN_TEXT_LIMIT);
        assert_eq!(loaded.config.recreate_interval, Duration::from_secs(60));
        assert_eq!(loaded.config.check_timeout, Duration::from_secs(10));
        assert_eq!(loaded.config.dedup_clear_interval, Duration::from_secs(600));
        assert_eq!(loaded.config.recency_window, Duration::from_secs(90));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn integer_interval_is_accepted() {
        let path = temp_config_path();
        std::fs::write(&path, "[watch]\ninterval = 5\n").unwrap();
        let loaded = load_config(&path);
        assert_eq!(loaded.config.interval_secs, 5.0);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn toml_source_rereads_file_on_each_access() {
        let path = temp_config_path();
        std::fs::write(&path, "accounts = [\"h,a@b.c,s\"]\n").unwrap();
        let source = TomlAccountSource::new(path.clone());
        assert_eq!(source.descriptors(), vec!["h,a@b.c,s".to_string()]);

        std::fs::write(&path, "accounts = [\"h,a@b.c,s\", \"h,x@y.z,s\"]\n").unwrap();
        assert_eq!(source.descriptors().len(), 2);
        let _ = std::fs::remove_file(&path);
    }
}
