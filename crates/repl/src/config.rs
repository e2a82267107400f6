//! Front-end configuration
//!
//! Read from TOML. Every field has a default, so an empty file, or no file
//! at all, is a valid configuration:
//!
//! ```toml
//! [repl]
//! prompt = "cairn> "
//! show_stack = true
//! history = true
//! history_file = "/tmp/cairn_history"
//!
//! [output]
//! color = true
//!
//! [log]
//! filter = "cairn_runtime=debug"
//! ```
//!
//! The file is found by checking, in order: the `--config` option, the
//! `CAIRN_CONFIG` environment variable, then
//! `$HOME/.config/cairn/config.toml` if it exists.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "CAIRN_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub repl: ReplConfig,
    pub output: OutputConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplConfig {
    pub prompt: String,
    /// Print the stack after each successful line
    pub show_stack: bool,
    /// Load and save line history
    pub history: bool,
    pub history_file: Option<PathBuf>,
}

impl Default for ReplConfig {
    fn default() -> Self {
        ReplConfig {
            prompt: "cairn> ".to_string(),
            show_stack: true,
            history: true,
            history_file: None,
        }
    }
}

impl ReplConfig {
    /// Where history is kept, or `None` when history is off
    pub fn history_path(&self) -> Option<PathBuf> {
        if !self.history {
            return None;
        }
        self.history_file
            .clone()
            .or_else(|| home::home_dir().map(|d| d.join(".local/share/cairn_history")))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// ANSI colours in diagnostics
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig { color: true }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directives, used when `CAIRN_LOG` is unset
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse config: {}", e))
    }

    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
        Self::from_toml(&content).map_err(|e| format!("{}: {}", path.display(), e))
    }

    /// Find and load the configuration
    ///
    /// A file named explicitly, by option or environment, must exist. The
    /// per-user file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, String> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }
        match default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }
}

fn default_path() -> Option<PathBuf> {
    home::home_dir().map(|d| d.join(".config/cairn/config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::ffi::OsString;
    use tempfile::TempDir;

    /// Set an environment variable for the life of the guard
    struct EnvGuard {
        key: &'static str,
        previous: Option<OsString>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: impl AsRef<std::ffi::OsStr>) -> Self {
            let previous = env::var_os(key);
            unsafe { env::set_var(key, value) };
            EnvGuard { key, previous }
        }

        fn unset(key: &'static str) -> Self {
            let previous = env::var_os(key);
            unsafe { env::remove_var(key) };
            EnvGuard { key, previous }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.previous {
                Some(value) => unsafe { env::set_var(self.key, value) },
                None => unsafe { env::remove_var(self.key) },
            }
        }
    }

    fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.repl.prompt, "cairn> ");
        assert_eq!(config.log.filter, "warn");
        assert!(config.output.color);
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let config = Config::from_toml("[repl]\nshow_stack = false\n").unwrap();
        assert!(!config.repl.show_stack);
        assert!(config.repl.history);
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Config::from_toml("[repl]\npromt = \"> \"\n").unwrap_err();
        assert!(err.contains("promt"), "{err}");
    }

    #[test]
    fn test_history_path() {
        let repl = ReplConfig {
            history_file: Some(PathBuf::from("/tmp/h")),
            ..ReplConfig::default()
        };
        assert_eq!(repl.history_path(), Some(PathBuf::from("/tmp/h")));

        let repl = ReplConfig {
            history: false,
            ..repl
        };
        assert_eq!(repl.history_path(), None);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.starts_with("Failed to read config"), "{err}");
    }

    #[test]
    #[serial]
    fn test_explicit_path_wins_over_env() {
        let dir = TempDir::new().unwrap();
        let explicit = write_config(&dir, "a.toml", "[repl]\nprompt = \"a> \"\n");
        let from_env = write_config(&dir, "b.toml", "[repl]\nprompt = \"b> \"\n");
        let _env = EnvGuard::set(CONFIG_ENV, &from_env);

        assert_eq!(Config::load(Some(&explicit)).unwrap().repl.prompt, "a> ");
        assert_eq!(Config::load(None).unwrap().repl.prompt, "b> ");
    }

    #[test]
    #[serial]
    fn test_user_config_under_home() {
        let home = TempDir::new().unwrap();
        let _env = EnvGuard::unset(CONFIG_ENV);
        let _home = EnvGuard::set("HOME", home.path());

        assert_eq!(Config::load(None).unwrap(), Config::default());

        let dir = home.path().join(".config/cairn");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), "[log]\nfilter = \"debug\"\n").unwrap();
        assert_eq!(Config::load(None).unwrap().log.filter, "debug");
    }
}
