use chatmark_core::ParserOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub parser: ParserConfig,
    pub reveal: RevealConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub list_indent_width: usize,
    pub tab_width: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            list_indent_width: ParserOptions::DEFAULT_LIST_INDENT_WIDTH,
            tab_width: ParserOptions::DEFAULT_TAB_WIDTH,
        }
    }
}

/// How fast the preview reveals text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub chars_per_tick: usize,
    pub tick_ms: u64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            chars_per_tick: 3,
            tick_ms: 16,
        }
    }
}

impl Config {
    /// Loads the file at `config_path`, expanding `~` and env vars in the
    /// path first. A missing file is `Ok(None)`.
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        let config_path = Self::expand_path(config_path).unwrap_or_else(|| config_path.into());
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.clone(),
                source,
            }
        })?;

        let config = toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
            config_path: config_path.clone(),
            source,
        })?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/chatmark");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            list_indent_width: self.parser.list_indent_width,
            tab_width: self.parser.tab_width,
        }
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/chatmark/config.toml"));
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.parser_options(), ParserOptions::default());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config: Config = toml::from_str(
            r#"
[parser]
list_indent_width = 4

[reveal]
tick_ms = 50
"#,
        )
        .unwrap();

        assert_eq!(config.parser.list_indent_width, 4);
        assert_eq!(config.parser.tab_width, ParserOptions::DEFAULT_TAB_WIDTH);
        assert_eq!(config.reveal.tick_ms, 50);
        assert_eq!(config.reveal.chars_per_tick, 3);
        assert_eq!(config.parser_options().list_depth(4), 1);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_load_expands_env_var_in_path() {
        let temp_dir = TempDir::new().unwrap();
        Config::default()
            .save_to_path(temp_dir.path().join("config.toml"))
            .unwrap();

        unsafe {
            env::set_var("CHATMARK_TEST_DIR", temp_dir.path());
        }
        let loaded = Config::load_from_path("$CHATMARK_TEST_DIR/config.toml").unwrap();
        unsafe {
            env::remove_var("CHATMARK_TEST_DIR");
        }

        assert_eq!(loaded, Some(Config::default()));
    }

    #[test]
    fn test_load_reads_default_location() {
        let temp_dir = TempDir::new().unwrap();
        let original_home = env::var_os("HOME");
        unsafe {
            env::set_var("HOME", temp_dir.path());
        }
        let config = Config {
            reveal: RevealConfig {
                chars_per_tick: 7,
                tick_ms: 16,
            },
            ..Config::default()
        };
        config.save_to_path(Config::config_path()).unwrap();
        let loaded = Config::load().unwrap();
        unsafe {
            match original_home {
                Some(home) => env::set_var("HOME", home),
                None => env::remove_var("HOME"),
            }
        }

        assert_eq!(loaded, Some(config));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[parser]\nlist_indent_width = \"wide\"\n").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested/dir/config.toml");
        let test_config = Config {
            parser: ParserConfig {
                list_indent_width: 3,
                tab_width: 8,
            },
            reveal: RevealConfig {
                chars_per_tick: 1,
                tick_ms: 40,
            },
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }
}
