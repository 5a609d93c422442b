//! Renderer configuration.

use std::path::Path;

use quill_snippet::{DEFAULT_EXECUTABLE_TAGS, DEFAULT_TIMEOUT_MS};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::theme::THEME_NAMES;

/// Width used when neither the config nor the terminal provides one.
pub const FALLBACK_WIDTH: usize = 80;

/// Narrowest accepted configured width.
pub const MIN_WIDTH: usize = 20;

/// Renderer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Emit ANSI styling
    #[serde(default = "default_use_color")]
    pub use_color: bool,

    /// Reserve ids for and capture executable code blocks
    #[serde(default = "default_true")]
    pub enable_code_execution: bool,

    /// Fence tags (case-insensitive) whose blocks are executable
    #[serde(default = "default_executable_tags")]
    pub executable_tags: Vec<String>,

    /// Output width in columns; probed from the terminal when unset
    #[serde(default)]
    pub width: Option<usize>,

    /// Theme name (`dark` or `light`)
    #[serde(default = "default_theme")]
    pub theme: String,

    /// Snippet timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            use_color: default_use_color(),
            enable_code_execution: true,
            executable_tags: default_executable_tags(),
            width: None,
            theme: default_theme(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl RenderConfig {
    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse TOML text; missing fields take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.width {
            Some(width) if width < MIN_WIDTH => {
                return Err(ConfigError::invalid(
                    "width",
                    format!("must be at least {MIN_WIDTH}, got {width}"),
                ));
            }
            _ => {}
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::invalid("timeout_ms", "must be greater than zero"));
        }
        if !THEME_NAMES.contains(&self.theme.to_lowercase().as_str()) {
            return Err(ConfigError::invalid(
                "theme",
                format!("unknown theme '{}', expected one of {THEME_NAMES:?}", self.theme),
            ));
        }
        Ok(())
    }

    /// Whether a fence tag marks an executable block.
    pub fn is_executable_tag(&self, tag: &str) -> bool {
        !tag.is_empty()
            && self
                .executable_tags
                .iter()
                .any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Configured width, else the terminal width, else [`FALLBACK_WIDTH`].
    pub fn resolved_width(&self) -> usize {
        self.width
            .or_else(|| {
                crossterm::terminal::size()
                    .ok()
                    .map(|(cols, _)| cols as usize)
                    .filter(|cols| *cols > 0)
            })
            .unwrap_or(FALLBACK_WIDTH)
    }

    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    pub fn with_code_execution(mut self, enabled: bool) -> Self {
        self.enable_code_execution = enabled;
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }
}

/// `NO_COLOR` disables color when set to anything but empty, `0` or `false`.
pub fn color_allowed(no_color: Option<&str>) -> bool {
    match no_color {
        None => true,
        Some(value) => {
            let value = value.trim();
            value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false")
        }
    }
}

fn default_use_color() -> bool {
    color_allowed(std::env::var("NO_COLOR").ok().as_deref())
}

fn default_true() -> bool {
    true
}

fn default_executable_tags() -> Vec<String> {
    DEFAULT_EXECUTABLE_TAGS.iter().map(|t| t.to_string()).collect()
}

fn default_theme() -> String {
    "dark".to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert!(config.enable_code_execution);
        assert_eq!(config.executable_tags, vec!["lua", "lua5.4", "lua54", "luajit"]);
        assert_eq!(config.theme, "dark");
        assert_eq!(config.timeout_ms, 5_000);
        assert!(config.width.is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = RenderConfig::from_toml_str("width = 100\nuse_color = false\n").unwrap();
        assert_eq!(config.width, Some(100));
        assert!(!config.use_color);
        assert!(config.enable_code_execution);
        assert_eq!(config.resolved_width(), 100);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            RenderConfig::from_toml_str("width = 5"),
            Err(ConfigError::Invalid { field: "width", .. })
        ));
        assert!(matches!(
            RenderConfig::from_toml_str("theme = \"neon\""),
            Err(ConfigError::Invalid { field: "theme", .. })
        ));
        assert!(matches!(
            RenderConfig::from_toml_str("timeout_ms = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "theme = \"light\"\nexecutable_tags = [\"Lua\"]").unwrap();
        let config = RenderConfig::load(file.path()).unwrap();
        assert_eq!(config.theme, "light");
        assert!(config.is_executable_tag("LUA"));
        assert!(!config.is_executable_tag("luajit"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = RenderConfig::load("/nonexistent/quill.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_no_color_values() {
        assert!(color_allowed(None));
        assert!(color_allowed(Some("")));
        assert!(color_allowed(Some("0")));
        assert!(color_allowed(Some("false")));
        assert!(!color_allowed(Some("1")));
        assert!(!color_allowed(Some("yes")));
    }
}
