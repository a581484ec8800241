//! Renderer configuration, loadable from `inkstream.toml`.
//!
//! # Sections
//!
//! | Section                  | Purpose                                   |
//! |--------------------------|-------------------------------------------|
//! | `[parser]`               | Markdown dialect switches                 |
//! | `[scroll]`               | Follow-the-tail scroll hints              |
//! | `[schema.blocks.<kind>]` | Tag/class/attribute override for a block  |
//! | `[schema.marks.<kind>]`  | Tag/class/attribute override for a mark   |
//!
//! # Example
//!
//! ```toml
//! [parser]
//! tables = true
//! subscript = false
//!
//! [scroll]
//! enabled = true
//! offset = 64
//!
//! [schema.blocks.paragraph]
//! class = "md-p"
//!
//! [schema.marks.strong]
//! tag = "b"
//! ```

mod error;
mod schema;

pub use error::ConfigError;
pub use schema::{ElementOverride, SchemaConfig};

use std::fs;
use std::path::Path;
use std::str::FromStr;

use pulldown_cmark::Options;
use serde::{Deserialize, Serialize};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing `inkstream.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Markdown dialect
    pub parser: ParserConfig,

    /// Scroll hint settings
    pub scroll: ScrollConfig,

    /// Render schema overrides
    pub schema: SchemaConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        content.parse()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(s)?;
        config.schema.validate()?;
        crate::debug!("config"; "loaded {} schema overrides", config.schema.len());
        Ok(config)
    }
}

// ============================================================================
// [parser]
// ============================================================================

/// Dialect switches on top of CommonMark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// GFM tables
    pub tables: bool,
    /// `~~strike~~`
    pub strikethrough: bool,
    /// `^sup^`
    pub superscript: bool,
    /// `~sub~`
    pub subscript: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            superscript: true,
            subscript: true,
        }
    }
}

impl ParserConfig {
    /// Convert to pulldown-cmark Options
    pub fn to_pulldown_options(&self) -> Options {
        let mut opts = Options::empty();
        if self.tables {
            opts.insert(Options::ENABLE_TABLES);
        }
        if self.strikethrough {
            opts.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.superscript {
            opts.insert(Options::ENABLE_SUPERSCRIPT);
        }
        if self.subscript {
            opts.insert(Options::ENABLE_SUBSCRIPT);
        }
        opts
    }
}

// ============================================================================
// [scroll]
// ============================================================================

/// Scroll-to-tail hints reported after each pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Report a scroll request for the tail element
    pub enabled: bool,
    /// Distance in pixels the host keeps below the tail
    pub offset: u32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            offset: 48,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config: Config = "".parse().unwrap();
        assert_eq!(config, Config::default());
        assert!(config.parser.tables);
        assert!(!config.scroll.enabled);
        assert_eq!(config.scroll.offset, 48);
    }

    #[test]
    fn test_config_sections() {
        let config: Config = "[parser]\nsubscript = false\n\n[scroll]\nenabled = true\noffset = 10"
            .parse()
            .unwrap();
        assert!(!config.parser.subscript);
        assert!(config.parser.superscript);
        assert!(config.scroll.enabled);
        assert_eq!(config.scroll.offset, 10);
    }

    #[test]
    fn test_pulldown_options() {
        let opts = ParserConfig {
            tables: false,
            ..ParserConfig::default()
        }
        .to_pulldown_options();
        assert!(!opts.contains(Options::ENABLE_TABLES));
        assert!(opts.contains(Options::ENABLE_STRIKETHROUGH));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<Config, _> = "[render]\nfoo = 1".parse();
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inkstream.toml");
        std::fs::write(&path, "[scroll]\nenabled = true").unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.scroll.enabled);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io(..))));
    }
}
