//! `[schema]` section: per-kind tag, class and attribute overrides.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::render::{BlockKind, MarkKind};

/// Replacement record for one kind's element template.
///
/// Unset fields keep the built-in value. For headings `tag` is a prefix
/// completed by the level (`tag = "h"` gives `h1`..`h6`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ElementOverride {
    pub tag: Option<String>,
    pub class: Option<String>,
    pub attrs: BTreeMap<String, String>,
}

/// Overrides keyed by kind name (`paragraph`, `code_block`, `strong` ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    pub blocks: BTreeMap<String, ElementOverride>,
    pub marks: BTreeMap<String, ElementOverride>,
}

impl SchemaConfig {
    pub fn len(&self) -> usize {
        self.blocks.len() + self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reject names that do not correspond to a renderable kind.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = self
            .blocks
            .keys()
            .find(|name| BlockKind::from_name(name).is_none())
        {
            return Err(ConfigError::UnknownKind {
                section: "blocks",
                name: name.clone(),
            });
        }
        if let Some(name) = self
            .marks
            .keys()
            .find(|name| MarkKind::from_name(name).is_none())
        {
            return Err(ConfigError::UnknownKind {
                section: "marks",
                name: name.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{Config, ConfigError};

    #[test]
    fn test_schema_overrides_parse() {
        let config: Config = r#"
[schema.blocks.paragraph]
class = "md-p"

[schema.blocks.code_block]
attrs = { "data-lang" = "auto" }

[schema.marks.strong]
tag = "b"
"#
        .parse()
        .unwrap();

        let paragraph = &config.schema.blocks["paragraph"];
        assert_eq!(paragraph.class.as_deref(), Some("md-p"));
        assert!(paragraph.tag.is_none());
        assert_eq!(config.schema.blocks["code_block"].attrs["data-lang"], "auto");
        assert_eq!(config.schema.marks["strong"].tag.as_deref(), Some("b"));
        assert_eq!(config.schema.len(), 3);
    }

    #[test]
    fn test_unknown_block_kind() {
        let result: Result<Config, _> = "[schema.blocks.sidebar]\ntag = \"aside\"".parse();
        match result {
            Err(ConfigError::UnknownKind { section, name }) => {
                assert_eq!(section, "blocks");
                assert_eq!(name, "sidebar");
            }
            other => panic!("expected UnknownKind, got {other:?}"),
        }
    }

    #[test]
    fn test_instruction_kind_is_not_a_mark() {
        let result: Result<Config, _> = "[schema.marks.emphasis_mark]\ntag = \"i\"".parse();
        assert!(matches!(result, Err(ConfigError::UnknownKind { section: "marks", .. })));
    }
}
