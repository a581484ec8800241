//! Syntax source adapter: owns the parser, the current text, and the last
//! parsed tree.

use super::parser::{ChangedRange, Fragments, IncrementalParser};
use super::tree::Tree;
use crate::error::{Error, Result};

/// Keeps a [`Tree`] in step with an append-only text.
pub struct SyntaxSource {
    parser: Box<dyn IncrementalParser>,
    text: String,
    tree: Option<Tree>,
    fragments: Fragments,
}

impl SyntaxSource {
    pub fn new(parser: Box<dyn IncrementalParser>) -> Self {
        Self {
            parser,
            text: String::new(),
            tree: None,
            fragments: Fragments::default(),
        }
    }

    /// Cold parse, replacing any previous state.
    pub fn parse_full(&mut self, text: impl Into<String>) -> &Tree {
        self.text = text.into();
        self.fragments = Fragments::default();
        self.tree.insert(self.parser.parse_full(&self.text))
    }

    /// The last parsed tree.
    pub fn current_tree(&self) -> Result<&Tree> {
        self.tree.as_ref().ok_or(Error::Uninitialized)
    }

    /// Append `chunk` to the text and re-parse, reusing every block the
    /// parser can carry over.
    pub fn apply_append(&mut self, chunk: &str) -> Result<&Tree> {
        let tree = self.tree.as_ref().ok_or(Error::Uninitialized)?;
        if chunk.is_empty() {
            return self.current_tree();
        }

        let change = ChangedRange::append(self.text.len(), chunk.len());
        let fragments = self.parser.fragments(tree, &[change]);
        self.text.push_str(chunk);

        let next = self.parser.parse_incremental(&self.text, &fragments);
        self.fragments = fragments;
        Ok(self.tree.insert(next))
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.tree.is_some()
    }

    /// Fragments used by the last incremental parse.
    pub fn last_fragments(&self) -> &Fragments {
        &self.fragments
    }
}
