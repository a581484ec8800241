//! Incremental parser seam and the built-in `pulldown-cmark` implementation.

use std::rc::Rc;

use pulldown_cmark::Options;

use super::build::{Definitions, build};
use super::tree::{ParseMode, Tree};
use super::node::{NodeKind, SyntaxNode};
use crate::config::ParserConfig;

// =============================================================================
// Edit Descriptors
// =============================================================================

/// One edited range: `[from_a, to_a)` in the old text became
/// `[from_b, to_b)` in the new text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangedRange {
    pub from_a: usize,
    pub to_a: usize,
    pub from_b: usize,
    pub to_b: usize,
}

impl ChangedRange {
    /// Descriptor for appending `len` bytes to a text of `old_len` bytes.
    pub const fn append(old_len: usize, len: usize) -> Self {
        Self {
            from_a: old_len,
            to_a: old_len,
            from_b: old_len,
            to_b: old_len + len,
        }
    }
}

/// Parts of a previous tree that survive an edit.
#[derive(Debug, Clone, Default)]
pub struct Fragments {
    /// Leading top-level blocks to carry over unchanged
    pub blocks: Vec<Rc<SyntaxNode>>,
    /// Byte offset where re-parsing starts
    pub reuse_to: usize,
    /// Reference definitions known from the previous parse
    pub definitions: Rc<Definitions>,
}

impl Fragments {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

// =============================================================================
// Parser Trait
// =============================================================================

/// Producer of syntax trees.
///
/// Implementations must keep `parse_incremental(text, fragments(tree, edits))`
/// equivalent to `parse_full(text)` for append-only edits.
pub trait IncrementalParser {
    /// Cold parse.
    fn parse_full(&self, text: &str) -> Tree;

    /// Parse `text`, reusing `fragments` from a previous tree.
    fn parse_incremental(&self, text: &str, fragments: &Fragments) -> Tree;

    /// Derive the reusable parts of `tree` given the edited ranges.
    fn fragments(&self, tree: &Tree, changes: &[ChangedRange]) -> Fragments;
}

// =============================================================================
// Markdown Parser
// =============================================================================

/// CommonMark + tables, strikethrough, superscript, subscript.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownParser {
    options: Options,
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::from_config(&ParserConfig::default())
    }
}

impl MarkdownParser {
    pub fn from_config(config: &ParserConfig) -> Self {
        Self {
            options: config.to_pulldown_options(),
        }
    }

    pub fn options(&self) -> Options {
        self.options
    }
}

impl IncrementalParser for MarkdownParser {
    fn parse_full(&self, text: &str) -> Tree {
        let built = build(text, self.options, &Definitions::default());
        let blocks = built.blocks.into_iter().map(Rc::new).collect();
        Tree::new(blocks, text.len(), Rc::new(built.definitions), ParseMode::Full)
    }

    fn parse_incremental(&self, text: &str, fragments: &Fragments) -> Tree {
        let from = fragments.reuse_to;
        if fragments.is_empty() || from > text.len() || !text.is_char_boundary(from) {
            return self.parse_full(text);
        }

        let built = build(&text[from..], self.options, &fragments.definitions);

        // A new label may resolve links inside the reused blocks
        if let Some(label) = built
            .definitions
            .keys()
            .find(|label| !fragments.definitions.contains_key(*label))
        {
            crate::debug!("parse"; "new reference `{}`, full re-parse", label);
            return self.parse_full(text).with_mode(ParseMode::Fallback);
        }

        let reused = fragments.blocks.len();
        let mut blocks = Vec::with_capacity(reused + built.blocks.len());
        blocks.extend(fragments.blocks.iter().cloned());
        blocks.extend(built.blocks.into_iter().map(|mut block| {
            block.shift(from);
            Rc::new(block)
        }));

        let definitions = if built.definitions.is_empty() {
            Rc::clone(&fragments.definitions)
        } else {
            // first definition wins, as in a full parse
            let mut merged = (*fragments.definitions).clone();
            for (label, target) in built.definitions {
                merged.entry(label).or_insert(target);
            }
            Rc::new(merged)
        };

        Tree::new(
            blocks,
            text.len(),
            definitions,
            ParseMode::Incremental { reused, from },
        )
    }

    fn fragments(&self, tree: &Tree, changes: &[ChangedRange]) -> Fragments {
        let edit_from = changes
            .iter()
            .map(|c| c.from_a)
            .min()
            .unwrap_or(tree.text_len());

        // The last block may still be open; it is never reused
        let blocks = tree.blocks();
        let candidates = &blocks[..blocks.len().saturating_sub(1)];
        let mut keep = candidates.partition_point(|b| b.to() <= edit_from);

        // A list before the tail can still absorb it as a further item
        // (`1. a\n\n2` + `. b`), so re-parse it along with the tail
        if keep > 0
            && matches!(
                candidates[keep - 1].kind,
                NodeKind::BulletList | NodeKind::OrderedList { .. }
            )
        {
            keep -= 1;
        }
        let kept = &candidates[..keep];

        Fragments {
            blocks: kept.to_vec(),
            reuse_to: kept.last().map_or(0, |b| b.to()),
            definitions: Rc::clone(tree.definitions()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reparse(parser: &MarkdownParser, old: &str, chunk: &str) -> (Tree, String) {
        let tree = parser.parse_full(old);
        let text = format!("{old}{chunk}");
        let change = ChangedRange::append(old.len(), chunk.len());
        let fragments = parser.fragments(&tree, &[change]);
        (parser.parse_incremental(&text, &fragments), text)
    }

    fn shape(tree: &Tree) -> Vec<(NodeKind, usize, usize)> {
        tree.blocks()
            .iter()
            .map(|b| (b.kind, b.from(), b.to()))
            .collect()
    }

    #[test]
    fn test_fragments_exclude_last_block() {
        let parser = MarkdownParser::default();
        let tree = parser.parse_full("a\n\nb\n\nc");
        let fragments = parser.fragments(&tree, &[ChangedRange::append(7, 1)]);
        assert_eq!(fragments.blocks.len(), 2);
        assert_eq!(fragments.reuse_to, tree.blocks()[1].to());
    }

    #[test]
    fn test_fragments_exclude_list_before_last_block() {
        let parser = MarkdownParser::default();
        let tree = parser.parse_full("p\n\n1. a\n\n2");
        assert_eq!(tree.blocks().len(), 3);
        let fragments = parser.fragments(&tree, &[ChangedRange::append(10, 1)]);
        assert_eq!(fragments.blocks.len(), 1);
        assert_eq!(fragments.reuse_to, tree.blocks()[0].to());
    }

    #[test]
    fn test_incremental_matches_full() {
        let parser = MarkdownParser::default();
        let cases = [
            ("# Hello", " world"),
            ("para\n\n- a\n- b", "\n- c"),
            ("one\n\ntwo", "\n===\n\nthree"),
            ("a | b\n", "--|--\n1 | 2"),
            ("text\n\n```rust\nfn", " main() {}\n```\n\nafter"),
            ("1. a\n\n2", ". b"),
            ("1. a\n\n2", ". b\n\nx"),
            ("1) a\n\n2) b\n\n3", ") c"),
            ("* a\n\n*", " b\n\n* c"),
        ];
        for (old, chunk) in cases {
            let (incremental, text) = reparse(&parser, old, chunk);
            let full = parser.parse_full(&text);
            assert_eq!(shape(&incremental), shape(&full), "case {old:?} + {chunk:?}");
            for (a, b) in incremental.blocks().iter().zip(full.blocks()) {
                assert_eq!(**a, **b);
            }
        }
    }

    #[test]
    fn test_incremental_reuses_blocks() {
        let parser = MarkdownParser::default();
        let (tree, _) = reparse(&parser, "a\n\nb\n\nc", "d");
        assert!(matches!(tree.mode(), ParseMode::Incremental { reused: 2, .. }));
    }

    #[test]
    fn test_new_definition_falls_back_to_full() {
        let parser = MarkdownParser::default();
        let (tree, _) = reparse(&parser, "see [r]\n\npara", "\n\n[r]: https://r.example\n");
        assert_eq!(tree.mode(), ParseMode::Fallback);
        assert_eq!(tree.blocks()[0].children[0].kind, NodeKind::Link);
    }

    #[test]
    fn test_reused_definitions_resolve_tail() {
        let parser = MarkdownParser::default();
        let (tree, _) = reparse(&parser, "[r]: https://r.example\n\nfirst\n\nsecond", " [r]");
        assert!(matches!(tree.mode(), ParseMode::Incremental { .. }));
        let last = tree.blocks().last().unwrap();
        assert!(last.children.iter().any(|c| c.kind == NodeKind::Link));
    }
}
