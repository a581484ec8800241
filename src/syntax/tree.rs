//! Parsed document snapshot.

use std::rc::Rc;

use super::build::Definitions;
use super::node::{NodeKind, SyntaxNode};

/// How a [`Tree`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Cold parse of the whole text
    Full,
    /// `reused` leading blocks kept, the rest re-parsed from byte `from`
    Incremental { reused: usize, from: usize },
    /// Incremental parse abandoned for a full one (new reference definition)
    Fallback,
}

/// A parsed document: ordered top-level blocks plus the reference
/// definitions seen so far.
///
/// Top-level blocks are shared (`Rc`) so an incremental parse can carry
/// unchanged blocks over without copying them.
#[derive(Debug, Clone)]
pub struct Tree {
    blocks: Vec<Rc<SyntaxNode>>,
    len: usize,
    definitions: Rc<Definitions>,
    mode: ParseMode,
}

impl Tree {
    pub fn new(
        blocks: Vec<Rc<SyntaxNode>>,
        len: usize,
        definitions: Rc<Definitions>,
        mode: ParseMode,
    ) -> Self {
        Self {
            blocks,
            len,
            definitions,
            mode,
        }
    }

    pub(crate) fn with_mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    /// Top-level children, in source order.
    #[inline]
    pub fn blocks(&self) -> &[Rc<SyntaxNode>] {
        &self.blocks
    }

    /// Top-level children that produce output (comments excluded).
    pub fn rendered_blocks(&self) -> Vec<&SyntaxNode> {
        self.blocks
            .iter()
            .map(Rc::as_ref)
            .filter(|b| b.kind != NodeKind::Comment)
            .collect()
    }

    /// Length of the parsed text in bytes.
    #[inline]
    pub fn text_len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn definitions(&self) -> &Rc<Definitions> {
        &self.definitions
    }

    #[inline]
    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    /// Whether every block was produced by this parse.
    pub fn is_full(&self) -> bool {
        matches!(self.mode, ParseMode::Full | ParseMode::Fallback)
    }
}
