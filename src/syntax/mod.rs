//! Syntax layer: markdown text → [`Tree`] of [`SyntaxNode`]s.
//!
//! - [`node`] - node kinds, spans, the node type itself
//! - [`build`] - folds `pulldown-cmark` offset events into nodes
//! - [`parser`] - [`IncrementalParser`] seam and [`MarkdownParser`]
//! - [`source`] - [`SyntaxSource`], the append-only adapter the renderer owns

pub mod build;
pub mod node;
pub mod parser;
pub mod source;
pub mod tree;

pub use build::{Definitions, normalize_label};
pub use node::{LinkTarget, NodeClass, NodeKind, Span, SyntaxNode};
pub use parser::{ChangedRange, Fragments, IncrementalParser, MarkdownParser};
pub use source::SyntaxSource;
pub use tree::{ParseMode, Tree};
