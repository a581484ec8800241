//! Reconciliation engine: syntax tree → render target.
//!
//! - [`schema`] - kind → element template, render function, cleanup hook
//! - [`reconcile`] - top-level and container block alignment
//! - [`blocks`] - built-in render functions per structural kind
//! - [`inline`] - formatting tree for one block's inline region
//! - [`patch`] - minimal patching of an element against a formatting tree
//! - [`context`] - state threaded through a pass

pub mod blocks;
pub mod context;
pub mod inline;
pub mod patch;
pub mod reconcile;
pub mod schema;

pub use context::{PassStats, RenderContext};
pub use inline::{FormatNode, build_tree};
pub use patch::patch_children;
pub use reconcile::{Checkpoint, PassSummary, Reconciler, reconcile_children};
pub use schema::{BlockKind, BlockSpec, CleanupFn, MarkKind, MarkSpec, RenderFn, Schema, Template};
