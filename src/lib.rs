//! inkstream - incremental markdown rendering for append-only text streams.
//!
//! Each appended chunk is re-parsed from the last stable block boundary and
//! the render target is patched in place: completed blocks keep their
//! element identity, and only the growing tail is touched.
//!
//! - [`syntax`] - incremental parser and syntax tree
//! - [`render`] - schema, block reconciler and inline patcher
//! - [`target`] - render target seam and the built-in [`Dom`]
//! - [`renderer`] - the [`Renderer`] handle tying them together

pub mod config;
pub mod error;
pub mod logger;
pub mod render;
pub mod renderer;
pub mod syntax;
pub mod target;
pub mod utils;

pub use config::Config;
pub use error::{Error, Result};
pub use render::Schema;
pub use renderer::{
    Options, PassReport, Renderer, ScrollRequest, SharedText, TextSink, TextSource, TextUpdate,
    render_once,
};
pub use syntax::{MarkdownParser, ParseMode};
pub use target::{Dom, NodeId, RenderTarget, TargetRoot};
