//! Renderer handle: owns the syntax source, the reconciliation state and
//! the render target, and runs one parse-and-patch cycle per call.
//!
//! ```ignore
//! let text = SharedText::default();
//! let mut renderer = Renderer::new(Dom::new(), root, text.clone(), Options::default())
//!     .with_sink(text.clone());
//! renderer.render()?;
//! renderer.append("# Hello")?;
//! renderer.append(" world")?;
//! ```
//!
//! Calls are synchronous and must be serialized: each one finishes its
//! cycle before returning, and appends apply in call order.

mod text;

pub use text::{SharedText, TextSink, TextSource, TextUpdate};

use crate::config::{Config, ConfigError, ScrollConfig};
use crate::debug;
use crate::error::{Error, Result};
use crate::logger::is_verbose;
use crate::render::{PassStats, PassSummary, Reconciler, RenderContext, Schema};
use crate::syntax::{IncrementalParser, MarkdownParser, ParseMode, SyntaxSource, Tree};
use crate::target::{RenderTarget, StampTable, TargetRoot};

// =============================================================================
// Options
// =============================================================================

/// Construction options.
pub struct Options<T: RenderTarget> {
    pub parser: Box<dyn IncrementalParser>,
    pub schema: Schema<T>,
    pub scroll: ScrollConfig,
}

impl<T: RenderTarget> Default for Options<T> {
    fn default() -> Self {
        Self {
            parser: Box::new(MarkdownParser::default()),
            schema: Schema::builtin(),
            scroll: ScrollConfig::default(),
        }
    }
}

impl<T: RenderTarget> Options<T> {
    /// Parser dialect, schema overrides and scroll settings from config.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            parser: Box::new(MarkdownParser::from_config(&config.parser)),
            schema: Schema::builtin().apply_overrides(&config.schema)?,
            scroll: config.scroll,
        })
    }

    pub fn with_schema(mut self, schema: Schema<T>) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_parser(mut self, parser: impl IncrementalParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Ask the host to bring `node` into view, keeping `offset` pixels below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollRequest<N> {
    pub node: N,
    pub offset: u32,
}

/// Outcome of one parse-and-patch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport<N> {
    pub summary: PassSummary,
    pub stats: PassStats,
    pub mode: ParseMode,
    /// Set when scroll hints are enabled and the document is not empty
    pub scroll: Option<ScrollRequest<N>>,
}

impl<N> PassReport<N> {
    /// Whether every block was parsed from scratch.
    pub fn full_parse(&self) -> bool {
        matches!(self.mode, ParseMode::Full | ParseMode::Fallback)
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// Incremental renderer bound to one render target.
pub struct Renderer<T: RenderTarget> {
    target: T,
    root: TargetRoot<T::Node>,
    source: SyntaxSource,
    schema: Schema<T>,
    scroll: ScrollConfig,
    stamps: StampTable<T::Node>,
    reconciler: Reconciler,
    text: Box<dyn TextSource>,
    sink: Option<Box<dyn TextSink>>,
}

impl<T: RenderTarget> Renderer<T> {
    /// Construct without parsing. Call [`render`](Self::render) before the
    /// first [`append`](Self::append).
    pub fn new(
        target: T,
        root: impl Into<TargetRoot<T::Node>>,
        text: impl TextSource + 'static,
        options: Options<T>,
    ) -> Self {
        Self {
            target,
            root: root.into(),
            source: SyntaxSource::new(options.parser),
            schema: options.schema,
            scroll: options.scroll,
            stamps: StampTable::new(),
            reconciler: Reconciler::new(),
            text: Box::new(text),
            sink: None,
        }
    }

    /// Construct, parse the accessor's text and run the first pass.
    pub fn init(
        target: T,
        root: impl Into<TargetRoot<T::Node>>,
        text: impl TextSource + 'static,
        sink: Option<Box<dyn TextSink>>,
        options: Options<T>,
    ) -> Result<Self> {
        let mut renderer = Self::new(target, root, text, options);
        renderer.sink = sink;
        renderer.render()?;
        Ok(renderer)
    }

    /// Report every edit to `sink`.
    pub fn with_sink(mut self, sink: impl TextSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Cold parse of the accessor's current text, then a full pass.
    pub fn render(&mut self) -> Result<PassReport<T::Node>> {
        let text = self.text.read();
        self.source.parse_full(text);
        self.reset();
        self.pass()
    }

    /// Append `chunk` to the document and patch the render target.
    pub fn append(&mut self, chunk: &str) -> Result<PassReport<T::Node>> {
        if !self.source.is_initialized() {
            return Err(Error::Uninitialized);
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.update(TextUpdate::Append(chunk));
        }

        let mode = self.source.apply_append(chunk)?.mode();
        if mode == ParseMode::Fallback {
            // earlier blocks may have changed without changing their spans
            self.reset();
        }

        let report = self.pass()?;
        if is_verbose() {
            self.check_accessor();
        }
        Ok(report)
    }

    /// Replace the whole document and re-render from scratch.
    pub fn replace_text(&mut self, text: &str) -> Result<PassReport<T::Node>> {
        if let Some(sink) = self.sink.as_mut() {
            sink.update(TextUpdate::Replace(text));
        }
        self.source.parse_full(text);
        self.reset();
        self.pass()
    }

    /// Point at a different root and run a full pass against it.
    pub fn set_target(
        &mut self,
        root: impl Into<TargetRoot<T::Node>>,
    ) -> Result<PassReport<T::Node>> {
        self.root = root.into();
        self.reset();
        self.pass()
    }

    #[inline]
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Host access to the tree. Edits made here may desync the renderer.
    #[inline]
    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn into_target(self) -> T {
        self.target
    }

    /// Resolve the current root.
    pub fn root(&self) -> Option<T::Node> {
        self.root.resolve()
    }

    /// Text the current tree was parsed from.
    pub fn text(&self) -> &str {
        self.source.text()
    }

    pub fn tree(&self) -> Result<&Tree> {
        self.source.current_tree()
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    fn reset(&mut self) {
        self.reconciler.reset();
        self.stamps.clear();
    }

    fn pass(&mut self) -> Result<PassReport<T::Node>> {
        let root = self.root.resolve().ok_or(Error::NoTarget)?;
        let tree = self.source.current_tree()?;
        let blocks = tree.rendered_blocks();
        let mode = tree.mode();

        let mut cx = RenderContext::new(
            &mut self.target,
            &self.schema,
            &mut self.stamps,
            self.source.text(),
        );
        let result = self.reconciler.reconcile(&mut cx, &root, &blocks);
        let stats = cx.stats;

        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                // the next pass must not trust anything this one touched
                self.reconciler.reset();
                self.stamps.clear();
                return Err(e);
            }
        };

        debug!(
            "render";
            "{:?}: blocks {}..{}, {} created, {} removed, {} skipped",
            mode,
            summary.first,
            summary.first + summary.rendered,
            stats.created,
            stats.removed,
            stats.skipped
        );

        let scroll = match blocks.len().checked_sub(1) {
            Some(last) if self.scroll.enabled => self
                .target
                .child_at(&root, last)
                .map(|node| ScrollRequest {
                    node,
                    offset: self.scroll.offset,
                }),
            _ => None,
        };

        Ok(PassReport {
            summary,
            stats,
            mode,
            scroll,
        })
    }

    /// The accessor must agree with the engine's offsets after an append.
    fn check_accessor(&self) {
        let external = self.text.read();
        if external.len() != self.source.text().len() {
            debug!(
                "render";
                "text accessor out of sync: {} bytes, engine has {}",
                external.len(),
                self.source.text().len()
            );
        }
    }
}

/// One-shot render of `text` into `root`.
pub fn render_once<T: RenderTarget>(
    target: &mut T,
    root: &T::Node,
    text: &str,
    options: &Options<T>,
) -> Result<PassReport<T::Node>> {
    let tree = options.parser.parse_full(text);
    let blocks = tree.rendered_blocks();

    let mut stamps = StampTable::new();
    let mut cx = RenderContext::new(target, &options.schema, &mut stamps, text);
    let summary = Reconciler::new().reconcile(&mut cx, root, &blocks)?;
    let stats = cx.stats;

    let scroll = match blocks.len().checked_sub(1) {
        Some(last) if options.scroll.enabled => {
            target.child_at(root, last).map(|node| ScrollRequest {
                node,
                offset: options.scroll.offset,
            })
        }
        _ => None,
    };

    Ok(PassReport {
        summary,
        stats,
        mode: tree.mode(),
        scroll,
    })
}
