//! `stream`: feed a file through the incremental renderer chunk by chunk.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use inkstream::logger::ProgressLine;
use inkstream::render::PassStats;
use inkstream::{Config, Dom, Options, Renderer, SharedText, debug, log, render_once};

use super::common::{format_output, read_input, split_chunks};
use super::{OutputArgs, StreamArgs};

pub fn stream_file(path: &Path, args: StreamArgs, output: OutputArgs, config: &Config) -> Result<()> {
    let text = read_input(path)?;
    let chunks = split_chunks(&text, args.chunk);

    let shared = SharedText::default();
    let dom = Dom::new();
    let root = dom.root();
    let mut renderer = Renderer::new(dom, root, shared.clone(), Options::from_config(config)?)
        .with_sink(shared.clone());
    renderer.render()?;

    let start = Instant::now();
    let mut totals = PassStats::default();
    let mut fallbacks = 0;
    let progress = ProgressLine::new(&[("bytes", text.len()), ("chunks", chunks.len())]);
    for chunk in &chunks {
        let report = renderer.append(chunk)?;
        totals.created += report.stats.created;
        totals.removed += report.stats.removed;
        totals.skipped += report.stats.skipped;
        if report.full_parse() {
            fallbacks += 1;
        }
        debug!(
            "stream";
            "+{} bytes: first block {}, {} created, {} removed",
            chunk.len(),
            report.summary.first,
            report.stats.created,
            report.stats.removed
        );

        progress.advance("bytes", chunk.len());
        progress.inc("chunks");
        if args.delay_ms > 0 {
            thread::sleep(Duration::from_millis(args.delay_ms));
        }
    }
    progress.finish();

    log!(
        "stream";
        "{} chunk(s) in {:.1?}: {} created, {} removed, {} skipped, {} full re-parse(s)",
        chunks.len(),
        start.elapsed(),
        totals.created,
        totals.removed,
        totals.skipped,
        fallbacks
    );

    if args.check {
        check_against_one_shot(renderer.target(), &text, config)?;
        log!("check"; "streamed tree matches one-shot render");
    }

    println!("{}", format_output(renderer.target(), output)?);
    Ok(())
}

/// The streamed tree must equal a fresh render of the final text.
fn check_against_one_shot(streamed: &Dom, text: &str, config: &Config) -> Result<()> {
    let mut fresh = Dom::new();
    let root = fresh.root();
    render_once(&mut fresh, &root, text, &Options::from_config(config)?)?;

    let expected = fresh.inner_html(&root);
    let actual = streamed.inner_html(&streamed.root());
    if expected != actual {
        let at = expected
            .bytes()
            .zip(actual.bytes())
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| expected.len().min(actual.len()));
        bail!("streamed output diverges from one-shot render at byte {at}");
    }
    Ok(())
}
