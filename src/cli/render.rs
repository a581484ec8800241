//! `render`: one-shot render of a whole file.

use std::path::Path;

use anyhow::Result;
use inkstream::{Config, Dom, Options, debug, render_once};

use super::OutputArgs;
use super::common::{format_output, read_input};

pub fn render_file(path: &Path, output: OutputArgs, config: &Config) -> Result<()> {
    let text = read_input(path)?;
    let options = Options::<Dom>::from_config(config)?;

    let mut dom = Dom::new();
    let root = dom.root();
    let report = render_once(&mut dom, &root, &text, &options)?;
    debug!(
        "render";
        "{} block(s), {} node(s) created",
        report.summary.rendered,
        report.stats.created
    );

    println!("{}", format_output(&dom, output)?);
    Ok(())
}
