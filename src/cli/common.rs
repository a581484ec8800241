//! Common utilities shared across CLI commands.

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use inkstream::{Config, Dom, debug};

use super::{Cli, OutputArgs};

/// Config file picked up from the working directory when `-C` is absent.
const DEFAULT_CONFIG: &str = "inkstream.toml";

/// Load the configuration named on the command line, or the default file
/// when it exists.
pub fn load_config(cli: &Cli) -> Result<Config> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG);
            if !default.is_file() {
                debug!("config"; "no {}, using defaults", DEFAULT_CONFIG);
                return Ok(Config::default());
            }
            default
        }
    };
    Config::load(&path).with_context(|| format!("failed to load config `{}`", path.display()))
}

/// Read the whole input; `-` reads stdin.
pub fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read `{}`", path.display()))
}

/// Serialize the children of the root in the requested format.
pub fn format_output(dom: &Dom, output: OutputArgs) -> Result<String> {
    let root = dom.root();
    if !output.json {
        return Ok(dom.inner_html(&root));
    }
    let snapshot = dom.to_json(&root);
    let children = snapshot
        .get("children")
        .cloned()
        .unwrap_or_else(|| serde_json::Value::Array(Vec::new()));
    serde_json::to_string_pretty(&children).context("failed to serialize tree")
}

/// Split `text` into chunks of at least `size` bytes, never inside a char.
pub fn split_chunks(text: &str, size: usize) -> Vec<&str> {
    let size = size.max(1);
    let mut chunks = Vec::with_capacity(text.len() / size + 1);
    let mut start = 0;
    while start < text.len() {
        let mut end = (start + size).min(text.len());
        while !text.is_char_boundary(end) {
            end += 1;
        }
        chunks.push(&text[start..end]);
        start = end;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_chunks_ascii() {
        assert_eq!(split_chunks("abcde", 2), vec!["ab", "cd", "e"]);
        assert!(split_chunks("", 4).is_empty());
        assert_eq!(split_chunks("ab", 0), vec!["a", "b"]);
    }

    #[test]
    fn test_split_chunks_respects_char_boundaries() {
        let text = "aé😀b";
        let chunks = split_chunks(text, 2);
        assert_eq!(chunks.concat(), text);
        assert!(chunks.iter().all(|c| !c.is_empty()));
        assert_eq!(chunks[0], "a\u{e9}");
    }

    #[test]
    fn test_read_input_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_input(&dir.path().join("nope.md")).unwrap_err();
        assert!(err.to_string().contains("nope.md"));
    }

    #[test]
    fn test_read_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "# hi").unwrap();
        assert_eq!(read_input(&path).unwrap(), "# hi");
    }

    #[test]
    fn test_format_output_json() {
        let mut dom = Dom::new();
        let root = dom.root();
        inkstream::render_once(&mut dom, &root, "# a", &inkstream::Options::default()).unwrap();
        let json = format_output(&dom, OutputArgs { json: true }).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["tag"], "h1");
        assert_eq!(value[0]["children"][0], "a");
        assert_eq!(format_output(&dom, OutputArgs { json: false }).unwrap(), "<h1>a</h1>");
    }
}
