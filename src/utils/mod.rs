//! Utility modules shared by the renderer and the CLI.

pub mod html;
pub mod url;
