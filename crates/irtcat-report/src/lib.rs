//! irtcat-report: HTML output for simulation runs.

pub mod html;

pub use html::{generate_html, write_html_report};
