//! Graph output: DOT text, JSON, and images through Graphviz

use crate::core::config::{GraphConfig, OutputFormat};
use crate::core::error::{Error, Result};
use crate::graph::Graph;
use std::fmt::Write as _;
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::debug;

// Quoted DOT string body.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}

impl Graph {
    /// Graphviz DOT source, left to right
    pub fn to_dot(&self) -> String {
        let mut dot = String::new();
        let _ = writeln!(dot, "digraph {{");
        let _ = writeln!(dot, "  graph [label=\"{}\", rankdir=LR];", escape(self.label()));
        for node in self.nodes() {
            let _ = writeln!(
                dot,
                "  \"{}\" [label=\"{}\", shape={}];",
                node.id,
                escape(&node.label),
                node.shape.as_dot()
            );
        }
        for edge in self.edges() {
            let _ = writeln!(dot, "  \"{}\" -> \"{}\";", edge.from, edge.to);
        }
        dot.push_str("}\n");
        dot
    }

    /// Pretty-printed JSON with `label`, `nodes` and `edges`
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Pipe DOT source through `dot_binary -T<format>` and return its output
pub fn render_image(dot_source: &str, format: OutputFormat, dot_binary: &str) -> Result<Vec<u8>> {
    debug!(binary = dot_binary, %format, "Rendering graph image");
    let mut child = Command::new(dot_binary)
        .arg(format!("-T{}", format.as_str()))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::render(format!("failed to run {}: {}", dot_binary, e)))?;

    // stdin is dropped before waiting so the child sees end of input.
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(dot_source.as_bytes()),
        None => Ok(()),
    };

    let output = child
        .wait_with_output()
        .map_err(|e| Error::render(format!("failed to wait for {}: {}", dot_binary, e)))?;
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        return Err(Error::render(format!(
            "{} exited with {}: {}",
            dot_binary,
            output.status,
            stderr.trim()
        )));
    }
    if let Err(e) = written {
        return Err(Error::render(format!(
            "{} did not read its input: {}: {}",
            dot_binary,
            e,
            stderr.trim()
        )));
    }
    Ok(output.stdout)
}

/// Render a graph in the configured format
pub fn render(graph: &Graph, config: &GraphConfig) -> Result<Vec<u8>> {
    match config.format {
        OutputFormat::Dot => Ok(graph.to_dot().into_bytes()),
        OutputFormat::Json => Ok(graph.to_json()?.into_bytes()),
        format => render_image(&graph.to_dot(), format, &config.dot_binary),
    }
}
