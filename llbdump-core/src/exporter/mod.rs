//! Output formats and the dump entry point.
//!
//! `raw` is chosen before anything is decoded. Every other format decodes
//! the definition, builds an [`LlbGraph`] and hands it to its renderer.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use prost::Message;

use crate::decoder::decode_definition;
use crate::error::{DumpError, Result};
use crate::graph::LlbGraph;
use crate::highlight::{ColorMode, Highlighter};
use crate::pb::Definition;

pub mod dot;
pub mod json;
pub mod raw;
pub mod yaml;

/// Output format of a dump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Definition bytes, untouched
    #[default]
    Raw,
    /// Newline-delimited JSON records
    RecordsJson,
    /// YAML documents, one per record
    RecordsYaml,
    /// Graphviz DOT
    Graph,
}

impl Format {
    pub const ALL: [Format; 4] = [
        Format::Raw,
        Format::RecordsJson,
        Format::RecordsYaml,
        Format::Graph,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Raw => "raw",
            Format::RecordsJson => "records-json",
            Format::RecordsYaml => "records-yaml",
            Format::Graph => "graph",
        }
    }
}

impl FromStr for Format {
    type Err = DumpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "raw" | "llb" => Ok(Format::Raw),
            "records-json" | "json" => Ok(Format::RecordsJson),
            "records-yaml" | "yaml" => Ok(Format::RecordsYaml),
            "graph" | "dot" => Ok(Format::Graph),
            _ => Err(DumpError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders definitions in one format.
pub struct Dumper {
    format: Format,
    color: ColorMode,
    highlighter: Option<Highlighter>,
}

impl Dumper {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            color: ColorMode::default(),
            highlighter: None,
        }
    }

    /// Builder: set the color mode (only `records-yaml` is colored)
    pub fn with_color(mut self, color: ColorMode) -> Self {
        self.color = color;
        self
    }

    /// Builder: use a specific highlighter
    pub fn with_highlighter(mut self, highlighter: Highlighter) -> Self {
        self.highlighter = Some(highlighter);
        self
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Dump serialized definition bytes.
    ///
    /// `is_terminal` is consulted at most once, after the YAML buffer is
    /// complete, and only under [`ColorMode::Auto`].
    pub fn dump<W: Write>(
        &self,
        input: &[u8],
        out: &mut W,
        is_terminal: impl FnOnce() -> bool,
    ) -> Result<()> {
        if self.format == Format::Raw {
            return raw::write(input, out);
        }
        let def = decode_definition(input)?;
        self.render(&def, out, is_terminal)
    }

    /// Dump an in-memory definition. `raw` writes its wire encoding.
    pub fn dump_definition<W: Write>(
        &self,
        def: &Definition,
        out: &mut W,
        is_terminal: impl FnOnce() -> bool,
    ) -> Result<()> {
        self.render(def, out, is_terminal)
    }

    fn render<W: Write>(
        &self,
        def: &Definition,
        out: &mut W,
        is_terminal: impl FnOnce() -> bool,
    ) -> Result<()> {
        match self.format {
            Format::Raw => raw::write(&def.encode_to_vec(), out),
            Format::RecordsJson => json::write(&self.graph(def)?, out),
            Format::RecordsYaml => {
                let text = yaml::render(&self.graph(def)?)?;
                if self.color.resolve(is_terminal) {
                    match &self.highlighter {
                        Some(highlighter) => highlighter.write_yaml(&text, out)?,
                        None => Highlighter::new().write_yaml(&text, out)?,
                    }
                } else {
                    out.write_all(text.as_bytes())?;
                }
                out.flush()?;
                Ok(())
            }
            Format::Graph => dot::write(&self.graph(def)?, out),
        }
    }

    fn graph(&self, def: &Definition) -> Result<LlbGraph> {
        let graph = LlbGraph::from_definition(def)?;
        tracing::debug!(
            format = %self.format,
            nodes = graph.len(),
            edges = graph.edge_count(),
            "rendering definition"
        );
        Ok(graph)
    }
}
