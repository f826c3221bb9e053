//! llbdump core - decoding and rendering of BuildKit LLB definitions.
//!
//! A definition is a list of serialized ops plus metadata keyed by op
//! digest. This crate decodes it, joins the metadata, indexes the ops as a
//! graph and renders the result.
//!
//! # Features
//!
//! - **Content addressing**: every op is identified by the SHA-256 of its blob
//! - **Lenient graph**: dangling references and cycles are reported, never fatal
//! - **Formats**: raw bytes, JSON records (streamed), YAML records, Graphviz DOT
//! - **Highlighting**: optional 24-bit terminal colors for YAML output
//!
//! # Usage
//!
//! ```no_run
//! use llbdump_core::{ColorMode, Dumper, Format};
//! use std::io::IsTerminal;
//!
//! # fn main() -> llbdump_core::Result<()> {
//! let bytes = std::fs::read("build.llb")?;
//! let stdout = std::io::stdout();
//! Dumper::new(Format::Graph)
//!     .with_color(ColorMode::Auto)
//!     .dump(&bytes, &mut stdout.lock(), || stdout.is_terminal())?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod decoder;
pub mod digest;
pub mod error;
pub mod exporter;
pub mod graph;
pub mod highlight;
pub mod label;
pub mod metadata;
pub mod pb;
pub mod types;

pub use builder::{DefinitionBuilder, OpRef};
pub use decoder::{decode_definition, decode_ops, DecodedOp};
pub use digest::Digest;
pub use error::{DumpError, Result};
pub use exporter::{Dumper, Format};
pub use graph::{LlbGraph, ResolvedInput};
pub use highlight::{ColorMode, Highlighter};
pub use label::{edge_label, resolve_label, NodeLabel, Shape};
pub use metadata::{join_metadata, MetadataMap};
pub use types::{OpKind, OpRecord};
