//! Decoded graph records.

use std::fmt;

use serde::Serialize;

use crate::digest::Digest;
use crate::pb::{self, OpMetadata};

/// One node of the build graph: the decoded op, its content digest and the
/// metadata joined from the definition.
///
/// Serializes with the field names used by `buildctl debug dump-llb`, so
/// existing `jq` filters keep working on `records-json` output.
#[derive(Clone, PartialEq, Serialize)]
pub struct OpRecord {
    #[serde(rename = "Op")]
    pub op: pb::Op,
    #[serde(rename = "Digest")]
    pub digest: Digest,
    #[serde(rename = "OpMetadata")]
    pub metadata: OpMetadata,
}

impl OpRecord {
    pub fn kind(&self) -> OpKind {
        OpKind::of(&self.op)
    }

    /// Declared inputs in positional order.
    pub fn inputs(&self) -> &[pb::Input] {
        &self.op.inputs
    }
}

impl fmt::Debug for OpRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpRecord")
            .field("digest", &self.digest)
            .field("kind", &self.kind())
            .field("inputs", &self.op.inputs.len())
            .finish()
    }
}

/// Operation kind tag, used for logging and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Exec,
    Source,
    File,
    Build,
    Merge,
    Diff,
    /// No known op variant (e.g. the terminal node of a definition).
    Unknown,
}

impl OpKind {
    pub fn of(op: &pb::Op) -> Self {
        match &op.op {
            Some(pb::op::Op::Exec(_)) => OpKind::Exec,
            Some(pb::op::Op::Source(_)) => OpKind::Source,
            Some(pb::op::Op::File(_)) => OpKind::File,
            Some(pb::op::Op::Build(_)) => OpKind::Build,
            Some(pb::op::Op::Merge(_)) => OpKind::Merge,
            Some(pb::op::Op::Diff(_)) => OpKind::Diff,
            None => OpKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Exec => "exec",
            OpKind::Source => "source",
            OpKind::File => "file",
            OpKind::Build => "build",
            OpKind::Merge => "merge",
            OpKind::Diff => "diff",
            OpKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
