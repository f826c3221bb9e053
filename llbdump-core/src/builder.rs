//! Assembles definitions from ops.
//!
//! Each pushed op is marshalled once; its digest is computed over exactly
//! the bytes stored in the definition, so references stay valid after a
//! decode round trip.

use std::collections::BTreeMap;

use prost::Message;

use crate::digest::Digest;
use crate::pb::{self, Definition, OpMetadata};

/// Handle to an op already added to a [`DefinitionBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpRef {
    digest: Digest,
}

impl OpRef {
    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    /// Reference to output `index` of this op, for use as another op's input.
    pub fn output(&self, index: i64) -> pb::Input {
        pb::Input {
            digest: self.digest.to_string(),
            index,
        }
    }
}

#[derive(Debug, Default)]
pub struct DefinitionBuilder {
    def: Vec<Vec<u8>>,
    metadata: BTreeMap<String, OpMetadata>,
}

impl DefinitionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an op and its metadata.
    ///
    /// Identical ops share one blob; metadata of the first push wins.
    /// Default metadata is not stored.
    pub fn push(&mut self, op: &pb::Op, metadata: OpMetadata) -> OpRef {
        let blob = op.encode_to_vec();
        let digest = Digest::from_bytes(&blob);

        if self.metadata.contains_key(digest.as_str()) || self.def.contains(&blob) {
            tracing::debug!(%digest, "op already in definition");
            return OpRef { digest };
        }

        self.def.push(blob);
        if metadata != OpMetadata::default() {
            self.metadata.insert(digest.to_string(), metadata);
        }
        OpRef { digest }
    }

    pub fn len(&self) -> usize {
        self.def.len()
    }

    pub fn is_empty(&self) -> bool {
        self.def.is_empty()
    }

    /// Finish the definition.
    ///
    /// With a `head`, a terminal op (no variant, one input) pointing at it is
    /// appended, the way BuildKit marks the result of a build.
    pub fn build(mut self, head: Option<pb::Input>) -> Definition {
        if let Some(head) = head {
            let terminal = pb::Op {
                inputs: vec![head],
                ..Default::default()
            };
            self.push(&terminal, OpMetadata::default());
        }
        Definition {
            def: self.def,
            metadata: self.metadata,
        }
    }
}
