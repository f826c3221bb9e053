//! Metadata joiner.

use std::collections::BTreeMap;

use crate::decoder::DecodedOp;
use crate::pb::OpMetadata;
use crate::types::OpRecord;

/// Digest-keyed side metadata, as carried by a definition.
pub type MetadataMap = BTreeMap<String, OpMetadata>;

/// Attach each op's metadata by digest.
///
/// Ops without an entry get `OpMetadata::default()`; that is the normal case
/// for ops nobody annotated, not an error.
pub fn join_metadata(decoded: Vec<DecodedOp>, metadata: &MetadataMap) -> Vec<OpRecord> {
    let mut missing = 0usize;
    let records: Vec<OpRecord> = decoded
        .into_iter()
        .map(|DecodedOp { digest, op }| {
            let metadata = match metadata.get(digest.as_str()) {
                Some(found) => found.clone(),
                None => {
                    missing += 1;
                    OpMetadata::default()
                }
            };
            OpRecord {
                op,
                digest,
                metadata,
            }
        })
        .collect();

    tracing::debug!(
        records = records.len(),
        without_metadata = missing,
        "joined op metadata"
    );
    records
}
