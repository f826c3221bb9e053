//! Record decoder: op blobs to digest-addressed ops.

use prost::Message;

use crate::digest::Digest;
use crate::error::{DumpError, Result};
use crate::pb::{Definition, Op};

/// An op decoded from one blob, addressed by the digest of that blob.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedOp {
    pub digest: Digest,
    pub op: Op,
}

/// Decode the outer definition container.
pub fn decode_definition(bytes: &[u8]) -> Result<Definition> {
    Definition::decode(bytes).map_err(DumpError::InvalidDefinition)
}

/// Decode every blob in order.
///
/// The digest is taken over the raw blob, never over a re-encoding, so it
/// matches the digests other ops use to reference this one. Referential
/// completeness of `inputs` is not checked here.
pub fn decode_ops<B: AsRef<[u8]>>(blobs: &[B]) -> Result<Vec<DecodedOp>> {
    let decoded = blobs
        .iter()
        .enumerate()
        .map(|(index, blob)| {
            let bytes = blob.as_ref();
            let op = Op::decode(bytes).map_err(|source| DumpError::Decode { index, source })?;
            Ok(DecodedOp {
                digest: Digest::from_bytes(bytes),
                op,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(ops = decoded.len(), "decoded definition ops");
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pb;

    fn source_blob(identifier: &str) -> Vec<u8> {
        pb::Op {
            op: Some(pb::op::Op::Source(pb::SourceOp {
                identifier: identifier.to_string(),
                ..Default::default()
            })),
            ..Default::default()
        }
        .encode_to_vec()
    }

    #[test]
    fn test_decode_preserves_order_and_digests() {
        let blobs = vec![source_blob("local://a"), source_blob("local://b")];
        let decoded = decode_ops(&blobs).unwrap();

        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].digest, Digest::from_bytes(&blobs[0]));
        assert_eq!(decoded[1].digest, Digest::from_bytes(&blobs[1]));
        match &decoded[1].op.op {
            Some(pb::op::Op::Source(src)) => assert_eq!(src.identifier, "local://b"),
            _ => panic!("expected a source op"),
        }
    }

    #[test]
    fn test_same_bytes_same_digest() {
        let blob = source_blob("docker-image://alpine");
        let first = decode_ops(&[blob.clone()]).unwrap();
        let second = decode_ops(&[blob]).unwrap();
        assert_eq!(first[0].digest, second[0].digest);
    }

    #[test]
    fn test_decode_error_reports_index() {
        let blobs = vec![source_blob("local://a"), vec![0xff, 0xff, 0xff]];
        let err = decode_ops(&blobs).unwrap_err();
        match err {
            DumpError::Decode { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_definition() {
        let err = decode_definition(&[0x0a, 0x05, 0x01]).unwrap_err();
        assert!(matches!(err, DumpError::InvalidDefinition(_)));
    }
}
