//! BuildKit LLB wire schema.
//!
//! Hand-written prost messages mirroring the subset of BuildKit's
//! `solver/pb/ops.proto` that the dumper decodes. Field tags match upstream so
//! definitions produced by `buildctl` or `docker buildx` decode unchanged;
//! fields outside this subset are skipped by prost on decode.
//!
//! Every message also derives `Serialize` so the record renderers can emit it
//! directly. Empty and zero-valued fields are omitted, mirroring the
//! `omitempty` behaviour of BuildKit's own JSON dumps.

use std::collections::BTreeMap;
use std::fmt;

use prost::{Enumeration, Message};
use serde::{Serialize, Serializer};

use crate::digest::Digest;

/// Marker index meaning "no input" (a scratch mount).
pub const EMPTY_INPUT: i64 = -1;

/// Serialized build graph: the ordered op blobs plus digest-keyed metadata.
#[derive(Clone, PartialEq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    #[prost(bytes = "vec", repeated, tag = "1")]
    #[serde(serialize_with = "blob_digests")]
    pub def: Vec<Vec<u8>>,
    #[prost(btree_map = "string, message", tag = "2")]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, OpMetadata>,
}

/// A single vertex of the build graph.
#[derive(Clone, PartialEq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Op {
    #[prost(message, repeated, tag = "1")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<Input>,
    #[prost(oneof = "op::Op", tags = "2, 3, 4, 5, 6, 7")]
    #[serde(flatten)]
    pub op: Option<op::Op>,
    #[prost(message, optional, tag = "10")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[prost(message, optional, tag = "11")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<WorkerConstraints>,
}

pub mod op {
    use serde::Serialize;

    /// The closed set of operation kinds.
    #[derive(Clone, PartialEq, prost::Oneof, Serialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Op {
        #[prost(message, tag = "2")]
        Exec(super::ExecOp),
        #[prost(message, tag = "3")]
        Source(super::SourceOp),
        #[prost(message, tag = "4")]
        File(super::FileOp),
        #[prost(message, tag = "5")]
        Build(super::BuildOp),
        #[prost(message, tag = "6")]
        Merge(super::MergeOp),
        #[prost(message, tag = "7")]
        Diff(super::DiffOp),
    }
}

/// Reference to one output of another op.
#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct Input {
    #[prost(string, tag = "1")]
    pub digest: String,
    #[prost(int64, tag = "2")]
    pub index: i64,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    #[prost(string, tag = "1")]
    pub architecture: String,
    #[prost(string, tag = "2")]
    pub os: String,
    #[prost(string, tag = "3")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub variant: String,
    #[prost(string, tag = "4")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub os_version: String,
    #[prost(string, repeated, tag = "5")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub os_features: Vec<String>,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct WorkerConstraints {
    #[prost(string, repeated, tag = "1")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<String>,
}

// ---------------------------------------------------------------------------
// Exec
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecOp {
    #[prost(message, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[prost(message, repeated, tag = "2")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<Mount>,
    #[prost(enumeration = "NetMode", tag = "3")]
    #[serde(serialize_with = "net_mode_name", skip_serializing_if = "is_zero_i32")]
    pub network: i32,
    #[prost(enumeration = "SecurityMode", tag = "4")]
    #[serde(serialize_with = "security_mode_name", skip_serializing_if = "is_zero_i32")]
    pub security: i32,
    #[prost(message, repeated, tag = "5")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secretenv: Vec<SecretEnv>,
}

/// Process description of an exec op.
#[derive(Clone, PartialEq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[prost(string, repeated, tag = "1")]
    pub args: Vec<String>,
    #[prost(string, repeated, tag = "2")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,
    #[prost(string, tag = "3")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cwd: String,
    #[prost(string, tag = "4")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user: String,
    #[prost(message, repeated, tag = "6")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_hosts: Vec<HostIp>,
    #[prost(string, tag = "7")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    #[prost(message, repeated, tag = "9")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ulimit: Vec<Ulimit>,
    #[prost(string, tag = "10")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cgroup_parent: String,
    #[prost(bool, tag = "11")]
    #[serde(skip_serializing_if = "is_false")]
    pub remove_mount_stubs_recursive: bool,
    #[prost(int32, repeated, tag = "12")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub valid_exit_codes: Vec<i32>,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct HostIp {
    #[prost(string, tag = "1")]
    pub host: String,
    #[prost(string, tag = "2")]
    pub ip: String,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct Ulimit {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(int64, tag = "2")]
    pub soft: i64,
    #[prost(int64, tag = "3")]
    pub hard: i64,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretEnv {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(bool, tag = "3")]
    #[serde(skip_serializing_if = "is_false")]
    pub optional: bool,
}

/// Filesystem binding of an exec op. `input` is a position in the op's
/// `inputs`, or [`EMPTY_INPUT`] for a scratch mount.
#[derive(Clone, PartialEq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mount {
    #[prost(int64, tag = "1")]
    pub input: i64,
    #[prost(string, tag = "2")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub selector: String,
    #[prost(string, tag = "3")]
    pub dest: String,
    #[prost(int64, tag = "4")]
    pub output: i64,
    #[prost(bool, tag = "5")]
    #[serde(skip_serializing_if = "is_false")]
    pub readonly: bool,
    #[prost(enumeration = "MountType", tag = "6")]
    #[serde(serialize_with = "mount_type_name", skip_serializing_if = "is_zero_i32")]
    pub mount_type: i32,
    #[prost(message, optional, tag = "19")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmpfs_opt: Option<TmpfsOpt>,
    #[prost(message, optional, tag = "20")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_opt: Option<CacheOpt>,
    #[prost(message, optional, tag = "21")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_opt: Option<SecretOpt>,
    #[prost(message, optional, tag = "22")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_opt: Option<SshOpt>,
    #[prost(string, tag = "23")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub result_id: String,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct TmpfsOpt {
    #[prost(int64, tag = "1")]
    pub size: i64,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct CacheOpt {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(enumeration = "CacheSharingOpt", tag = "2")]
    #[serde(serialize_with = "cache_sharing_name")]
    pub sharing: i32,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct SecretOpt {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(uint32, tag = "2")]
    pub uid: u32,
    #[prost(uint32, tag = "3")]
    pub gid: u32,
    #[prost(uint32, tag = "4")]
    pub mode: u32,
    #[prost(bool, tag = "5")]
    #[serde(skip_serializing_if = "is_false")]
    pub optional: bool,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct SshOpt {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(uint32, tag = "2")]
    pub uid: u32,
    #[prost(uint32, tag = "3")]
    pub gid: u32,
    #[prost(uint32, tag = "4")]
    pub mode: u32,
    #[prost(bool, tag = "5")]
    #[serde(skip_serializing_if = "is_false")]
    pub optional: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Enumeration)]
#[repr(i32)]
pub enum NetMode {
    Unset = 0,
    Host = 1,
    None = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Enumeration)]
#[repr(i32)]
pub enum SecurityMode {
    Sandbox = 0,
    Insecure = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Enumeration)]
#[repr(i32)]
pub enum MountType {
    Bind = 0,
    Secret = 1,
    Ssh = 2,
    Cache = 3,
    Tmpfs = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Enumeration)]
#[repr(i32)]
pub enum CacheSharingOpt {
    Shared = 0,
    Private = 1,
    Locked = 2,
}

// ---------------------------------------------------------------------------
// Source, build, merge, diff
// ---------------------------------------------------------------------------

/// Imports content such as `docker-image://…`, `local://…` or `git://…`.
#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct SourceOp {
    #[prost(string, tag = "1")]
    pub identifier: String,
    #[prost(btree_map = "string, string", tag = "2")]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
}

/// Nested build of another definition.
#[derive(Clone, PartialEq, Message, Serialize)]
pub struct BuildOp {
    #[prost(int64, tag = "1")]
    pub builder: i64,
    #[prost(btree_map = "string, message", tag = "2")]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, BuildInput>,
    #[prost(message, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub def: Option<Definition>,
    #[prost(btree_map = "string, string", tag = "4")]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct BuildInput {
    #[prost(int64, tag = "1")]
    pub input: i64,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct MergeOp {
    #[prost(message, repeated, tag = "1")]
    pub inputs: Vec<MergeInput>,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct MergeInput {
    #[prost(int64, tag = "1")]
    pub input: i64,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct DiffOp {
    #[prost(message, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower: Option<LowerDiffInput>,
    #[prost(message, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<UpperDiffInput>,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct LowerDiffInput {
    #[prost(int64, tag = "1")]
    pub input: i64,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct UpperDiffInput {
    #[prost(int64, tag = "1")]
    pub input: i64,
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, Message, Serialize)]
pub struct FileOp {
    #[prost(message, repeated, tag = "2")]
    pub actions: Vec<FileAction>,
}

/// One step of a file op. `input`, `secondary_input` and `output` may be
/// negative (no input / relative to a previous action).
#[derive(Clone, PartialEq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAction {
    #[prost(int64, tag = "1")]
    pub input: i64,
    #[prost(int64, tag = "2")]
    pub secondary_input: i64,
    #[prost(int64, tag = "3")]
    pub output: i64,
    #[prost(oneof = "file_action::Action", tags = "4, 5, 6, 7, 8")]
    #[serde(flatten)]
    pub action: Option<file_action::Action>,
}

pub mod file_action {
    use serde::Serialize;

    #[derive(Clone, PartialEq, prost::Oneof, Serialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Action {
        #[prost(message, tag = "4")]
        Copy(super::FileActionCopy),
        #[prost(message, tag = "5")]
        Mkfile(super::FileActionMkFile),
        #[prost(message, tag = "6")]
        Mkdir(super::FileActionMkDir),
        #[prost(message, tag = "7")]
        Rm(super::FileActionRm),
        #[prost(message, tag = "8")]
        Symlink(super::FileActionSymlink),
    }
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileActionCopy {
    #[prost(string, tag = "1")]
    pub src: String,
    #[prost(string, tag = "2")]
    pub dest: String,
    #[prost(message, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<ChownOpt>,
    #[prost(int32, tag = "4")]
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub mode: i32,
    #[prost(bool, tag = "5")]
    #[serde(skip_serializing_if = "is_false")]
    pub follow_symlink: bool,
    #[prost(bool, tag = "6")]
    #[serde(skip_serializing_if = "is_false")]
    pub dir_copy_contents: bool,
    #[prost(bool, tag = "7")]
    #[serde(skip_serializing_if = "is_false")]
    pub attempt_unpack_docker_compatibility: bool,
    #[prost(bool, tag = "8")]
    #[serde(skip_serializing_if = "is_false")]
    pub create_dest_path: bool,
    #[prost(bool, tag = "9")]
    #[serde(skip_serializing_if = "is_false")]
    pub allow_wildcard: bool,
    #[prost(bool, tag = "10")]
    #[serde(skip_serializing_if = "is_false")]
    pub allow_empty_wildcard: bool,
    #[prost(int64, tag = "11")]
    #[serde(skip_serializing_if = "is_zero_i64")]
    pub timestamp: i64,
    #[prost(string, repeated, tag = "12")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include_patterns: Vec<String>,
    #[prost(string, repeated, tag = "13")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_patterns: Vec<String>,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct FileActionMkFile {
    #[prost(string, tag = "1")]
    pub path: String,
    #[prost(int32, tag = "2")]
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub mode: i32,
    #[prost(bytes = "vec", tag = "3")]
    #[serde(serialize_with = "lossy_text", skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<u8>,
    #[prost(message, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<ChownOpt>,
    #[prost(int64, tag = "5")]
    #[serde(skip_serializing_if = "is_zero_i64")]
    pub timestamp: i64,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileActionMkDir {
    #[prost(string, tag = "1")]
    pub path: String,
    #[prost(int32, tag = "2")]
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub mode: i32,
    #[prost(bool, tag = "3")]
    #[serde(skip_serializing_if = "is_false")]
    pub make_parents: bool,
    #[prost(message, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<ChownOpt>,
    #[prost(int64, tag = "5")]
    #[serde(skip_serializing_if = "is_zero_i64")]
    pub timestamp: i64,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileActionRm {
    #[prost(string, tag = "1")]
    pub path: String,
    #[prost(bool, tag = "2")]
    #[serde(skip_serializing_if = "is_false")]
    pub allow_not_found: bool,
    #[prost(bool, tag = "3")]
    #[serde(skip_serializing_if = "is_false")]
    pub allow_wildcard: bool,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct FileActionSymlink {
    #[prost(string, tag = "1")]
    pub oldpath: String,
    #[prost(string, tag = "2")]
    pub newpath: String,
    #[prost(message, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<ChownOpt>,
    #[prost(int64, tag = "4")]
    #[serde(skip_serializing_if = "is_zero_i64")]
    pub timestamp: i64,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct ChownOpt {
    #[prost(message, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserOpt>,
    #[prost(message, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<UserOpt>,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct UserOpt {
    #[prost(oneof = "user_opt::User", tags = "1, 2")]
    #[serde(flatten)]
    pub user: Option<user_opt::User>,
}

pub mod user_opt {
    use serde::Serialize;

    #[derive(Clone, PartialEq, Eq, prost::Oneof, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub enum User {
        #[prost(message, tag = "1")]
        ByName(super::NamedUserOpt),
        #[prost(uint32, tag = "2")]
        ById(u32),
    }
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct NamedUserOpt {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(int64, tag = "2")]
    pub input: i64,
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Side information attached to an op by digest. Not part of the content
/// hash; the default value is the "no metadata" sentinel and serializes as
/// an empty map.
#[derive(Clone, PartialEq, Message, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpMetadata {
    #[prost(bool, tag = "1")]
    #[serde(skip_serializing_if = "is_false")]
    pub ignore_cache: bool,
    #[prost(btree_map = "string, string", tag = "2")]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub description: BTreeMap<String, String>,
    #[prost(message, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_cache: Option<ExportCache>,
    #[prost(btree_map = "string, bool", tag = "5")]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub caps: BTreeMap<String, bool>,
    #[prost(message, optional, tag = "6")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_group: Option<ProgressGroup>,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct ExportCache {
    #[prost(bool, tag = "1")]
    pub value: bool,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize)]
pub struct ProgressGroup {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(bool, tag = "3")]
    #[serde(skip_serializing_if = "is_false")]
    pub weak: bool,
}

// ---------------------------------------------------------------------------
// serde helpers
// ---------------------------------------------------------------------------

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero_i32(value: &i32) -> bool {
    *value == 0
}

fn is_zero_i64(value: &i64) -> bool {
    *value == 0
}

/// Serialize an enumeration field by its upstream (upper-case) name, falling
/// back to the raw number for values this schema does not know.
fn enum_name<E, S>(value: &i32, serializer: S) -> Result<S::Ok, S::Error>
where
    E: TryFrom<i32> + fmt::Debug,
    S: Serializer,
{
    match E::try_from(*value) {
        Ok(known) => serializer.serialize_str(&format!("{known:?}").to_ascii_uppercase()),
        Err(_) => serializer.serialize_i32(*value),
    }
}

fn net_mode_name<S: Serializer>(value: &i32, serializer: S) -> Result<S::Ok, S::Error> {
    enum_name::<NetMode, S>(value, serializer)
}

fn security_mode_name<S: Serializer>(value: &i32, serializer: S) -> Result<S::Ok, S::Error> {
    enum_name::<SecurityMode, S>(value, serializer)
}

fn mount_type_name<S: Serializer>(value: &i32, serializer: S) -> Result<S::Ok, S::Error> {
    enum_name::<MountType, S>(value, serializer)
}

fn cache_sharing_name<S: Serializer>(value: &i32, serializer: S) -> Result<S::Ok, S::Error> {
    enum_name::<CacheSharingOpt, S>(value, serializer)
}

fn lossy_text<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(data))
}

/// Nested definitions are shown by the digests of their blobs.
fn blob_digests<S: Serializer>(blobs: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(blobs.iter().map(|blob| Digest::from_bytes(blob)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_op_roundtrips_through_wire() {
        let op = Op {
            inputs: vec![Input {
                digest: "sha256:abc".to_string(),
                index: 0,
            }],
            op: Some(op::Op::Exec(ExecOp {
                meta: Some(Meta {
                    args: vec!["touch".to_string(), "/a".to_string()],
                    cwd: "/".to_string(),
                    ..Default::default()
                }),
                mounts: vec![Mount {
                    input: 0,
                    dest: "/".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            })),
            ..Default::default()
        };

        let bytes = op.encode_to_vec();
        let decoded = Op::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, op);
    }

    #[test]
    fn test_unknown_oneof_tag_decodes_as_none() {
        // Field 9 (length-delimited, empty) is not part of the op oneof.
        let bytes = [0x4a, 0x00];
        let decoded = Op::decode(&bytes[..]).unwrap();
        assert!(decoded.op.is_none());
    }

    #[test]
    fn test_enum_fields_serialize_by_name() {
        let mount = Mount {
            input: EMPTY_INPUT,
            dest: "/cache".to_string(),
            mount_type: MountType::Cache as i32,
            cache_opt: Some(CacheOpt {
                id: "go".to_string(),
                sharing: CacheSharingOpt::Locked as i32,
            }),
            ..Default::default()
        };
        let json = serde_json::to_value(&mount).unwrap();
        assert_eq!(json["mountType"], "CACHE");
        assert_eq!(json["cacheOpt"]["sharing"], "LOCKED");
        assert_eq!(json["input"], -1);
    }

    #[test]
    fn test_oneof_flattens_into_op() {
        let op = Op {
            op: Some(op::Op::Source(SourceOp {
                identifier: "local://context".to_string(),
                ..Default::default()
            })),
            ..Default::default()
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["source"]["identifier"], "local://context");
        assert!(json.get("inputs").is_none());
    }

    #[test]
    fn test_default_metadata_serializes_empty() {
        let json = serde_json::to_string(&OpMetadata::default()).unwrap();
        assert_eq!(json, "{}");
    }
}
