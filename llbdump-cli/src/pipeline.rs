//! The built-in compose pipeline.
//!
//! When `llbdump dump` gets no `--input`, it builds this definition from the
//! environment: one exec in the runner image with the charm store and three
//! scratch states mounted, followed by a merge of the config store and
//! relation data outputs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use llbdump_core::pb::{self, OpMetadata};
use llbdump_core::{DefinitionBuilder, OpRef};

pub const ENV_RUNNER_IMAGE: &str = "COMPOSE_DOCKER_IMAGE";
pub const ENV_PROJECT_NAME: &str = "PROJECT_NAME";
pub const ENV_CHARM_STORE: &str = "CHARM_STORE";
pub const ENV_CONFIG_STORE: &str = "CONFIGSTORE";
pub const ENV_RELATION_DATA: &str = "RELATION_DATA";
pub const ENV_DOCKER_COMPOSE_FRAGMENTS: &str = "DOCKER_COMPOSE_FRAGMENTS";

pub const DEFAULT_RUNNER_IMAGE: &str = "docker.0k.io/compose:latest";
pub const DEFAULT_CHARM_STORE: &str = "/srv/charm-store";
pub const DEFAULT_CONFIG_STORE: &str = "/srv/datastore/config";
pub const DEFAULT_RELATION_DATA: &str = "/var/lib/compose/relations";
pub const DEFAULT_DOCKER_COMPOSE_FRAGMENTS: &str = "/var/lib/compose/docker-compose-fragments";

/// Name of the local source carrying the charm store.
const CHARM_STORE_SOURCE: &str = "charm-store";

const RUN_COMMAND: &str = "touch $CONFIGSTORE/a";

const DEFAULT_PATH_ENV: &str =
    "PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("PROJECT_NAME environment variable is required")]
    MissingProjectName,

    #[error("{var} path {} does not exist", .path.display())]
    MissingPath { var: &'static str, path: PathBuf },
}

/// Settings of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub runner_image: String,
    pub project_name: String,
    pub charm_store_path: String,
    pub config_store_path: String,
    pub relation_data_path: String,
    pub docker_compose_path: String,
}

impl BuildContext {
    /// Read the context from the process environment.
    ///
    /// `runner_image` is the configured fallback for `COMPOSE_DOCKER_IMAGE`.
    pub fn from_env(runner_image: Option<&str>) -> Result<Self, ContextError> {
        Self::from_lookup(|key| std::env::var(key).ok(), runner_image)
    }

    /// Read the context through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F, runner_image: Option<&str>) -> Result<Self, ContextError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let runner_image = get(ENV_RUNNER_IMAGE)
            .or_else(|| runner_image.map(str::to_string))
            .unwrap_or_else(|| DEFAULT_RUNNER_IMAGE.to_string());

        let project_name = get(ENV_PROJECT_NAME).ok_or(ContextError::MissingProjectName)?;

        let charm_store_path = or_default(ENV_CHARM_STORE, DEFAULT_CHARM_STORE);
        require_path(ENV_CHARM_STORE, &charm_store_path)?;

        let config_store_path = or_default(ENV_CONFIG_STORE, DEFAULT_CONFIG_STORE);
        require_path(ENV_CONFIG_STORE, &config_store_path)?;

        let ctx = Self {
            runner_image,
            project_name,
            charm_store_path,
            config_store_path,
            relation_data_path: or_default(ENV_RELATION_DATA, DEFAULT_RELATION_DATA),
            docker_compose_path: or_default(
                ENV_DOCKER_COMPOSE_FRAGMENTS,
                DEFAULT_DOCKER_COMPOSE_FRAGMENTS,
            ),
        };
        tracing::debug!(?ctx, "pipeline context");
        Ok(ctx)
    }
}

fn require_path(var: &'static str, path: &str) -> Result<(), ContextError> {
    if Path::new(path).exists() {
        Ok(())
    } else {
        Err(ContextError::MissingPath {
            var,
            path: PathBuf::from(path),
        })
    }
}

fn linux_amd64() -> pb::Platform {
    pb::Platform {
        architecture: "amd64".to_string(),
        os: "linux".to_string(),
        ..Default::default()
    }
}

fn caps(names: &[&str]) -> OpMetadata {
    OpMetadata {
        caps: names.iter().map(|name| (name.to_string(), true)).collect(),
        ..Default::default()
    }
}

/// Where a mount's content comes from.
enum MountSource<'a> {
    Op(&'a OpRef),
    Scratch,
}

/// Build the compose pipeline definition.
pub fn build_definition(ctx: &BuildContext) -> pb::Definition {
    let mut builder = DefinitionBuilder::new();

    let runner = builder.push(
        &pb::Op {
            op: Some(pb::op::Op::Source(pb::SourceOp {
                identifier: format!("docker-image://{}", ctx.runner_image),
                attrs: BTreeMap::new(),
            })),
            platform: Some(linux_amd64()),
            ..Default::default()
        },
        caps(&["source.image"]),
    );

    let charm_store = builder.push(
        &pb::Op {
            op: Some(pb::op::Op::Source(pb::SourceOp {
                identifier: format!("local://{}", CHARM_STORE_SOURCE),
                attrs: [(
                    "local.sharedkeyhint".to_string(),
                    CHARM_STORE_SOURCE.to_string(),
                )]
                .into_iter()
                .collect(),
            })),
            ..Default::default()
        },
        caps(&["source.local", "source.local.sharedkeyhint"]),
    );

    // Mounts are ordered by destination; outputs follow that order.
    let mut mounts: Vec<(&str, MountSource<'_>)> = vec![
        ("/", MountSource::Op(&runner)),
        (ctx.charm_store_path.as_str(), MountSource::Op(&charm_store)),
        (ctx.config_store_path.as_str(), MountSource::Scratch),
        (ctx.docker_compose_path.as_str(), MountSource::Scratch),
        (ctx.relation_data_path.as_str(), MountSource::Scratch),
    ];
    mounts.sort_by(|a, b| a.0.cmp(b.0));

    let mut inputs: Vec<pb::Input> = Vec::new();
    let mut exec_mounts = Vec::with_capacity(mounts.len());
    for (output, (dest, source)) in mounts.iter().enumerate() {
        let input = match source {
            MountSource::Op(op) => {
                let reference = op.output(0);
                match inputs.iter().position(|known| *known == reference) {
                    Some(pos) => pos as i64,
                    None => {
                        inputs.push(reference);
                        (inputs.len() - 1) as i64
                    }
                }
            }
            MountSource::Scratch => pb::EMPTY_INPUT,
        };
        exec_mounts.push(pb::Mount {
            input,
            dest: dest.to_string(),
            output: output as i64,
            ..Default::default()
        });
    }

    let output_of = |dest: &str| {
        exec_mounts
            .iter()
            .find(|mount| mount.dest == dest)
            .map(|mount| mount.output)
            .unwrap_or(0)
    };
    let config_store_output = output_of(ctx.config_store_path.as_str());
    let relation_output = output_of(ctx.relation_data_path.as_str());

    let run = builder.push(
        &pb::Op {
            inputs,
            op: Some(pb::op::Op::Exec(pb::ExecOp {
                meta: Some(pb::Meta {
                    args: RUN_COMMAND.split_whitespace().map(str::to_string).collect(),
                    env: vec![DEFAULT_PATH_ENV.to_string()],
                    cwd: "/".to_string(),
                    ..Default::default()
                }),
                mounts: exec_mounts,
                ..Default::default()
            })),
            platform: Some(linux_amd64()),
            ..Default::default()
        },
        caps(&["exec.meta.base", "exec.mount.bind"]),
    );

    let merge = builder.push(
        &pb::Op {
            inputs: vec![run.output(config_store_output), run.output(relation_output)],
            op: Some(pb::op::Op::Merge(pb::MergeOp {
                inputs: vec![pb::MergeInput { input: 0 }, pb::MergeInput { input: 1 }],
            })),
            ..Default::default()
        },
        caps(&["mergeop"]),
    );

    let def = builder.build(Some(merge.output(0)));
    tracing::debug!(
        project = %ctx.project_name,
        ops = def.def.len(),
        "built compose pipeline"
    );
    def
}

#[cfg(test)]
mod tests {
    use super::*;
    use llbdump_core::{LlbGraph, OpKind};
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    fn context(dir: &TempDir) -> BuildContext {
        BuildContext {
            runner_image: DEFAULT_RUNNER_IMAGE.to_string(),
            project_name: "demo".to_string(),
            charm_store_path: dir.path().join("charms").display().to_string(),
            config_store_path: dir.path().join("config").display().to_string(),
            relation_data_path: DEFAULT_RELATION_DATA.to_string(),
            docker_compose_path: DEFAULT_DOCKER_COMPOSE_FRAGMENTS.to_string(),
        }
    }

    #[test]
    fn test_context_requires_project_name() {
        let err = BuildContext::from_lookup(lookup(&[]), None).unwrap_err();
        assert!(matches!(err, ContextError::MissingProjectName));
        assert_eq!(err.to_string(), "PROJECT_NAME environment variable is required");

        let err = BuildContext::from_lookup(lookup(&[(ENV_PROJECT_NAME, "")]), None).unwrap_err();
        assert!(matches!(err, ContextError::MissingProjectName));
    }

    #[test]
    fn test_context_requires_existing_stores() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope").display().to_string();

        let err = BuildContext::from_lookup(
            lookup(&[(ENV_PROJECT_NAME, "demo"), (ENV_CHARM_STORE, &missing)]),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ContextError::MissingPath { var: ENV_CHARM_STORE, .. }));
        assert!(err.to_string().contains(&missing));

        let err = BuildContext::from_lookup(
            lookup(&[
                (ENV_PROJECT_NAME, "demo"),
                (ENV_CHARM_STORE, &dir.path().display().to_string()),
                (ENV_CONFIG_STORE, &missing),
            ]),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ContextError::MissingPath { var: ENV_CONFIG_STORE, .. }));
    }

    #[test]
    fn test_context_defaults_and_precedence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().display().to_string();
        let base = [
            (ENV_PROJECT_NAME, "demo"),
            (ENV_CHARM_STORE, path.as_str()),
            (ENV_CONFIG_STORE, path.as_str()),
        ];

        let ctx = BuildContext::from_lookup(lookup(&base), None).unwrap();
        assert_eq!(ctx.runner_image, DEFAULT_RUNNER_IMAGE);
        assert_eq!(ctx.relation_data_path, DEFAULT_RELATION_DATA);
        assert_eq!(ctx.docker_compose_path, DEFAULT_DOCKER_COMPOSE_FRAGMENTS);

        let ctx = BuildContext::from_lookup(lookup(&base), Some("from/config:1")).unwrap();
        assert_eq!(ctx.runner_image, "from/config:1");

        let mut with_env = base.to_vec();
        with_env.push((ENV_RUNNER_IMAGE, "from/env:2"));
        with_env.push((ENV_RELATION_DATA, ""));
        let ctx = BuildContext::from_lookup(lookup(&with_env), Some("from/config:1")).unwrap();
        assert_eq!(ctx.runner_image, "from/env:2");
        assert_eq!(ctx.relation_data_path, DEFAULT_RELATION_DATA);
    }

    #[test]
    fn test_pipeline_shape() {
        let dir = TempDir::new().unwrap();
        let def = build_definition(&context(&dir));
        let graph = LlbGraph::from_definition(&def).unwrap();

        let kinds: Vec<OpKind> = graph.nodes().iter().map(|r| r.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                OpKind::Source,
                OpKind::Source,
                OpKind::Exec,
                OpKind::Merge,
                OpKind::Unknown
            ]
        );
        assert!(graph.dangling().is_empty());
        assert!(graph.is_acyclic());
        assert_eq!(graph.edge_count(), 5);
        assert_eq!(graph.sinks().len(), 1);
    }

    #[test]
    fn test_exec_mounts() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let def = build_definition(&ctx);
        let graph = LlbGraph::from_definition(&def).unwrap();

        let exec = &graph.nodes()[2];
        let Some(pb::op::Op::Exec(op)) = &exec.op.op else {
            panic!("expected an exec op");
        };
        assert_eq!(op.meta.as_ref().unwrap().args, vec!["touch", "$CONFIGSTORE/a"]);

        let dests: Vec<&str> = op.mounts.iter().map(|m| m.dest.as_str()).collect();
        let mut sorted = dests.clone();
        sorted.sort();
        assert_eq!(dests, sorted);
        assert_eq!(dests[0], "/");

        let charm = op.mounts.iter().find(|m| m.dest == ctx.charm_store_path).unwrap();
        assert_eq!(charm.input, 1);
        let scratch = op
            .mounts
            .iter()
            .filter(|m| m.input == pb::EMPTY_INPUT)
            .count();
        assert_eq!(scratch, 3);

        let outputs: Vec<i64> = op.mounts.iter().map(|m| m.output).collect();
        assert_eq!(outputs, vec![0, 1, 2, 3, 4]);
        assert_eq!(exec.inputs().len(), 2);
    }

    #[test]
    fn test_merge_takes_store_outputs() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let def = build_definition(&ctx);
        let graph = LlbGraph::from_definition(&def).unwrap();

        let exec = &graph.nodes()[2];
        let Some(pb::op::Op::Exec(op)) = &exec.op.op else {
            panic!("expected an exec op");
        };
        let output_for = |dest: &str| op.mounts.iter().find(|m| m.dest == dest).unwrap().output;

        let merge = &graph.nodes()[3];
        let indexes: Vec<i64> = merge.inputs().iter().map(|i| i.index).collect();
        assert_eq!(
            indexes,
            vec![
                output_for(ctx.config_store_path.as_str()),
                output_for(ctx.relation_data_path.as_str())
            ]
        );
        assert!(merge
            .inputs()
            .iter()
            .all(|i| i.digest == exec.digest.as_str()));
        assert_eq!(merge.metadata.caps.get("mergeop"), Some(&true));
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        assert_eq!(build_definition(&ctx), build_definition(&ctx));
    }
}
