//! Dump command - Render an LLB definition to stdout
//!
//! The definition comes from `--input` (a file, or `-` for stdin) or, by
//! default, from the compose pipeline built out of the environment.

use std::io::{self, IsTerminal, Read};
use std::path::Path;

use anyhow::{Context, Result};
use llbdump_core::{ColorMode, Dumper, Format};

use crate::config::LlbdumpConfig;
use crate::pipeline::{self, BuildContext};

/// Where the definition is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source<'a> {
    Stdin,
    File(&'a Path),
    Pipeline,
}

impl<'a> Source<'a> {
    pub fn from_arg(input: Option<&'a Path>) -> Self {
        match input {
            Some(path) if path.as_os_str() == "-" => Source::Stdin,
            Some(path) => Source::File(path),
            None => Source::Pipeline,
        }
    }
}

fn read_input(source: &Source<'_>) -> Result<Option<Vec<u8>>> {
    match source {
        Source::Stdin => {
            let mut buf = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut buf)
                .context("Failed to read definition from stdin")?;
            Ok(Some(buf))
        }
        Source::File(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read definition from {}", path.display()))?;
            Ok(Some(bytes))
        }
        Source::Pipeline => Ok(None),
    }
}

/// Run the dump command
pub fn run(
    format: Format,
    color: ColorMode,
    input: Option<&Path>,
    config: &LlbdumpConfig,
) -> Result<()> {
    let source = Source::from_arg(input);
    tracing::debug!(%format, color = color.as_str(), ?source, "dump");

    let dumper = Dumper::new(format).with_color(color);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let is_terminal = || io::stdout().is_terminal();

    match read_input(&source)? {
        Some(bytes) => dumper.dump(&bytes, &mut out, is_terminal)?,
        None => {
            let ctx = BuildContext::from_env(config.runner_image())?;
            let def = pipeline::build_definition(&ctx);
            dumper.dump_definition(&def, &mut out, is_terminal)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_source_from_arg() {
        assert_eq!(Source::from_arg(None), Source::Pipeline);
        assert_eq!(Source::from_arg(Some(Path::new("-"))), Source::Stdin);
        assert_eq!(
            Source::from_arg(Some(Path::new("build.llb"))),
            Source::File(Path::new("build.llb"))
        );
    }

    #[test]
    fn test_read_file_input() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("def.llb");
        std::fs::write(&path, b"\x0a\x00").unwrap();

        let bytes = read_input(&Source::File(&path)).unwrap();
        assert_eq!(bytes, Some(b"\x0a\x00".to_vec()));
        assert_eq!(read_input(&Source::Pipeline).unwrap(), None);
    }

    #[test]
    fn test_missing_file_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.llb");
        let err = read_input(&Source::File(&path)).unwrap_err();
        assert!(err.to_string().contains("missing.llb"));
    }
}
