//! Shell completions command - Generate shell completion scripts
//!
//! Generates completion scripts for various shells:
//! - bash: Add to ~/.bashrc or ~/.bash_completion
//! - zsh: Add to ~/.zshrc or put in fpath
//! - fish: Add to ~/.config/fish/completions/
//! - powershell: Add to $PROFILE
//! - elvish: Add to ~/.elvish/rc.elv

use std::io::{self, Write};

use clap::Command;
use clap_complete::{generate, shells};
use colored::Colorize;

const BIN_NAME: &str = "llbdump";

/// Supported shells for completion generation
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl std::fmt::Display for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shell::Bash => write!(f, "bash"),
            Shell::Zsh => write!(f, "zsh"),
            Shell::Fish => write!(f, "fish"),
            Shell::PowerShell => write!(f, "powershell"),
            Shell::Elvish => write!(f, "elvish"),
        }
    }
}

/// Get installation instructions for a shell
fn get_instructions(shell: Shell) -> Vec<String> {
    match shell {
        Shell::Bash => vec![
            "# Add to ~/.bashrc:".to_string(),
            format!("eval \"$({} completions bash)\"", BIN_NAME),
            "".to_string(),
            "# Or save to a file:".to_string(),
            format!(
                "{0} completions bash > ~/.local/share/bash-completion/completions/{0}",
                BIN_NAME
            ),
        ],
        Shell::Zsh => vec![
            "# Add to ~/.zshrc:".to_string(),
            format!("eval \"$({} completions zsh)\"", BIN_NAME),
            "".to_string(),
            "# Or save to a file in fpath:".to_string(),
            format!("{0} completions zsh > ~/.zfunc/_{0}", BIN_NAME),
            "# Then add to ~/.zshrc before compinit:".to_string(),
            "fpath=(~/.zfunc $fpath)".to_string(),
        ],
        Shell::Fish => vec![
            "# Save to fish completions directory:".to_string(),
            format!(
                "{0} completions fish > ~/.config/fish/completions/{0}.fish",
                BIN_NAME
            ),
        ],
        Shell::PowerShell => vec![
            "# Add to $PROFILE:".to_string(),
            format!(
                "Invoke-Expression (& {} completions powershell | Out-String)",
                BIN_NAME
            ),
        ],
        Shell::Elvish => vec![
            "# Add to ~/.elvish/rc.elv:".to_string(),
            format!("eval ({} completions elvish | slurp)", BIN_NAME),
        ],
    }
}

fn render_instructions(shell: Shell) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{} completions for {}\n\n",
        BIN_NAME.cyan().bold(),
        shell.to_string().yellow()
    ));
    output.push_str(&format!("{}\n", "Installation:".cyan().bold()));
    for instruction in get_instructions(shell) {
        output.push_str(&format!("  {}\n", instruction));
    }
    output
}

/// Generate completions and write them to `out`
pub fn generate_completions<W: Write>(shell: Shell, cmd: &mut Command, out: &mut W) {
    match shell {
        Shell::Bash => generate(shells::Bash, cmd, BIN_NAME, out),
        Shell::Zsh => generate(shells::Zsh, cmd, BIN_NAME, out),
        Shell::Fish => generate(shells::Fish, cmd, BIN_NAME, out),
        Shell::PowerShell => generate(shells::PowerShell, cmd, BIN_NAME, out),
        Shell::Elvish => generate(shells::Elvish, cmd, BIN_NAME, out),
    }
}

/// Run the completions command
pub fn run(shell: Shell, show_instructions: bool, cmd: &mut Command) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if show_instructions {
        out.write_all(render_instructions(shell).as_bytes())?;
    } else {
        generate_completions(shell, cmd, &mut out);
    }
    out.flush()?;
    Ok(())
}
