//! Terminal syntax highlighting for the YAML renderer.
//!
//! Highlighting is best-effort: if the syntax set has no YAML grammar or a
//! line fails to tokenize, callers get the plain text back unchanged.

use std::io::{self, Write};
use std::str::FromStr;

use once_cell::sync::Lazy;
use syntect::easy::HighlightLines;
use syntect::highlighting::{
    Color, FontStyle, ScopeSelectors, StyleModifier, Theme, ThemeItem, ThemeSettings,
};
use syntect::parsing::SyntaxSet;
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

static DEFAULT_SYNTAXES: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

const RESET: &str = "\x1b[0m";

/// Whether to colorize output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorMode {
    Always,
    Never,
    #[default]
    Auto,
}

impl ColorMode {
    /// Decide once. `is_terminal` is only called for [`ColorMode::Auto`].
    pub fn resolve(self, is_terminal: impl FnOnce() -> bool) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => is_terminal(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorMode::Always => "on",
            ColorMode::Never => "off",
            ColorMode::Auto => "auto",
        }
    }
}

impl FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "on" | "always" | "true" | "yes" => Ok(ColorMode::Always),
            "off" | "never" | "false" | "no" => Ok(ColorMode::Never),
            "auto" => Ok(ColorMode::Auto),
            _ => Err(format!("Unknown color mode: '{}' (expected on, off or auto)", s)),
        }
    }
}

/// YAML colorizer with a fixed dark-background theme.
pub struct Highlighter {
    syntaxes: Option<SyntaxSet>,
    theme: Theme,
}

impl Highlighter {
    /// Highlighter over syntect's bundled syntaxes, loaded on first use.
    pub fn new() -> Self {
        Self {
            syntaxes: None,
            theme: dump_theme(),
        }
    }

    /// Highlighter over a caller-provided syntax set.
    pub fn with_syntaxes(syntaxes: SyntaxSet) -> Self {
        Self {
            syntaxes: Some(syntaxes),
            theme: dump_theme(),
        }
    }

    fn syntaxes(&self) -> &SyntaxSet {
        self.syntaxes.as_ref().unwrap_or(&*DEFAULT_SYNTAXES)
    }

    /// Colorize `text` as YAML, or `None` when that is not possible.
    pub fn highlight_yaml(&self, text: &str) -> Option<String> {
        let syntaxes = self.syntaxes();
        let Some(syntax) = syntaxes
            .find_syntax_by_token("yaml")
            .or_else(|| syntaxes.find_syntax_by_extension("yml"))
        else {
            tracing::debug!("no YAML syntax available, writing plain output");
            return None;
        };

        let mut lines = HighlightLines::new(syntax, &self.theme);
        let mut out = String::with_capacity(text.len() * 2);
        for line in LinesWithEndings::from(text) {
            match lines.highlight_line(line, syntaxes) {
                Ok(ranges) => out.push_str(&as_24_bit_terminal_escaped(&ranges, false)),
                Err(err) => {
                    tracing::debug!(error = %err, "highlighting failed, writing plain output");
                    return None;
                }
            }
        }
        out.push_str(RESET);
        Some(out)
    }

    /// Write `text` highlighted, falling back to the plain bytes.
    pub fn write_yaml<W: Write>(&self, text: &str, out: &mut W) -> io::Result<()> {
        match self.highlight_yaml(text) {
            Some(colored) => out.write_all(colored.as_bytes()),
            None => out.write_all(text.as_bytes()),
        }
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

/// (scope selector, hex color, font style)
const PALETTE: &[(&str, &str, FontStyle)] = &[
    ("comment", "999988", FontStyle::ITALIC),
    ("entity.name.tag", "008080", FontStyle::empty()),
    ("string", "88bb88", FontStyle::empty()),
    ("constant.numeric", "009999", FontStyle::empty()),
    ("constant.language", "ffffff", FontStyle::empty()),
    ("constant.character.escape", "990073", FontStyle::empty()),
    ("punctuation.separator, punctuation.definition.block", "ffffff", FontStyle::BOLD),
    ("entity.other.document, punctuation.definition.directives", "999999", FontStyle::empty()),
    ("variable.other.alias, entity.name.other.anchor", "800080", FontStyle::empty()),
    ("storage.type.tag-handle", "445588", FontStyle::BOLD),
    ("invalid", "a61717", FontStyle::empty()),
];

fn dump_theme() -> Theme {
    let scopes = PALETTE
        .iter()
        .filter_map(|&(selector, hex, font_style)| {
            let scope = ScopeSelectors::from_str(selector).ok()?;
            Some(ThemeItem {
                scope,
                style: StyleModifier {
                    foreground: parse_hex(hex),
                    background: None,
                    font_style: Some(font_style),
                },
            })
        })
        .collect();

    Theme {
        name: Some("llbdump".to_string()),
        settings: ThemeSettings {
            foreground: parse_hex("bbbbbb"),
            background: parse_hex("000000"),
            ..ThemeSettings::default()
        },
        scopes,
        ..Theme::default()
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let value = u32::from_str_radix(hex, 16).ok()?;
    Some(Color {
        r: (value >> 16) as u8,
        g: (value >> 8) as u8,
        b: value as u8,
        a: 0xff,
    })
}
