//! Install facts scraped from README prose.
//!
//! Only fenced code blocks are considered. A block is install-flavored when
//! it mentions one of [`INSTALL_KEYWORDS`]; its lines become shell commands.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Substrings that mark a fenced block as installation instructions.
pub const INSTALL_KEYWORDS: &[&str] = &["pip", "conda", "install", "git", "requirements"];

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^[ \t]*```[^\n]*\n(.*?)^[ \t]*```").unwrap()
});

static PYTHON_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bpython(?:[ \t]+|[ \t]*==?[ \t]*)(\d+\.\d+)\b").unwrap()
});

/// Structured facts extracted from a README.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadmeFacts {
    pub python_version: Option<String>,
    pub blocks: Vec<CommandBlock>,
}

impl ReadmeFacts {
    pub fn immediate(&self) -> impl Iterator<Item = &CommandBlock> {
        self.blocks.iter().filter(|block| !block.deferred)
    }

    pub fn deferred(&self) -> impl Iterator<Item = &CommandBlock> {
        self.blocks.iter().filter(|block| block.deferred)
    }
}

/// One install-flavored fenced block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandBlock {
    pub commands: Vec<String>,
    /// First command is `pip install`: run after the environment exists.
    pub deferred: bool,
    /// Block clones this very project; run it from the parent directory.
    pub from_parent: bool,
}

impl CommandBlock {
    /// Commands chained with `&&`, prefixed with `cd ..` for sibling clones.
    pub fn chained(&self) -> String {
        let chained = self.commands.join(" && ");
        if self.from_parent {
            format!("cd .. && {chained}")
        } else {
            chained
        }
    }
}

/// Extract install blocks and a python-version hint from README `content`.
///
/// `project_name` is the basename of the project directory, used to detect
/// `git clone` commands that would clone the project into itself.
pub fn extract(content: &str, project_name: &str) -> ReadmeFacts {
    let mut facts = ReadmeFacts::default();

    for captures in FENCED_BLOCK.captures_iter(content) {
        let body = captures.get(1).map_or("", |m| m.as_str());

        if facts.python_version.is_none()
            && let Some(version) = PYTHON_VERSION.captures(body).and_then(|c| c.get(1))
        {
            facts.python_version = Some(version.as_str().to_string());
        }

        if !INSTALL_KEYWORDS.iter().any(|kw| body.contains(kw)) {
            continue;
        }
        let commands = block_commands(body);
        let Some(first) = commands.first() else {
            continue;
        };
        let deferred = pip_install_args(first).is_some();
        let from_parent = commands
            .iter()
            .filter_map(|cmd| clone_target_name(cmd))
            .any(|name| name == project_name);
        facts.blocks.push(CommandBlock {
            commands,
            deferred,
            from_parent,
        });
    }

    facts
}

/// Arguments following `pip install` / `pip3 install`, if `command` is one.
pub fn pip_install_args(command: &str) -> Option<&str> {
    let rest = command
        .strip_prefix("pip3 ")
        .or_else(|| command.strip_prefix("pip "))?;
    let rest = rest.trim_start().strip_prefix("install")?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// Repository name targeted by a `git clone` command (`.git` suffix stripped).
pub fn clone_target_name(command: &str) -> Option<String> {
    let (_, rest) = command.split_once("git clone ")?;
    let url = rest
        .split_whitespace()
        .find(|token| !token.starts_with('-') && (token.contains('/') || token.contains(':')))?
        .trim_end_matches('/');
    let last = url.rsplit(['/', ':']).next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn block_commands(body: &str) -> Vec<String> {
    body.lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix("$ ")
                .or_else(|| line.strip_prefix("> "))
                .unwrap_or(line)
                .trim()
        })
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
