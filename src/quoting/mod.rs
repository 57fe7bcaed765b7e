// src/quoting/mod.rs

//! Shell quoting engine.
//!
//! - [`dialect`] holds the closed set of shell dialects, each with its quote
//!   characters, default invocation flags and quoting functions.
//! - This module defines the argument token type used in task descriptors and
//!   renders token sequences into a single command line for a dialect.

pub mod dialect;

use std::fmt;

use serde::Deserialize;

pub use dialect::{QuoteChars, ShellDialect};

/// How a tagged argument should be quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellQuoting {
    /// Escape special characters one by one.
    Escape,
    /// Always wrap in strong quotes.
    Strong,
    /// Wrap in weak quotes, only when the value needs quoting.
    Weak,
}

/// A value with an explicit quoting request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuotedString {
    pub value: String,
    pub quoting: ShellQuoting,
}

/// One argument of a task: a bare string or a tagged quoted value.
///
/// In TOML this is either `"arg"` or `{ value = "arg", quoting = "strong" }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ShellArg {
    Plain(String),
    Quoted(QuotedString),
}

impl ShellArg {
    pub fn strong(value: impl Into<String>) -> Self {
        ShellArg::Quoted(QuotedString {
            value: value.into(),
            quoting: ShellQuoting::Strong,
        })
    }

    pub fn weak(value: impl Into<String>) -> Self {
        ShellArg::Quoted(QuotedString {
            value: value.into(),
            quoting: ShellQuoting::Weak,
        })
    }

    pub fn escaped(value: impl Into<String>) -> Self {
        ShellArg::Quoted(QuotedString {
            value: value.into(),
            quoting: ShellQuoting::Escape,
        })
    }

    /// The raw value, with any quoting tag dropped.
    pub fn value(&self) -> &str {
        match self {
            ShellArg::Plain(s) => s,
            ShellArg::Quoted(q) => &q.value,
        }
    }
}

impl From<&str> for ShellArg {
    fn from(value: &str) -> Self {
        ShellArg::Plain(value.to_string())
    }
}

impl From<String> for ShellArg {
    fn from(value: String) -> Self {
        ShellArg::Plain(value)
    }
}

impl fmt::Display for ShellArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

/// Whether `token` must be quoted for `dialect`.
pub fn needs_quoting(token: &str, dialect: ShellDialect) -> bool {
    dialect.needs_quoting(token)
}

/// Render a single token for `dialect`.
///
/// Plain strings are strong-quoted only when they need quoting, so values the
/// user already quoted by hand are left alone.
pub fn render_arg(arg: &ShellArg, dialect: ShellDialect) -> String {
    match arg {
        ShellArg::Plain(value) if dialect.needs_quoting(value) => dialect.strong(value),
        ShellArg::Plain(value) => value.clone(),
        ShellArg::Quoted(QuotedString { value, quoting }) => match quoting {
            ShellQuoting::Strong => dialect.strong(value),
            ShellQuoting::Weak if dialect.needs_quoting(value) => dialect.weak(value),
            ShellQuoting::Weak => value.clone(),
            ShellQuoting::Escape => dialect.escape(value),
        },
    }
}

/// Render `tokens` into one command line, joined by single spaces.
pub fn build_command_line(tokens: &[ShellArg], dialect: ShellDialect) -> String {
    tokens
        .iter()
        .map(|arg| render_arg(arg, dialect))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_tokens_are_quoted_only_when_needed() {
        let tokens: Vec<ShellArg> = vec!["echo".into(), "hello world".into(), "x".into()];
        assert_eq!(
            build_command_line(&tokens, ShellDialect::Bash),
            "echo 'hello world' x"
        );
    }

    #[test]
    fn strong_tokens_are_always_quoted() {
        let tokens = vec![ShellArg::from("ls"), ShellArg::strong("abc")];
        assert_eq!(build_command_line(&tokens, ShellDialect::Bash), "ls 'abc'");
        assert_eq!(build_command_line(&tokens, ShellDialect::PowerShell), "ls 'abc'");
    }

    #[test]
    fn weak_tokens_are_quoted_only_when_needed() {
        let tokens = vec![ShellArg::weak("abc"), ShellArg::weak("$HOME/my dir")];
        assert_eq!(
            build_command_line(&tokens, ShellDialect::Bash),
            "abc \"$HOME/my dir\""
        );
    }

    #[test]
    fn unknown_dialect_passes_values_through() {
        let tokens = vec![ShellArg::strong("a b"), ShellArg::from("c d")];
        assert_eq!(build_command_line(&tokens, ShellDialect::Unknown), "a b c d");
    }

    #[test]
    fn empty_token_list_renders_empty_line() {
        assert_eq!(build_command_line(&[], ShellDialect::Bash), "");
    }
}
