// src/quoting/dialect.rs

//! Shell dialects and their quoting tables.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Characters a dialect treats specially when deciding whether (and how) to
/// quote a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteChars {
    /// Escapes the next character (`\` for bash, `` ` `` for PowerShell).
    pub escape: Option<char>,
    /// Quote that disables every expansion inside it.
    pub strong: Option<char>,
    /// Quote that still allows variable expansion inside it.
    pub weak: Option<char>,
    /// Characters that force quoting when they appear outside quotes.
    /// Space always forces quoting and is not listed here.
    pub needs_quotes: &'static [char],
}

const BASH_CHARS: QuoteChars = QuoteChars {
    escape: Some('\\'),
    strong: Some('\''),
    weak: Some('"'),
    needs_quotes: &['(', ')', '|', '&', ';', '<', '>'],
};

const CMD_CHARS: QuoteChars = QuoteChars {
    escape: None,
    strong: None,
    weak: Some('"'),
    needs_quotes: &['&', '|', '<', '>', '(', ')', '^'],
};

const POWERSHELL_CHARS: QuoteChars = QuoteChars {
    escape: Some('`'),
    strong: Some('\''),
    weak: Some('"'),
    needs_quotes: &['(', ')', '|', ';', '{', '}', '<', '>'],
};

/// Quoting rule set of the shell that will evaluate a task command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellDialect {
    Bash,
    /// `wsl.exe`: bash quoting, but entered with `-e`.
    Wsl,
    Cmd,
    PowerShell,
    /// Any other executable. Tokens pass through untouched.
    Unknown,
}

static DIALECT_PATTERNS: LazyLock<Vec<(Regex, ShellDialect)>> = LazyLock::new(|| {
    [
        (r"bash(\.exe)?$", ShellDialect::Bash),
        (r"wsl(\.exe)?$", ShellDialect::Wsl),
        (r"cmd(\.exe)?$", ShellDialect::Cmd),
        (r"^(ps|pwsh|powershell)(\.exe)?$", ShellDialect::PowerShell),
    ]
    .into_iter()
    .filter_map(|(pattern, dialect)| Regex::new(pattern).ok().map(|re| (re, dialect)))
    .collect()
});

impl ShellDialect {
    /// Pick the dialect for a shell executable path.
    ///
    /// Only the file name is inspected, so both `/usr/bin/bash` and
    /// `C:\Windows\System32\cmd.exe` work on any host.
    pub fn from_executable(executable: &str) -> Self {
        let file_name = executable
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(executable)
            .to_lowercase();

        DIALECT_PATTERNS
            .iter()
            .find(|(re, _)| re.is_match(&file_name))
            .map(|(_, dialect)| *dialect)
            .unwrap_or(ShellDialect::Unknown)
    }

    /// Quoting table, `None` for [`ShellDialect::Unknown`].
    pub fn quote_chars(self) -> Option<&'static QuoteChars> {
        match self {
            ShellDialect::Bash | ShellDialect::Wsl => Some(&BASH_CHARS),
            ShellDialect::Cmd => Some(&CMD_CHARS),
            ShellDialect::PowerShell => Some(&POWERSHELL_CHARS),
            ShellDialect::Unknown => None,
        }
    }

    /// Flags placed between the shell executable and the command line.
    pub fn default_args(self) -> &'static [&'static str] {
        match self {
            ShellDialect::Bash => &["-l", "-c"],
            ShellDialect::Wsl => &["-e"],
            ShellDialect::Cmd => &["/c"],
            ShellDialect::PowerShell => &["-c"],
            ShellDialect::Unknown => &[],
        }
    }

    /// Whether a plain token must be quoted to survive as one shell word.
    ///
    /// Tokens that already start and end with the same quote character are
    /// taken as pre-quoted. Otherwise the token is scanned outside of quotes
    /// for a space or one of the dialect's `needs_quotes` characters.
    pub fn needs_quoting(self, value: &str) -> bool {
        let Some(chars) = self.quote_chars() else {
            return false;
        };
        let is_quote = |c: char| Some(c) == chars.strong || Some(c) == chars.weak;

        let mut ends = value.chars();
        if let (Some(first), Some(last)) = (ends.next(), ends.next_back()) {
            if is_quote(first) && first == last {
                return false;
            }
        }

        let mut quote: Option<char> = None;
        let mut iter = value.chars();
        while let Some(ch) = iter.next() {
            if Some(ch) == quote {
                quote = None;
            } else if quote.is_some() {
                continue;
            } else if Some(ch) == chars.escape {
                iter.next();
            } else if is_quote(ch) {
                quote = Some(ch);
            } else if ch == ' ' || chars.needs_quotes.contains(&ch) {
                return true;
            }
        }
        false
    }

    /// Wrap `value` in the dialect's strong quotes.
    pub fn strong(self, value: &str) -> String {
        match self {
            ShellDialect::Bash | ShellDialect::Wsl => bash_strong(value),
            ShellDialect::Cmd => self.weak(value).replace('%', "\"%\""),
            ShellDialect::PowerShell => format!("'{}'", value.replace('\'', "''")),
            ShellDialect::Unknown => value.to_string(),
        }
    }

    /// Wrap `value` in the dialect's weak quotes.
    pub fn weak(self, value: &str) -> String {
        match self {
            ShellDialect::Bash | ShellDialect::Wsl => {
                let mut inner = value.replace("\\\"", "\\\\\"").replace('"', "\\\"");
                if inner.ends_with('\\') {
                    inner.push('\\');
                }
                format!("\"{inner}\"")
            }
            ShellDialect::Cmd => {
                let mut inner = value.replace('"', "\"\"");
                if inner.ends_with('\\') {
                    inner.push('\\');
                }
                format!("\"{inner}\"")
            }
            ShellDialect::PowerShell => {
                format!("\"{}\"", prefix_each(value, '`', |c| matches!(c, '`' | '$' | '"')))
            }
            ShellDialect::Unknown => value.to_string(),
        }
    }

    /// Escape special characters of `value` without wrapping it.
    pub fn escape(self, value: &str) -> String {
        match self {
            ShellDialect::Bash | ShellDialect::Wsl => prefix_each(value, '\\', |c| {
                c.is_whitespace()
                    || matches!(
                        c,
                        '\\' | '|' | '(' | ')' | '{' | '}' | '<' | '>' | '$' | '&' | ';' | '"' | '\''
                    )
            }),
            ShellDialect::Cmd => cmd_escape(value),
            ShellDialect::PowerShell => prefix_each(value, '`', |c| {
                matches!(
                    c,
                    '`' | '|' | '{' | '}' | '(' | ')' | '<' | '>' | ';' | '"' | '\'' | ' '
                )
            }),
            ShellDialect::Unknown => value.to_string(),
        }
    }
}

impl fmt::Display for ShellDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShellDialect::Bash => "bash",
            ShellDialect::Wsl => "wsl",
            ShellDialect::Cmd => "cmd",
            ShellDialect::PowerShell => "powershell",
            ShellDialect::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// `it's` becomes `'it'"'"'s'`: every run of single quotes is closed,
/// double-quoted, and reopened.
fn bash_strong(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');

    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\'' {
            out.push(c);
            continue;
        }
        out.push_str("'\"'");
        while chars.peek() == Some(&'\'') {
            chars.next();
            out.push('\'');
        }
        out.push_str("\"'");
    }

    out.push('\'');
    out
}

/// cmd has no escape character inside quotes; carets outside, and
/// whitespace runs double-quoted so they cannot split the word.
fn cmd_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_whitespace = false;

    for c in value.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('"');
                in_whitespace = true;
            }
            out.push(c);
            continue;
        }
        if in_whitespace {
            out.push('"');
            in_whitespace = false;
        }
        if matches!(c, '%' | '&' | '<' | '>' | '(' | ')' | '@' | '^' | '|' | '"') {
            out.push('^');
        }
        out.push(c);
    }
    if in_whitespace {
        out.push('"');
    }
    out
}

fn prefix_each(value: &str, escape: char, special: impl Fn(char) -> bool) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if special(c) {
            out.push(escape);
        }
        out.push(c);
    }
    out
}
