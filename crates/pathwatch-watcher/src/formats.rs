//! Extension filters
//!
//! Extensions are compared as literal, case-sensitive tokens. A filter of
//! `all` has no special meaning and only matches files ending in `.all`.

use std::path::Path;

/// Ordered set of accepted file extensions, without the leading dot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatSet(Vec<String>);

impl FormatSet {
    /// Parse a comma-separated list such as `"py, csv"`
    ///
    /// Tokens are trimmed and deduplicated, keeping the first occurrence.
    /// An empty string yields the single empty token, which matches files
    /// without an extension.
    pub fn parse(list: &str) -> Self {
        let mut tokens: Vec<String> = Vec::new();
        for token in list.split(',').map(str::trim) {
            if !tokens.iter().any(|existing| existing == token) {
                tokens.push(token.to_string());
            }
        }
        FormatSet(tokens)
    }

    /// Whether `extension` is one of the accepted tokens
    pub fn contains(&self, extension: &str) -> bool {
        self.0.iter().any(|format| format == extension)
    }

    /// Whether the extension of `path` is accepted
    pub fn matches(&self, path: &Path) -> bool {
        self.contains(&extension_of(path))
    }

    /// Accepted tokens in configuration order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Text after the last `.` of the file name, empty when there is none
///
/// Unlike [`Path::extension`], a leading dot counts: `.bashrc` has the
/// extension `bashrc`.
pub fn extension_of(path: &Path) -> String {
    let Some(file_name) = path.file_name() else {
        return String::new();
    };
    let file_name = file_name.to_string_lossy();
    match file_name.rfind('.') {
        Some(dot) => file_name[dot + 1..].to_string(),
        None => String::new(),
    }
}
