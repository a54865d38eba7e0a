//! Secrets file parsing and validation.
//!
//! The secrets file is a `KEY=value` list kept outside the project tree and
//! restricted to its owner. This module only interprets text and mode bits;
//! reading the file and changing its permissions happen elsewhere.

use std::collections::BTreeMap;

/// Mode the secrets file is forced to before its content is trusted.
pub const OWNER_ONLY_MODE: u32 = 0o600;

/// Parsed secrets file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Secrets {
    entries: BTreeMap<String, String>,
}

impl Secrets {
    /// Parse `KEY=value` lines.
    ///
    /// Blank lines and `#` comments are skipped, an `export ` prefix is
    /// accepted, matching surrounding quotes are stripped, and a later
    /// definition of the same key replaces an earlier one. Lines without `=`
    /// are ignored.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut entries = BTreeMap::new();
        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            entries.insert(key.to_string(), unquote(value.trim()).to_string());
        }
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// `true` when the key is defined with a non-empty value.
    #[must_use]
    pub fn has_value(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }

    /// Required keys that are absent or empty, in the order given.
    #[must_use]
    pub fn missing_keys<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|k| !self.has_value(k))
            .collect()
    }

    /// Non-fatal findings about optional settings.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let twitter_enabled = self
            .get("TWITTER_ANALYSIS_ENABLED")
            .is_none_or(|v| !v.eq_ignore_ascii_case("false"));
        if twitter_enabled && !self.has_value("TWITTER_BEARER_TOKEN") {
            warnings.push(
                "Twitter analysis is enabled but TWITTER_BEARER_TOKEN is not set; \
                 sentiment signals will be skipped"
                    .to_string(),
            );
        }
        warnings
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// `true` when only the owner may read or write (and nobody may execute).
#[must_use]
pub fn is_owner_only(mode: u32) -> bool {
    mode & 0o777 == OWNER_ONLY_MODE
}

/// Skeleton shown to an operator who has not created the file yet.
#[must_use]
pub fn example_content(required: &[&str]) -> String {
    required.iter().fold(String::new(), |mut out, key| {
        out.push_str(key);
        out.push_str("=...\n");
        out
    })
}
