use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How installed artifacts are ranked from oldest to newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionOrder {
    /// Plain byte-wise comparison of file names (`bouncer-10.jar` sorts
    /// before `bouncer-9.jar`).
    Lexicographic,
    /// Semver-aware comparison of the extracted versions, falling back to
    /// string comparison for versions that do not parse.
    Semantic,
}

impl Default for VersionOrder {
    fn default() -> Self {
        Self::Semantic
    }
}

impl VersionOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            VersionOrder::Lexicographic => "lexicographic",
            VersionOrder::Semantic => "semantic",
        }
    }
}

impl fmt::Display for VersionOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lexicographic" | "lexical" => Ok(VersionOrder::Lexicographic),
            "semantic" | "semver" => Ok(VersionOrder::Semantic),
            other => anyhow::bail!(
                "Unknown version order: {}. Use 'lexicographic' or 'semantic'",
                other
            ),
        }
    }
}

/// Parse a version, padding bare `1` or `1.2` forms to `1.0.0` / `1.2.0`.
///
/// A `-` or `+` suffix is kept as semver pre-release or build metadata, so
/// `1.2-SNAPSHOT` parses as `1.2.0-SNAPSHOT`.
pub fn parse_lenient(input: &str) -> Option<semver::Version> {
    if let Ok(version) = semver::Version::parse(input) {
        return Some(version);
    }

    let (core, suffix) = match input.find(['-', '+']) {
        Some(idx) => input.split_at(idx),
        None => (input, ""),
    };
    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 3
        || parts
            .iter()
            .any(|part| part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()))
    {
        return None;
    }

    let mut padded = parts.join(".");
    for _ in parts.len()..3 {
        padded.push_str(".0");
    }
    padded.push_str(suffix);
    semver::Version::parse(&padded).ok()
}

/// Compare two version strings to determine which is newer.
///
/// Versions that parse always rank above versions that do not, so the result
/// is a total order even over mixed inputs.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_lenient(a), parse_lenient(b)) {
        (Some(a_ver), Some(b_ver)) => a_ver.cmp(&b_ver).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}
