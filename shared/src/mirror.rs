//! Mirrors a repository branch into the object store.

use glob::Pattern;
use tracing::{info, warn};

use crate::github::{RepositorySource, TreeEntry};
use crate::storage::ObjectStore;
use crate::Result;

/// Content type used for any suffix not in the table.
pub const GENERIC_BINARY: &str = "binary/octet-stream";

/// Compiled exclusion globs matched against full repository paths.
///
/// Patterns follow `fnmatch` rules: `*` crosses `/` (so `docs/*` excludes
/// `docs/a/b.md` as well), `**` is just `*`, and a `[` without a closing
/// `]` is a literal character. No entry is ever rejected.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    patterns: Vec<(String, Pattern)>,
}

impl ExclusionSet {
    /// Parse a comma separated pattern list. Entries are trimmed and empty
    /// entries dropped.
    pub fn parse(list: &str) -> Self {
        let patterns = list
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| (p.to_string(), compile_fnmatch(p)))
            .collect();

        Self { patterns }
    }

    /// First pattern matching `path`, if any, as it was configured.
    pub fn matching(&self, path: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, pattern)| pattern.matches(path))
            .map(|(source, _)| source.as_str())
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.matching(path).is_some()
    }

    pub fn patterns(&self) -> Vec<&str> {
        self.patterns.iter().map(|(source, _)| source.as_str()).collect()
    }
}

fn compile_fnmatch(pattern: &str) -> Pattern {
    let translated = fnmatch_to_glob(pattern);
    Pattern::new(&translated).unwrap_or_else(|e| {
        warn!("Exclude pattern '{}' matched literally: {}", pattern, e);
        Pattern::new(&Pattern::escape(pattern)).unwrap_or_default()
    })
}

/// Rewrite an `fnmatch` pattern into the `glob` dialect.
fn fnmatch_to_glob(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                out.push('*');
                while chars.get(i + 1) == Some(&'*') {
                    i += 1;
                }
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.extend(&chars[i..=end]);
                    i = end;
                }
                None => out.push_str(&Pattern::escape("[")),
            },
            c => out.push(c),
        }
        i += 1;
    }

    out
}

/// Index of the `]` closing the class opened at `start`. A leading `!` and
/// a `]` right after the opening bracket (or the `!`) belong to the class.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    chars[j.min(chars.len())..]
        .iter()
        .position(|&c| c == ']')
        .map(|offset| j + offset)
}

/// Guess a content type from the file suffix.
pub fn content_type_for(path: &str) -> &'static str {
    if path.ends_with(".html") {
        "text/html"
    } else if path.ends_with(".js") {
        "application/javascript"
    } else if path.ends_with(".json") {
        "application/json"
    } else if path.ends_with(".css") {
        "text/css"
    } else {
        GENERIC_BINARY
    }
}

/// What happened to one blob from the tree listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Uploaded {
        key: String,
        content_type: &'static str,
        size: usize,
    },
    Excluded {
        path: String,
        pattern: String,
    },
    Skipped {
        path: String,
        reason: String,
    },
}

/// Per-file outcomes of one mirror run, in tree order.
#[derive(Debug, Default)]
pub struct MirrorReport {
    pub outcomes: Vec<FileOutcome>,
}

impl MirrorReport {
    /// Number of files written to the object store.
    pub fn uploaded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Uploaded { .. }))
            .count()
    }

    pub fn excluded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Excluded { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Skipped { .. }))
            .count()
    }
}

/// Copy every non-excluded blob of the branch into the store, keyed by its
/// repository path.
///
/// A failed tree listing aborts the mirror. Failed downloads and failed
/// writes only skip the affected file.
pub async fn mirror_repository(
    source: &dyn RepositorySource,
    store: &dyn ObjectStore,
    exclusions: &ExclusionSet,
) -> Result<MirrorReport> {
    let listing = source.list_tree().await?;

    if listing.truncated {
        warn!(
            "Repository tree listing was truncated; only {} entries will be considered",
            listing.entries.len()
        );
    }

    let mut report = MirrorReport::default();

    for entry in listing.entries.into_iter().filter(TreeEntry::is_blob) {
        let outcome = mirror_file(source, store, exclusions, entry.path).await;
        report.outcomes.push(outcome);
    }

    info!(
        "Mirror complete: {} uploaded, {} excluded, {} skipped",
        report.uploaded(),
        report.excluded(),
        report.skipped()
    );

    Ok(report)
}

async fn mirror_file(
    source: &dyn RepositorySource,
    store: &dyn ObjectStore,
    exclusions: &ExclusionSet,
    path: String,
) -> FileOutcome {
    if let Some(pattern) = exclusions.matching(&path) {
        info!("Excluded: {}", path);
        return FileOutcome::Excluded {
            pattern: pattern.to_string(),
            path,
        };
    }

    let content = match source.fetch_file(&path).await {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to fetch {}: {}", path, e);
            return FileOutcome::Skipped {
                reason: e.to_string(),
                path,
            };
        }
    };

    let content_type = content_type_for(&path);
    let size = content.len();

    match store.put_object(&path, content, content_type).await {
        Ok(()) => FileOutcome::Uploaded {
            key: path,
            content_type,
            size,
        },
        Err(e) => {
            warn!("Failed to upload {}: {}", path, e);
            FileOutcome::Skipped {
                reason: e.to_string(),
                path,
            }
        }
    }
}
