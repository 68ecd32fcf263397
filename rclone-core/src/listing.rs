//! Normalizing `lsjson` listings into directory-only or file-only views

use serde::{Deserialize, Serialize};

/// Substring present on every `lsjson` line describing a directory
pub const DIR_MARKER: &str = "\"IsDir\":true";
/// Substring present on every `lsjson` line describing a file
pub const FILE_MARKER: &str = "\"IsDir\":false";

/// How directory listings are requested from rclone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingFormat {
    /// `lsjson`, one JSON record per line
    #[default]
    Json,
    /// The legacy `ls` / `lsd` / `lsl` text listings
    Text,
}

/// How `lsjson` lines are classified when filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Substring match on [`DIR_MARKER`] / [`FILE_MARKER`].
    ///
    /// A file whose name contains one of the markers is misclassified.
    #[default]
    LineMarker,
    /// Parse each line as a JSON object and read its `IsDir` field
    Structural,
}

/// Which kind of entry a filtered listing keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directories,
    Files,
}

/// Keep the lines of an `lsjson` listing that are not entries of the other kind
///
/// Filtering is line by line: the `[` and `]` lines, and anything else that
/// cannot be classified, are kept in place.
pub fn retain_entries(lines: Vec<String>, keep: EntryKind, mode: FilterMode) -> Vec<String> {
    lines
        .into_iter()
        .filter(|line| !is_excluded(line, keep, mode))
        .collect()
}

fn is_excluded(line: &str, keep: EntryKind, mode: FilterMode) -> bool {
    match mode {
        FilterMode::LineMarker => {
            let unwanted = match keep {
                EntryKind::Directories => FILE_MARKER,
                EntryKind::Files => DIR_MARKER,
            };
            line.contains(unwanted)
        }
        FilterMode::Structural => match entry_is_dir(line) {
            Some(is_dir) => match keep {
                EntryKind::Directories => !is_dir,
                EntryKind::Files => is_dir,
            },
            None => false,
        },
    }
}

/// `IsDir` of a single `lsjson` line, if the line is an entry at all
pub fn entry_is_dir(line: &str) -> Option<bool> {
    let record = line.trim().trim_end_matches(',');
    let value: serde_json::Value = serde_json::from_str(record).ok()?;
    value.as_object()?.get("IsDir")?.as_bool()
}
