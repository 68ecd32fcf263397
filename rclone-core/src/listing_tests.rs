//! Unit tests for listing normalization

use crate::listing::*;
use proptest::prelude::*;
use rstest::*;

/// Build one `lsjson` line the way rclone prints it
fn entry_line(path: &str, is_dir: bool, trailing_comma: bool) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    let size = if is_dir { -1 } else { 0 };
    format!(
        "{{\"Path\":\"{}\",\"Name\":\"{}\",\"Size\":{},\"ModTime\":\"2019-01-13T17:41:00Z\",\"IsDir\":{}}}{}",
        path,
        name,
        size,
        is_dir,
        if trailing_comma { "," } else { "" }
    )
}

/// Wrap entry lines in the bracket lines of a JSON array
fn listing(entries: &[(&str, bool)]) -> Vec<String> {
    let mut lines = vec!["[".to_string()];
    for (i, (path, is_dir)) in entries.iter().enumerate() {
        lines.push(entry_line(path, *is_dir, i + 1 < entries.len()));
    }
    lines.push("]".to_string());
    lines
}

#[fixture]
fn mixed_listing() -> Vec<String> {
    listing(&[
        ("Test1.txt", false),
        ("TestFolder", true),
        ("TestFolder2", true),
        ("TestFolder2/Test3.txt", false),
        ("TestFolder/Test2.txt", false),
    ])
}

mod line_marker_tests {
    use super::*;

    #[rstest]
    fn test_directories_keep_brackets_and_dirs(mixed_listing: Vec<String>) {
        let kept = retain_entries(mixed_listing.clone(), EntryKind::Directories, FilterMode::LineMarker);

        assert_eq!(kept.len(), 4);
        assert_eq!(kept[0], "[");
        assert_eq!(kept[1], mixed_listing[2]);
        assert_eq!(kept[2], mixed_listing[3]);
        assert_eq!(kept[3], "]");
    }

    #[rstest]
    fn test_files_keep_brackets_and_files(mixed_listing: Vec<String>) {
        let kept = retain_entries(mixed_listing.clone(), EntryKind::Files, FilterMode::LineMarker);

        assert_eq!(kept.len(), 5);
        assert_eq!(kept[0], "[");
        assert_eq!(kept[1], mixed_listing[1]);
        assert_eq!(kept[2], mixed_listing[4]);
        assert_eq!(kept[3], mixed_listing[5]);
        assert_eq!(kept[4], "]");
    }

    #[test]
    fn test_empty_listing() {
        let lines = vec!["[".to_string(), "]".to_string()];
        assert_eq!(retain_entries(lines.clone(), EntryKind::Files, FilterMode::LineMarker), lines);
        assert_eq!(retain_entries(lines.clone(), EntryKind::Directories, FilterMode::LineMarker), lines);
    }

    #[test]
    fn test_unrelated_lines_are_kept() {
        let lines = vec!["not json".to_string(), "".to_string()];
        assert_eq!(retain_entries(lines.clone(), EntryKind::Files, FilterMode::LineMarker), lines);
    }

    #[test]
    fn test_marker_text_in_value_is_misclassified() {
        // Unescaped marker text inside a value fools the substring match
        let line = r#"{"Path":"odd "IsDir":true name","IsDir":false},"#.to_string();

        assert!(retain_entries(vec![line.clone()], EntryKind::Files, FilterMode::LineMarker).is_empty());
        assert!(retain_entries(vec![line], EntryKind::Directories, FilterMode::LineMarker).is_empty());
    }
}

mod structural_tests {
    use super::*;

    #[rstest]
    fn test_matches_line_marker_on_well_formed_listing(mixed_listing: Vec<String>) {
        for kind in [EntryKind::Directories, EntryKind::Files] {
            assert_eq!(
                retain_entries(mixed_listing.clone(), kind, FilterMode::Structural),
                retain_entries(mixed_listing.clone(), kind, FilterMode::LineMarker),
            );
        }
    }

    #[test]
    fn test_reordered_fields() {
        let line = "{\"IsDir\": true, \"Path\":\"d\",\"Name\":\"d\"},".to_string();

        assert_eq!(entry_is_dir(&line), Some(true));
        assert!(retain_entries(vec![line.clone()], EntryKind::Files, FilterMode::Structural).is_empty());
        // The spaced form carries no exact marker, so the line filter keeps it
        assert_eq!(retain_entries(vec![line.clone()], EntryKind::Files, FilterMode::LineMarker), vec![line]);
    }

    #[test]
    fn test_marker_in_escaped_file_name() {
        let line = r#"{"Path":"a\"IsDir\":true","Name":"n","IsDir":false},"#.to_string();

        assert_eq!(entry_is_dir(&line), Some(false));
        assert_eq!(
            retain_entries(vec![line.clone()], EntryKind::Files, FilterMode::Structural),
            vec![line]
        );
    }

    #[test]
    fn test_unparseable_lines_are_kept() {
        let lines = vec!["[".to_string(), "{broken".to_string(), "]".to_string()];
        assert_eq!(retain_entries(lines.clone(), EntryKind::Directories, FilterMode::Structural), lines);
        assert_eq!(entry_is_dir("{broken"), None);
        assert_eq!(entry_is_dir("{\"IsDir\":\"yes\"}"), None);
    }
}

mod serde_tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!(serde_json::to_string(&ListingFormat::Json).unwrap(), "\"json\"");
        assert_eq!(serde_json::to_string(&ListingFormat::Text).unwrap(), "\"text\"");
        assert_eq!(serde_json::to_string(&FilterMode::LineMarker).unwrap(), "\"line_marker\"");
        assert_eq!(ListingFormat::default(), ListingFormat::Json);
        assert_eq!(FilterMode::default(), FilterMode::LineMarker);
    }
}

proptest! {
    #[test]
    fn test_filters_partition_the_listing(kinds in prop::collection::vec(any::<bool>(), 0..30)) {
        let names: Vec<String> = (0..kinds.len()).map(|i| format!("entry_{i}")).collect();
        let entries: Vec<(&str, bool)> = names.iter().map(String::as_str).zip(kinds.iter().copied()).collect();
        let lines = listing(&entries);
        let dirs = kinds.iter().filter(|d| **d).count();
        let files = kinds.len() - dirs;

        let dir_lines = retain_entries(lines.clone(), EntryKind::Directories, FilterMode::LineMarker);
        let file_lines = retain_entries(lines.clone(), EntryKind::Files, FilterMode::LineMarker);

        prop_assert_eq!(dir_lines.len(), dirs + 2);
        prop_assert_eq!(file_lines.len(), files + 2);

        // Every original line is in at least one view, brackets in both
        for line in &lines {
            prop_assert!(dir_lines.contains(line) || file_lines.contains(line));
        }
        prop_assert_eq!(dir_lines.len() + file_lines.len() - 2, lines.len());
    }
}
