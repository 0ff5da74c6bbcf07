//! 주석 스냅샷 diff
//!
//! 두 스냅샷의 항목을 `id`로 맞춰 추가/삭제/수정을 구분합니다.
//! 수정 여부는 `contents`, `color`, `pageIndex`, `type` 네 필드로만 판단합니다.
//! 종류(`type`)가 바뀐 같은 ID의 주석은 삭제+추가가 아니라 수정입니다.

use std::collections::{HashMap, HashSet};

use crate::models::{AnnotationDiffResult, AnnotationEntry, AnnotationModification};

/// - `added`: compare에만 있는 항목 (compare 순서)
/// - `deleted`: base에만 있는 항목 (base 순서)
/// - `modified`: 양쪽에 있고 비교 필드가 다른 항목 (base 순서)
///
/// 한 스냅샷 안에서 같은 ID가 여러 번 나오면 마지막 항목이 그 ID를 대표합니다.
pub fn compute_annotation_diff(
    base: &[AnnotationEntry],
    compare: &[AnnotationEntry],
) -> AnnotationDiffResult {
    let base_index = index_by_id(base);
    let compare_index = index_by_id(compare);

    let added = unique_in_order(compare, &compare_index)
        .filter(|entry| !base_index.contains_key(entry.id.as_str()))
        .cloned()
        .collect();

    let deleted = unique_in_order(base, &base_index)
        .filter(|entry| !compare_index.contains_key(entry.id.as_str()))
        .cloned()
        .collect();

    let modified = unique_in_order(base, &base_index)
        .filter_map(|old| {
            let new = compare_index.get(old.id.as_str())?;
            is_modified(old, new).then(|| AnnotationModification {
                old: old.clone(),
                new: (*new).clone(),
            })
        })
        .collect();

    AnnotationDiffResult {
        added,
        deleted,
        modified,
    }
}

fn is_modified(old: &AnnotationEntry, new: &AnnotationEntry) -> bool {
    old.contents != new.contents
        || old.color != new.color
        || old.page_index != new.page_index
        || old.kind != new.kind
}

fn index_by_id(entries: &[AnnotationEntry]) -> HashMap<&str, &AnnotationEntry> {
    entries.iter().map(|e| (e.id.as_str(), e)).collect()
}

/// 첫 등장 위치 순서로, ID마다 대표 항목 하나씩
fn unique_in_order<'a>(
    entries: &'a [AnnotationEntry],
    index: &'a HashMap<&'a str, &'a AnnotationEntry>,
) -> impl Iterator<Item = &'a AnnotationEntry> + 'a {
    let mut seen = HashSet::new();
    entries.iter().filter_map(move |entry| {
        if seen.insert(entry.id.as_str()) {
            index.get(entry.id.as_str()).copied()
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, kind: &str, page: usize, contents: Option<&str>, color: Option<&str>) -> AnnotationEntry {
        AnnotationEntry {
            id: id.to_string(),
            kind: kind.to_string(),
            page_index: page,
            contents: contents.map(str::to_string),
            color: color.map(str::to_string),
        }
    }

    fn ids(entries: &[AnnotationEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn classifies_added_deleted_and_modified() {
        let base = vec![
            entry("a1", "note", 0, Some("hi"), None),
            entry("a2", "highlight", 1, None, Some("#ff0")),
        ];
        let compare = vec![
            entry("a1", "note", 0, Some("hello"), None),
            entry("a3", "freetext", 2, Some("new"), None),
        ];

        let diff = compute_annotation_diff(&base, &compare);

        assert_eq!(ids(&diff.added), vec!["a3"]);
        assert_eq!(ids(&diff.deleted), vec!["a2"]);
        assert_eq!(diff.modified.len(), 1);
        assert_eq!(diff.modified[0].old.contents.as_deref(), Some("hi"));
        assert_eq!(diff.modified[0].new.contents.as_deref(), Some("hello"));
    }

    #[test]
    fn unchanged_entries_are_not_reported() {
        let snapshot = vec![
            entry("a1", "note", 0, Some("same"), Some("#000")),
            entry("a2", "redaction", 3, None, Some("#000")),
        ];
        assert_eq!(
            compute_annotation_diff(&snapshot, &snapshot.clone()),
            AnnotationDiffResult::default()
        );
    }

    #[test]
    fn type_change_with_same_id_is_a_modification() {
        let base = vec![entry("a1", "note", 0, Some("x"), None)];
        let compare = vec![entry("a1", "freetext", 0, Some("x"), None)];

        let diff = compute_annotation_diff(&base, &compare);
        assert!(diff.added.is_empty());
        assert!(diff.deleted.is_empty());
        assert_eq!(diff.modified.len(), 1);
        assert_eq!(diff.modified[0].new.kind, "freetext");
    }

    #[test]
    fn moving_to_another_page_is_a_modification() {
        let base = vec![entry("a1", "highlight", 0, None, Some("#ff0"))];
        let compare = vec![entry("a1", "highlight", 4, None, Some("#ff0"))];
        assert_eq!(compute_annotation_diff(&base, &compare).modified.len(), 1);
    }

    #[test]
    fn swapping_sides_swaps_added_and_deleted() {
        let base = vec![entry("a1", "note", 0, None, None), entry("a2", "note", 0, None, None)];
        let compare = vec![entry("a2", "note", 0, Some("edited"), None), entry("a4", "note", 1, None, None)];

        let forward = compute_annotation_diff(&base, &compare);
        let backward = compute_annotation_diff(&compare, &base);

        assert_eq!(forward.added, backward.deleted);
        assert_eq!(forward.deleted, backward.added);
        assert_eq!(forward.modified.len(), backward.modified.len());
        assert_eq!(forward.modified[0].old, backward.modified[0].new);
        assert_eq!(forward.modified[0].new, backward.modified[0].old);
    }

    #[test]
    fn results_follow_snapshot_order() {
        let base = vec![
            entry("z", "note", 0, None, None),
            entry("m", "note", 0, None, None),
            entry("a", "note", 0, None, None),
        ];
        let compare = vec![
            entry("q", "note", 0, None, None),
            entry("b", "note", 0, None, None),
        ];

        let diff = compute_annotation_diff(&base, &compare);
        assert_eq!(ids(&diff.deleted), vec!["z", "m", "a"]);
        assert_eq!(ids(&diff.added), vec!["q", "b"]);
    }

    #[test]
    fn duplicate_ids_are_reported_once() {
        let base: Vec<AnnotationEntry> = Vec::new();
        let compare = vec![
            entry("a1", "note", 0, Some("first"), None),
            entry("a1", "note", 0, Some("second"), None),
        ];

        let diff = compute_annotation_diff(&base, &compare);
        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.added[0].contents.as_deref(), Some("second"));
    }
}
