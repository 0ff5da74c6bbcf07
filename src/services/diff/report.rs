//! 두 버전의 비교 리포트
//!
//! 텍스트 diff와 주석 diff는 서로 독립이라 블로킹 스레드 두 개에서 동시에 계산하고,
//! 둘 다 끝나면 합쳐서 요약을 만듭니다.

use std::time::Duration;

use crate::db::VersionStore;
use crate::error::AppError;
use crate::models::*;

use super::{compute_annotation_diff, compute_text_diff};

/// 저장된 두 버전을 비교합니다.
///
/// - 같은 ID끼리는 저장소를 조회하기 전에 `IdenticalVersions`로 거부
/// - 어느 한쪽이라도 없으면 `VersionNotFound`
/// - 전체 계산이 `limit` 안에 끝나지 않으면 `Timeout`
///
/// 다른 문서의 버전끼리 비교하는 것도 허용합니다.
pub async fn compute_full_diff(
    store: &VersionStore,
    base_version_id: &str,
    compare_version_id: &str,
    limit: Duration,
) -> Result<DiffReport, AppError> {
    if base_version_id == compare_version_id {
        return Err(AppError::IdenticalVersions(base_version_id.to_string()));
    }

    let work = async {
        let base = store.get_by_id(base_version_id).await?;
        let compare = store.get_by_id(compare_version_id).await?;

        let (base_pages, compare_pages) = (base.pages()?, compare.pages()?);
        let (base_annotations, compare_annotations) = (base.annotations()?, compare.annotations()?);

        let text_task =
            tokio::task::spawn_blocking(move || compute_text_diff(&base_pages, &compare_pages));
        let annotation_task = tokio::task::spawn_blocking(move || {
            compute_annotation_diff(&base_annotations, &compare_annotations)
        });

        let (text_diffs, annotation_diff) = tokio::try_join!(text_task, annotation_task)
            .map_err(|e| AppError::Internal(format!("diff task failed: {e}")))?;

        Ok::<_, AppError>(build_report(
            base_version_id,
            compare_version_id,
            text_diffs,
            annotation_diff,
        ))
    };

    // 시간 초과 시 블로킹 스레드는 끝까지 돌지만 결과는 버려집니다.
    let report = tokio::time::timeout(limit, work).await.map_err(|_| {
        AppError::Timeout(format!(
            "diff of {base_version_id} and {compare_version_id} exceeded {limit:?}"
        ))
    })??;

    tracing::debug!(
        "Compared {} with {}: {} change(s)",
        base_version_id,
        compare_version_id,
        report.summary.total_changes
    );
    Ok(report)
}

pub fn build_report(
    base_version_id: &str,
    compare_version_id: &str,
    text_diffs: Vec<TextDiff>,
    annotation_diff: AnnotationDiffResult,
) -> DiffReport {
    let text_changed_page_count = text_diffs.iter().filter(|d| d.has_changes).count();
    let summary = DiffSummary {
        total_changes: text_changed_page_count
            + annotation_diff.added.len()
            + annotation_diff.deleted.len()
            + annotation_diff.modified.len(),
        text_changed_page_count,
        annotations_added: annotation_diff.added.len(),
        annotations_removed: annotation_diff.deleted.len(),
        annotations_modified: annotation_diff.modified.len(),
    };

    DiffReport {
        base_version_id: base_version_id.to_string(),
        compare_version_id: compare_version_id.to_string(),
        text_diffs,
        annotation_changes: annotation_changes(&annotation_diff),
        annotation_diff,
        summary,
    }
}

/// 주석 diff를 변경 기록 모양으로 평탄화합니다. 수정은 새 값으로 기록됩니다.
pub fn annotation_changes(diff: &AnnotationDiffResult) -> Vec<AnnotationChange> {
    let change = |entry: &AnnotationEntry, action| AnnotationChange {
        annotation_id: entry.id.clone(),
        action,
        kind: entry.kind.clone(),
        page_index: entry.page_index,
        contents: entry.contents.clone(),
    };

    diff.added
        .iter()
        .map(|e| change(e, ChangeAction::Create))
        .chain(diff.deleted.iter().map(|e| change(e, ChangeAction::Delete)))
        .chain(diff.modified.iter().map(|m| change(&m.new, ChangeAction::Update)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{entry, new_version, page, seed_document};

    const LIMIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn rejects_comparing_a_version_with_itself() {
        let (store, _doc, v1) = seed_document().await;
        let err = compute_full_diff(&store, &v1.id, &v1.id, LIMIT).await.unwrap_err();
        assert!(matches!(err, AppError::IdenticalVersions(id) if id == v1.id));
    }

    #[tokio::test]
    async fn identical_ids_are_rejected_before_lookup() {
        let (store, _doc, _v1) = seed_document().await;
        let err = compute_full_diff(&store, "ghost", "ghost", LIMIT).await.unwrap_err();
        assert!(matches!(err, AppError::IdenticalVersions(_)));
    }

    #[tokio::test]
    async fn unknown_version_is_not_found() {
        let (store, _doc, v1) = seed_document().await;
        let err = compute_full_diff(&store, &v1.id, "missing", LIMIT).await.unwrap_err();
        assert!(matches!(err, AppError::VersionNotFound(id) if id == "missing"));
    }

    #[tokio::test]
    async fn report_combines_text_and_annotation_changes() {
        let (store, doc, _v1) = seed_document().await;

        let mut base = new_version(&doc.id, 2, "base");
        base.page_text_snapshot = vec![page(0, "Hello world"), page(1, "Unchanged page")];
        base.annotation_snapshot = vec![
            entry("a1", "note", 0, Some("hi")),
            entry("a2", "highlight", 1, None),
        ];
        let base = store.create(&base).await.unwrap();

        let mut compare = new_version(&doc.id, 3, "compare");
        compare.page_text_snapshot = vec![page(0, "Hello there world"), page(1, "Unchanged page")];
        compare.annotation_snapshot = vec![
            entry("a1", "note", 0, Some("hello")),
            entry("a3", "freetext", 1, Some("added")),
        ];
        let compare = store.create(&compare).await.unwrap();

        let report = compute_full_diff(&store, &base.id, &compare.id, LIMIT).await.unwrap();

        assert_eq!(report.text_diffs.len(), 2);
        assert!(report.text_diffs[0].has_changes);
        assert_eq!(report.text_diffs[0].added_char_count, 6);
        assert!(!report.text_diffs[1].has_changes);

        assert_eq!(
            report.summary,
            DiffSummary {
                total_changes: 4,
                text_changed_page_count: 1,
                annotations_added: 1,
                annotations_removed: 1,
                annotations_modified: 1,
            }
        );

        let actions: Vec<(&str, ChangeAction)> = report
            .annotation_changes
            .iter()
            .map(|c| (c.annotation_id.as_str(), c.action))
            .collect();
        assert_eq!(
            actions,
            vec![
                ("a3", ChangeAction::Create),
                ("a2", ChangeAction::Delete),
                ("a1", ChangeAction::Update),
            ]
        );
        assert_eq!(report.annotation_changes[2].contents.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn identical_snapshots_report_no_changes() {
        let (store, doc, v1) = seed_document().await;
        let v2 = store.create(&new_version(&doc.id, 2, "no edits")).await.unwrap();

        let report = compute_full_diff(&store, &v1.id, &v2.id, LIMIT).await.unwrap();
        assert_eq!(report.summary, DiffSummary::default());
        assert!(report.annotation_changes.is_empty());
    }

    #[test]
    fn summary_total_counts_pages_not_characters() {
        let diffs = vec![
            crate::services::diff::diff_page(0, "aaa", "bbbbbb"),
            crate::services::diff::diff_page(1, "same", "same"),
        ];
        let report = build_report("b", "c", diffs, AnnotationDiffResult::default());
        assert_eq!(report.summary.total_changes, 1);
        assert_eq!(report.summary.text_changed_page_count, 1);
    }
}
