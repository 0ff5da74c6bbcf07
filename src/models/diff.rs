//! 버전 비교 결과 타입
//!
//! 리포트는 요청마다 새로 계산되며 버전의 일부로 저장되지 않습니다.

use serde::{Deserialize, Serialize};

use super::{AnnotationEntry, ChangeAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffOp {
    Equal,
    Insert,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSegment {
    pub op: DiffOp,
    pub text: String,
}

/// 페이지 하나의 텍스트 diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDiff {
    pub page_index: usize,
    pub segments: Vec<DiffSegment>,
    pub has_changes: bool,
    pub added_char_count: usize,
    pub removed_char_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationModification {
    pub old: AnnotationEntry,
    pub new: AnnotationEntry,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationDiffResult {
    pub added: Vec<AnnotationEntry>,
    pub deleted: Vec<AnnotationEntry>,
    pub modified: Vec<AnnotationModification>,
}

/// 리포트에 평탄하게 나열되는 주석 변경 한 건 (변경 기록과 같은 모양)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationChange {
    pub annotation_id: String,
    pub action: ChangeAction,
    #[serde(rename = "type")]
    pub kind: String,
    pub page_index: usize,
    pub contents: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub total_changes: usize,
    pub text_changed_page_count: usize,
    pub annotations_added: usize,
    pub annotations_removed: usize,
    pub annotations_modified: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport {
    pub base_version_id: String,
    pub compare_version_id: String,
    pub text_diffs: Vec<TextDiff>,
    pub annotation_changes: Vec<AnnotationChange>,
    pub annotation_diff: AnnotationDiffResult,
    pub summary: DiffSummary,
}
