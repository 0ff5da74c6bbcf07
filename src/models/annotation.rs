//! 주석(annotation) 관련 데이터 타입
//!
//! 세 가지 표현이 있습니다:
//! - [`RawAnnotation`]: 렌더러가 이벤트로 보내는 원본. `type`은 렌더러 고유의 하위 타입 문자열입니다.
//! - [`TrackedAnnotation`]: 추적기가 유지하는 살아있는 사본. 종류별 필드는 [`AnnotationKind`]에 담깁니다.
//! - [`AnnotationEntry`]: 버전에 저장되는 스냅샷 항목이자 diff 엔진의 비교 단위.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 스냅샷에 저장되는 주석 한 개 `{ id, type, pageIndex, contents?, color? }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub page_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// 읽기 시 허용하는 두 가지 스냅샷 형태.
/// 맨 배열 `[...]`과 `{ "annotations": [...] }`는 같은 것으로 취급합니다.
/// 쓸 때는 항상 맨 배열로 저장합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationSnapshot {
    Bare(Vec<AnnotationEntry>),
    Wrapped { annotations: Vec<AnnotationEntry> },
}

impl AnnotationSnapshot {
    pub fn into_entries(self) -> Vec<AnnotationEntry> {
        match self {
            AnnotationSnapshot::Bare(entries) => entries,
            AnnotationSnapshot::Wrapped { annotations } => annotations,
        }
    }

    /// 저장된 JSON 문자열을 항목 목록으로 파싱합니다.
    pub fn parse(json: &str) -> Result<Vec<AnnotationEntry>, serde_json::Error> {
        serde_json::from_str::<AnnotationSnapshot>(json).map(AnnotationSnapshot::into_entries)
    }
}

impl Default for AnnotationSnapshot {
    fn default() -> Self {
        AnnotationSnapshot::Bare(Vec::new())
    }
}

/// 렌더러가 생성/수정/삭제 이벤트와 함께 보내는 원본 주석
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnnotation {
    /// 렌더러 자신의 식별자 (추적기에서는 `external_id`)
    pub id: String,
    /// 렌더러 고유의 하위 타입 (예: "pspdfkit/markup/highlight", "Underline")
    #[serde(rename = "type")]
    pub subtype: String,
    pub page_index: usize,
    #[serde(default)]
    pub contents: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// 저장된 스냅샷 항목을 렌더러 원본 모양으로 되돌립니다 (버전 전환 후 재동기화용).
impl From<&AnnotationEntry> for RawAnnotation {
    fn from(entry: &AnnotationEntry) -> Self {
        RawAnnotation {
            id: entry.id.clone(),
            subtype: entry.kind.clone(),
            page_index: entry.page_index,
            contents: entry.contents.clone(),
            color: entry.color.clone(),
        }
    }
}

/// 정규화된 주석 종류. 종류마다 그 종류에 유효한 필드만 가집니다.
///
/// 알 수 없는 하위 타입은 조용히 다른 종류로 바꾸지 않고
/// `Unknown`에 원래 이름을 그대로 보존합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AnnotationKind {
    Highlight {
        color: Option<String>,
        contents: Option<String>,
    },
    Note {
        contents: Option<String>,
        color: Option<String>,
    },
    #[serde(rename = "freetext")]
    FreeText {
        contents: Option<String>,
        color: Option<String>,
    },
    Redaction {
        color: Option<String>,
    },
    TextEdit {
        contents: Option<String>,
    },
    Unknown {
        subtype: String,
        contents: Option<String>,
        color: Option<String>,
    },
}

impl AnnotationKind {
    /// 렌더러의 원본 주석을 정규화된 종류로 변환합니다.
    pub fn from_raw(raw: &RawAnnotation) -> Self {
        let contents = raw.contents.clone();
        let color = raw.color.clone();
        match normalize_subtype(&raw.subtype).as_str() {
            "highlight" | "underline" | "strikeout" | "squiggly" | "markup" | "texthighlight" => {
                AnnotationKind::Highlight { color, contents }
            }
            "note" | "text" | "comment" | "sticky" | "stickynote" | "popup" => {
                AnnotationKind::Note { contents, color }
            }
            "freetext" | "callout" | "typewriter" | "textbox" => {
                AnnotationKind::FreeText { contents, color }
            }
            "redaction" | "redact" => AnnotationKind::Redaction { color },
            "textedit" | "replace" | "insert" | "caret" => AnnotationKind::TextEdit { contents },
            _ => AnnotationKind::Unknown {
                subtype: raw.subtype.clone(),
                contents,
                color,
            },
        }
    }

    /// 변경 기록과 스냅샷에 쓰이는 타입 이름
    pub fn type_name(&self) -> &str {
        match self {
            AnnotationKind::Highlight { .. } => "highlight",
            AnnotationKind::Note { .. } => "note",
            AnnotationKind::FreeText { .. } => "freetext",
            AnnotationKind::Redaction { .. } => "redaction",
            AnnotationKind::TextEdit { .. } => "textEdit",
            AnnotationKind::Unknown { subtype, .. } => subtype,
        }
    }

    pub fn contents(&self) -> Option<&str> {
        match self {
            AnnotationKind::Highlight { contents, .. }
            | AnnotationKind::Note { contents, .. }
            | AnnotationKind::FreeText { contents, .. }
            | AnnotationKind::TextEdit { contents }
            | AnnotationKind::Unknown { contents, .. } => contents.as_deref(),
            AnnotationKind::Redaction { .. } => None,
        }
    }

    /// 수정 이벤트의 내용과 색을 반영합니다. 종류는 처음 추적할 때 정해진 그대로입니다.
    /// 종류에 없는 필드는 무시합니다.
    pub fn apply_update(&mut self, new_contents: Option<String>, new_color: Option<String>) {
        match self {
            AnnotationKind::Highlight { contents, color }
            | AnnotationKind::Note { contents, color }
            | AnnotationKind::FreeText { contents, color }
            | AnnotationKind::Unknown { contents, color, .. } => {
                *contents = new_contents;
                *color = new_color;
            }
            AnnotationKind::Redaction { color } => *color = new_color,
            AnnotationKind::TextEdit { contents } => *contents = new_contents,
        }
    }

    #[cfg(test)]
    pub fn color(&self) -> Option<&str> {
        match self {
            AnnotationKind::Highlight { color, .. }
            | AnnotationKind::Note { color, .. }
            | AnnotationKind::FreeText { color, .. }
            | AnnotationKind::Redaction { color }
            | AnnotationKind::Unknown { color, .. } => color.as_deref(),
            AnnotationKind::TextEdit { .. } => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, AnnotationKind::Unknown { .. })
    }
}

/// "pspdfkit/markup/Strike-Out" → "strikeout"
fn normalize_subtype(subtype: &str) -> String {
    let tail = subtype.rsplit(['/', ':']).next().unwrap_or(subtype);
    tail.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// 렌더러에 현재 존재하는 주석 하나의 살아있는 사본
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedAnnotation {
    pub id: String,
    /// 렌더러 이벤트를 이 기록에 다시 연결하는 데 쓰는 렌더러 측 ID
    pub external_id: String,
    pub page_index: usize,
    #[serde(flatten)]
    pub kind: AnnotationKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

/// 마지막 커밋 이후의 변경 로그 한 줄. 렌더러 이벤트 하나당 하나씩, 도착 순서대로 쌓입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationChangeRecord {
    pub id: String,
    /// 추적기 쪽 ID ([`TrackedAnnotation::id`])
    pub annotation_id: String,
    pub external_id: String,
    pub action: ChangeAction,
    #[serde(rename = "type")]
    pub kind: String,
    pub page_index: usize,
    pub contents: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(subtype: &str) -> RawAnnotation {
        RawAnnotation {
            id: "ext-1".to_string(),
            subtype: subtype.to_string(),
            page_index: 0,
            contents: Some("memo".to_string()),
            color: Some("#ffcc00".to_string()),
        }
    }

    #[test]
    fn renderer_subtypes_collapse_onto_canonical_kinds() {
        assert_eq!(AnnotationKind::from_raw(&raw("pspdfkit/markup/highlight")).type_name(), "highlight");
        assert_eq!(AnnotationKind::from_raw(&raw("Strike-Out")).type_name(), "highlight");
        assert_eq!(AnnotationKind::from_raw(&raw("pspdfkit/note")).type_name(), "note");
        assert_eq!(AnnotationKind::from_raw(&raw("FreeText")).type_name(), "freetext");
        assert_eq!(AnnotationKind::from_raw(&raw("redaction")).type_name(), "redaction");
        assert_eq!(AnnotationKind::from_raw(&raw("text_edit")).type_name(), "textEdit");
    }

    #[test]
    fn unmapped_subtype_is_kept_as_unknown() {
        let kind = AnnotationKind::from_raw(&raw("pspdfkit/ink"));
        assert!(kind.is_unknown());
        assert_eq!(kind.type_name(), "pspdfkit/ink");
        assert_eq!(kind.contents(), Some("memo"));
    }

    #[test]
    fn kinds_only_carry_their_own_fields() {
        let redaction = AnnotationKind::from_raw(&raw("redact"));
        assert_eq!(redaction.contents(), None);
        assert_eq!(redaction.color(), Some("#ffcc00"));

        let edit = AnnotationKind::from_raw(&raw("TextEdit"));
        assert_eq!(edit.contents(), Some("memo"));
        assert_eq!(edit.color(), None);
    }

    #[test]
    fn snapshot_accepts_bare_and_wrapped_shapes() {
        let bare = r#"[{"id":"a1","type":"note","pageIndex":2,"contents":"draft"}]"#;
        let wrapped = r#"{"annotations":[{"id":"a1","type":"note","pageIndex":2,"contents":"draft"}]}"#;

        let from_bare = AnnotationSnapshot::parse(bare).unwrap();
        let from_wrapped = AnnotationSnapshot::parse(wrapped).unwrap();

        assert_eq!(from_bare, from_wrapped);
        assert_eq!(from_bare[0].page_index, 2);
        assert_eq!(from_bare[0].color, None);
    }

    #[test]
    fn snapshot_rejects_other_shapes() {
        assert!(AnnotationSnapshot::parse(r#"{"items":[]}"#).is_err());
    }

    #[test]
    fn tracked_annotation_serializes_kind_inline() {
        let now = Utc::now();
        let tracked = TrackedAnnotation {
            id: "t1".to_string(),
            external_id: "ext-1".to_string(),
            page_index: 1,
            kind: AnnotationKind::Note {
                contents: Some("hi".to_string()),
                color: None,
            },
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&tracked).unwrap();
        assert_eq!(value["type"], "note");
        assert_eq!(value["contents"], "hi");
        assert_eq!(value["externalId"], "ext-1");
    }
}
