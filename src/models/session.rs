use serde::{Deserialize, Serialize};

use super::{RawAnnotation, RendererSnapshot, VersionSummary};

/// 문서 세션의 상태 기계
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Viewing { version_id: String },
    Committing,
    /// 보류 중인 변경이 있어 전환 전에 사용자의 확인을 기다리는 중
    SwitchConfirming { from: String, target: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub document_id: String,
    pub current_version_id: String,
    pub pending_count: usize,
    #[serde(flatten)]
    pub state: SessionState,
}

/// 렌더러가 사용자 동작과 동시에 내보내는 주석 이벤트
///
/// `{ "event": "created", "annotation": { ... } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "annotation", rename_all = "lowercase")]
pub enum RendererEvent {
    Created(RawAnnotation),
    Updated(RawAnnotation),
    Deleted(RawAnnotation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchDecision {
    Cancel,
    Discard,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SwitchOutcome {
    /// 이미 현재 버전이라 아무것도 하지 않음
    Unchanged { version_id: String },
    /// 전환 완료. 렌더러는 이 버전의 바이너리를 다시 불러와야 합니다.
    Switched { version: VersionSummary },
    ConfirmationRequired {
        target_version_id: String,
        pending_count: usize,
    },
    Cancelled { version_id: String },
}

#[derive(Debug, Deserialize)]
pub struct CommitRequest {
    pub message: String,
    pub snapshot: RendererSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct SwitchRequest {
    pub target_version_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveSwitchRequest {
    pub decision: SwitchDecision,
}
