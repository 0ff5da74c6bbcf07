//! # 문서 세션 API 라우트 핸들러
//!
//! 뷰어가 문서를 여는 동안의 주석 변경 추적과 커밋/버전 전환을 처리합니다.
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 핸들러 | 설명 |
//! |--------|------|--------|------|
//! | POST | /api/v1/documents/{id}/session | `open_session` | 세션 열기 (이미 열려 있으면 그대로) |
//! | GET | /api/v1/documents/{id}/session | `get_session_status` | 상태, 현재 버전, 보류 변경 수 |
//! | DELETE | /api/v1/documents/{id}/session | `close_session` | 세션 닫기 (보류 변경은 버려짐) |
//! | POST | /api/v1/documents/{id}/session/events | `post_renderer_event` | 주석 생성/수정/삭제 이벤트 |
//! | PUT | /api/v1/documents/{id}/session/annotations | `resync_annotations` | 렌더러 주석 전체로 재동기화 |
//! | GET | /api/v1/documents/{id}/session/changes | `list_pending_changes` | 마지막 커밋 이후 변경 로그 |
//! | POST | /api/v1/documents/{id}/session/commit | `commit_session` | 현재 상태를 새 버전으로 저장 |
//! | POST | /api/v1/documents/{id}/session/switch | `request_switch` | 다른 버전으로 전환 요청 |
//! | POST | /api/v1/documents/{id}/session/switch/resolve | `resolve_switch` | 확인 대기 중인 전환 취소/진행 |
//!
//! ## 세션 사용 흐름
//! ```text
//! 1. 뷰어 진입 → POST /documents/{id}/session
//! 2. 주석 작업 → POST .../session/events (이벤트마다, 발생 순서대로)
//! 3. 저장 → POST .../session/commit { message, snapshot }
//! 4. 과거 버전 보기 → POST .../session/switch { target_version_id }
//!    → confirmation_required 이면 POST .../session/switch/resolve { decision }
//! 5. 뷰어 나감 → DELETE /documents/{id}/session
//! ```
//!
//! 세션이 열려 있지 않은 문서에 대한 요청은 404입니다.

use crate::{
    error::AppError,
    models::*,
    routes::documents::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

pub async fn open_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatus>, AppError> {
    let handle = state.sessions.open(&id).await?;
    Ok(Json(handle.status().await?))
}

pub async fn get_session_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatus>, AppError> {
    let handle = state.sessions.get(&id).await?;
    Ok(Json(handle.status().await?))
}

pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.sessions.close(&id).await {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// 이벤트는 큐에 넣기만 하고 바로 202를 돌려줍니다.
/// 같은 세션의 이후 요청(커밋, 상태 조회 등)은 이 이벤트가 반영된 뒤에 처리됩니다.
pub async fn post_renderer_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(event): Json<RendererEvent>,
) -> Result<StatusCode, AppError> {
    state.sessions.get(&id).await?.send_event(event)?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn resync_annotations(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(annotations): Json<Vec<RawAnnotation>>,
) -> Result<StatusCode, AppError> {
    state.sessions.get(&id).await?.resync(annotations)?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn list_pending_changes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let changes = state.sessions.get(&id).await?.pending_changes().await?;
    Ok(Json(json!({ "changes": changes })))
}

/// 성공 시 HTTP 201 Created와 새 버전의 요약을 반환합니다.
pub async fn commit_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CommitRequest>,
) -> Result<(StatusCode, Json<VersionSummary>), AppError> {
    let handle = state.sessions.get(&id).await?;
    let version = handle.commit(req.message, Box::new(req.snapshot)).await?;
    Ok((StatusCode::CREATED, Json(version.summary())))
}

pub async fn request_switch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SwitchRequest>,
) -> Result<Json<SwitchOutcome>, AppError> {
    let handle = state.sessions.get(&id).await?;
    Ok(Json(handle.request_switch(req.target_version_id).await?))
}

pub async fn resolve_switch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ResolveSwitchRequest>,
) -> Result<Json<SwitchOutcome>, AppError> {
    let handle = state.sessions.get(&id).await?;
    Ok(Json(handle.resolve_switch(req.decision).await?))
}
