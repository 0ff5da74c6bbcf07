//! # 문서(Document) 라우트 핸들러
//!
//! 문서 업로드와 조회를 처리하는 HTTP 핸들러 함수들입니다.
//! 문서는 업로드로만 생기고, 이후의 변경은 모두 커밋(새 버전)으로 이뤄집니다.
//!
//! ## 엔드포인트
//! - `GET  /api/v1/documents`      → 문서 목록 조회
//! - `POST /api/v1/documents`      → 새 문서 업로드 (버전 1 "Initial upload" 생성)
//! - `GET  /api/v1/documents/{id}` → 단일 문서 조회
//!
//! ## Axum 핸들러 패턴
//! Axum 핸들러는 **Extractor(추출기)**를 매개변수로 받습니다.
//! Extractor는 HTTP 요청에서 데이터를 자동으로 추출합니다:
//! - `State(state)`: 앱 전역 상태 (DB 풀, 버전 저장소, 세션 레지스트리)
//! - `Path(id)`: URL 경로 파라미터 (예: /documents/{id}에서 id)
//! - `Json(body)`: 요청 본문을 JSON으로 파싱하여 구조체로 변환
//!
//! 반환 타입이 `Result<T, AppError>`이면, Axum이 자동으로:
//! - `Ok(T)` → T를 HTTP 응답으로 변환 (IntoResponse 트레이트 사용)
//! - `Err(AppError)` → AppError를 에러 JSON 응답으로 변환

use std::time::Duration;

use crate::{
    db,            // 데이터베이스 접근 계층
    db::VersionStore,
    error::AppError,
    models::*,     // 데이터 모델 구조체들
    services::{self, renderer::CaptureLimits, SessionRegistry},
};
use axum::{
    extract::{Path, State}, // Axum Extractor: 요청에서 데이터 추출
    http::StatusCode,        // HTTP 상태 코드 (200, 201, 404 등)
    Json,                    // JSON 요청/응답 래퍼
};
use serde_json::{json, Value}; // JSON 값 생성 유틸리티
use sqlx::SqlitePool;          // SQLite 연결 풀 타입

// #[derive(Clone)]: AppState가 Clone 트레이트를 구현하게 합니다.
// Axum의 State Extractor는 내부적으로 AppState를 clone하므로 필수입니다.
// SqlitePool, VersionStore, SessionRegistry 모두 내부가 Arc라 clone이 싸고 같은 것을 공유합니다.

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
/// Axum의 의존성 주입(Dependency Injection) 메커니즘입니다.
#[derive(Clone)]
pub struct AppState {
    /// SQLite 연결 풀 (내부적으로 Arc로 공유)
    pub pool: SqlitePool,
    /// 불변 버전 저장소
    pub store: VersionStore,
    /// 열린 문서 세션들 (문서마다 작업 큐 하나)
    pub sessions: SessionRegistry,
    /// 렌더러 상태를 읽을 때의 한도 (호출당 제한 시간, 최대 페이지 수)
    pub capture_limits: CaptureLimits,
    /// 버전 비교 한 번의 제한 시간
    pub diff_timeout: Duration,
}

/// `GET /documents`: 전체 문서 목록을 조회합니다.
///
/// # 반환값
/// `{ "documents": [...] }` 형태의 JSON
pub async fn list_documents(
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let documents = db::list_documents(&state.pool).await?;
    Ok(Json(json!({ "documents": documents })))
}

/// `GET /documents/{id}`: 단일 문서를 조회합니다.
///
/// # Extractor
/// - `Path(id)`: URL의 `{id}` 부분을 String으로 추출합니다.
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Document>, AppError> {
    let document = db::get_document(&state.pool, &id)
        .await?
        // 문서를 찾지 못하면 404 NotFound 응답이 됩니다.
        .ok_or(AppError::NotFound)?;
    Ok(Json(document))
}

/// `POST /documents`: 새 문서를 업로드합니다.
///
/// 요청 본문: `{ "name": "...", "snapshot": { "binaryContent": "<base64>", ... } }`
///
/// 렌더러가 내보낸 최초 상태를 그대로 버전 1로 저장하고,
/// 문서와 버전이 한 트랜잭션으로 함께 생깁니다.
/// 성공 시 HTTP 201 Created와 `{ "document": ..., "version": ... }`를 반환합니다.
pub async fn create_document(
    State(state): State<AppState>,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let (document, version) =
        services::upload_document(&state.store, &req.name, &req.snapshot, state.capture_limits)
            .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "document": document,
            "version": version.summary(),
        })),
    ))
}
