//! # 에러 처리 모듈
//!
//! 버전 저장소, 주석 추적기, diff 엔진, 커밋/전환 프로토콜에서 발생할 수 있는
//! 모든 에러 종류를 하나의 `AppError`로 모아둡니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 검증/조회/순번/추출/상태 충돌 에러를 하나의 타입으로 통합
//! - `IntoResponse` 구현: 에러를 HTTP 응답으로 자동 변환

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 페이지 하나의 텍스트 추출 실패(`Extraction`)만 호출 지점에서 복구되고,
/// 나머지는 모두 작업을 중단시키고 호출자에게 그대로 전달됩니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 문서나 세션 같은 일반 리소스를 찾을 수 없음 (HTTP 404)
    #[error("Resource not found")]
    NotFound,

    /// 버전 ID가 저장소에서 조회되지 않음 (HTTP 404)
    #[error("Version not found: {0}")]
    VersionNotFound(String),

    /// 잘못된 호출자 입력 (HTTP 400)
    /// 예: 빈 커밋 메시지, 빈 문서 이름, 디코딩할 수 없는 바이너리
    #[error("Validation error: {0}")]
    Validation(String),

    /// 같은 버전끼리 비교하려 함 (HTTP 400)
    #[error("Cannot compare version {0} with itself")]
    IdenticalVersions(String),

    /// 버전 번호 불변식 위반 (HTTP 409)
    /// 새 버전 번호는 반드시 기존 최댓값 + 1 이어야 합니다.
    #[error("Version sequence violated: expected {expected}, got {actual}")]
    Sequence { expected: i64, actual: i64 },

    /// 렌더러에서 내보내기(export)가 실패함 (HTTP 502)
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// 렌더러나 diff 계산이 제한 시간 안에 끝나지 않음 (HTTP 504)
    #[error("Timed out: {0}")]
    Timeout(String),

    /// 현재 세션 상태에서 허용되지 않는 작업 (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// 데이터베이스 오류 (HTTP 500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 스냅샷 JSON 직렬화/역직렬화 오류 (HTTP 500)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 내부 에러(Database, Serialization, Internal)는 실제 내용을 로그에만 기록하고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::VersionNotFound(_) => {
                (StatusCode::NOT_FOUND, "version_not_found", self.to_string())
            }
            AppError::Validation(ref msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            AppError::IdenticalVersions(_) => {
                (StatusCode::BAD_REQUEST, "identical_versions", self.to_string())
            }
            AppError::Sequence { .. } => {
                (StatusCode::CONFLICT, "sequence_error", self.to_string())
            }
            AppError::Extraction(ref msg) => {
                tracing::warn!("Renderer extraction failed: {}", msg);
                (StatusCode::BAD_GATEWAY, "extraction_error", self.to_string())
            }
            AppError::Timeout(ref what) => {
                tracing::warn!("Timed out: {}", what);
                (StatusCode::GATEWAY_TIMEOUT, "timeout", self.to_string())
            }
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Serialization(ref e) => {
                tracing::error!("Serialization error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "serialization_error",
                    "A serialization error occurred".to_string(),
                )
            }
        };

        // 결과: { "error": { "code": "version_not_found", "message": "..." } }
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
