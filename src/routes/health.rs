//! # 헬스체크(Health Check) 핸들러
//!
//! 서버가 정상적으로 동작하는지 확인하는 엔드포인트입니다.
//!
//! ## 엔드포인트
//! - `GET /api/v1/health` → `{ "status": "ok" }`
//!
//! 버전 저장소(SQLite)에 질의가 되는지까지 확인합니다.
//! 저장소가 응답하지 않으면 500 `database_error`가 됩니다.

use axum::{extract::State, Json};
use serde_json::{json, Value}; // JSON 생성 유틸리티

use crate::error::AppError;

use super::documents::AppState;

/// `GET /health`: 서버와 저장소 상태를 확인합니다.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    sqlx::query("SELECT 1").execute(&state.pool).await?;

    Ok(Json(json!({
        "status": "ok"
    })))
}
