//! # 버전(Version) 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET /api/v1/documents/{id}/versions`               → 버전 목록 (최신순)
//! - `GET /api/v1/versions/{id}`                         → 버전 상세 (스냅샷 포함)
//! - `GET /api/v1/versions/{id}/content`                 → 렌더러가 다시 불러올 바이너리
//! - `GET /api/v1/versions/{base}/compare/{compare}`     → 두 버전 비교 리포트
//!
//! 버전은 불변이라 수정/삭제 엔드포인트가 없습니다.

use crate::{
    db,
    error::AppError,
    models::*,
    services::diff,
};
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use super::documents::AppState;

pub async fn list_document_versions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    db::get_document(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    // 저장소는 오름차순으로 돌려주고, 화면에는 최신 버전이 먼저 나옵니다.
    let mut versions = state.store.list_by_document(&id).await?;
    versions.reverse();
    Ok(Json(json!({ "versions": versions })))
}

pub async fn get_version(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VersionDetail>, AppError> {
    let version = state.store.get_by_id(&id).await?;
    Ok(Json(version.detail()?))
}

/// 바이너리 내용은 이 서비스에게 불투명하므로 `application/octet-stream`으로 내려보냅니다.
/// 파일 이름은 `{문서 slug}-v{버전 번호}`입니다.
pub async fn get_version_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let version = state.store.get_summary(&id).await?;
    let document = db::get_document(&state.pool, &version.document_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let content = state.store.content(&id).await?;

    let disposition = format!(
        "attachment; filename=\"{}-v{}\"",
        document.slug, version.version_number
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    ))
}

pub async fn compare_versions(
    State(state): State<AppState>,
    Path((base, compare)): Path<(String, String)>,
) -> Result<Json<DiffReport>, AppError> {
    let report = diff::compute_full_diff(&state.store, &base, &compare, state.diff_timeout).await?;
    Ok(Json(report))
}
