//! # 문서 데이터베이스 쿼리 모듈
//!
//! `documents` 테이블에 대한 쿼리 함수들이 정의되어 있습니다.
//! 문서 삭제는 이 서비스의 범위 밖이라 제공하지 않습니다.
//!
//! 트랜잭션 안에서도 쓰이는 함수(`create_document`, `set_current_version`)는
//! `SqlitePool` 대신 제네릭 `Executor`를 받습니다.
//! `&SqlitePool`과 `&mut SqliteConnection`(트랜잭션) 모두 Executor를 구현합니다.

use crate::error::AppError;
use crate::models::*;
use sqlx::{Executor, Sqlite, SqlitePool};

/// 모든 문서를 조회합니다 (최근 업로드 순).
pub async fn list_documents(pool: &SqlitePool) -> Result<Vec<Document>, AppError> {
    let docs = sqlx::query_as::<_, Document>(
        r#"
        SELECT id, name, slug, current_version_id, created_at
        FROM documents
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(docs)
}

/// ID로 단일 문서를 조회합니다.
///
/// # 반환값
/// - `Ok(Some(Document))`: 문서를 찾은 경우
/// - `Ok(None)`: 해당 ID의 문서가 없는 경우
pub async fn get_document(pool: &SqlitePool, id: &str) -> Result<Option<Document>, AppError> {
    let doc = sqlx::query_as::<_, Document>(
        r#"
        SELECT id, name, slug, current_version_id, created_at
        FROM documents
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(doc)
}

/// 새 문서 행을 삽입합니다. 현재 버전 포인터는 비어 있는 상태로 시작합니다.
///
/// 최초 버전과 같은 트랜잭션에서 호출되어야 포인터가 비어 있는 문서가 밖에 보이지 않습니다.
pub async fn create_document<'e, E>(
    executor: E,
    id: &str,
    name: &str,
    slug: &str,
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT INTO documents (id, name, slug) VALUES (?, ?, ?)")
        .bind(id)
        .bind(name)
        .bind(slug)
        .execute(executor)
        .await?;

    Ok(())
}

/// 문서의 현재 버전 포인터를 옮깁니다.
///
/// # 반환값
/// - `Ok(true)`: 갱신됨
/// - `Ok(false)`: 해당 ID의 문서가 없음
pub async fn set_current_version<'e, E>(
    executor: E,
    document_id: &str,
    version_id: &str,
) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE documents SET current_version_id = ? WHERE id = ?")
        .bind(version_id)
        .bind(document_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}
