//! 버전별 바이너리 내용 저장소 (`version_contents`)
//!
//! version_id로 키잉되는 단순 put/get입니다. 한 버전의 내용은 한 번만 쓰입니다.

use crate::error::AppError;
use sqlx::{Executor, Sqlite, SqlitePool};

pub async fn put_content<'e, E>(executor: E, version_id: &str, content: &[u8]) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT INTO version_contents (version_id, content) VALUES (?, ?)")
        .bind(version_id)
        .bind(content)
        .execute(executor)
        .await?;

    Ok(())
}

pub async fn get_content(pool: &SqlitePool, version_id: &str) -> Result<Option<Vec<u8>>, AppError> {
    let content: Option<Vec<u8>> =
        sqlx::query_scalar("SELECT content FROM version_contents WHERE version_id = ?")
            .bind(version_id)
            .fetch_optional(pool)
            .await?;

    Ok(content)
}
