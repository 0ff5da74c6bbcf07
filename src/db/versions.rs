use crate::db::{contents, documents};
use crate::error::AppError;
use crate::models::{NewVersion, Version, VersionSummary};
use sqlx::{SqliteConnection, SqlitePool};

/// 문서 버전 저장소.
///
/// 문서 세션마다 명시적으로 만들어 주입합니다. `SqlitePool`은 내부적으로 Arc라 clone이 싸고,
/// 여러 저장소 인스턴스가 같은 풀을 공유해도 됩니다.
/// 수정/삭제 연산은 일부러 제공하지 않습니다 (스키마의 트리거도 UPDATE를 막습니다).
#[derive(Debug, Clone)]
pub struct VersionStore {
    pool: SqlitePool,
}

impl VersionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// 새 버전과 그 바이너리 내용을 한 트랜잭션으로 저장합니다.
    ///
    /// 버전 번호가 기존 최댓값 + 1(없으면 1)이 아니면 `AppError::Sequence`.
    pub async fn create(&self, new: &NewVersion) -> Result<Version, AppError> {
        let mut tx = self.pool.begin().await?;
        let id = insert_version(&mut tx, new).await?;
        tx.commit().await?;

        self.get_by_id(&id).await
    }

    /// `create`와 같지만, 같은 트랜잭션 안에서 문서의 현재 버전 포인터도 새 버전으로 옮깁니다.
    /// 저장이 실패하면 버전도 포인터도 바뀌지 않습니다.
    pub async fn create_and_checkout(&self, new: &NewVersion) -> Result<Version, AppError> {
        let mut tx = self.pool.begin().await?;
        let id = insert_version(&mut tx, new).await?;
        if !documents::set_current_version(&mut *tx, &new.document_id, &id).await? {
            return Err(AppError::NotFound);
        }
        tx.commit().await?;

        tracing::debug!(
            "Checked out version {} (#{}) for document {}",
            id,
            new.version_number,
            new.document_id
        );
        self.get_by_id(&id).await
    }

    /// 문서의 버전 목록 (버전 번호 오름차순). 화면용 역순 정렬은 호출자가 합니다.
    pub async fn list_by_document(&self, document_id: &str) -> Result<Vec<VersionSummary>, AppError> {
        let versions = sqlx::query_as::<_, VersionSummary>(
            r#"
            SELECT id, document_id, version_number, message, content_size, created_at
            FROM document_versions
            WHERE document_id = ?
            ORDER BY version_number ASC
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(versions)
    }

    pub async fn get_by_id(&self, version_id: &str) -> Result<Version, AppError> {
        sqlx::query_as::<_, Version>(
            r#"
            SELECT id, document_id, version_number, message, annotation_snapshot,
                   page_text_snapshot, content_size, created_at
            FROM document_versions
            WHERE id = ?
            "#,
        )
        .bind(version_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::VersionNotFound(version_id.to_string()))
    }

    pub async fn get_summary(&self, version_id: &str) -> Result<VersionSummary, AppError> {
        sqlx::query_as::<_, VersionSummary>(
            r#"
            SELECT id, document_id, version_number, message, content_size, created_at
            FROM document_versions
            WHERE id = ?
            "#,
        )
        .bind(version_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::VersionNotFound(version_id.to_string()))
    }

    /// 문서의 가장 큰 버전 번호. 버전이 없으면 0.
    pub async fn max_version_number(&self, document_id: &str) -> Result<i64, AppError> {
        let max: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(version_number), 0) FROM document_versions WHERE document_id = ?",
        )
        .bind(document_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(max)
    }

    /// 버전의 바이너리 내용. 렌더러가 버전을 다시 불러올 때 사용합니다.
    pub async fn content(&self, version_id: &str) -> Result<Vec<u8>, AppError> {
        contents::get_content(&self.pool, version_id)
            .await?
            .ok_or_else(|| AppError::VersionNotFound(version_id.to_string()))
    }
}

/// 순번 검사 후 버전 행과 내용을 삽입하고 새 버전 ID를 반환합니다.
///
/// 호출자의 트랜잭션 안에서 실행됩니다. 에러가 나면 호출자가 커밋하지 않으므로 롤백됩니다.
pub(crate) async fn insert_version(
    conn: &mut SqliteConnection,
    new: &NewVersion,
) -> Result<String, AppError> {
    let max: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(version_number), 0) FROM document_versions WHERE document_id = ?",
    )
    .bind(&new.document_id)
    .fetch_one(&mut *conn)
    .await?;

    if new.version_number != max + 1 {
        return Err(AppError::Sequence {
            expected: max + 1,
            actual: new.version_number,
        });
    }

    let id = uuid::Uuid::now_v7().to_string();
    let annotation_snapshot = serde_json::to_string(&new.annotation_snapshot)?;
    let page_text_snapshot = serde_json::to_string(&new.page_text_snapshot)?;

    sqlx::query(
        r#"
        INSERT INTO document_versions
            (id, document_id, version_number, message, annotation_snapshot, page_text_snapshot, content_size)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&new.document_id)
    .bind(new.version_number)
    .bind(&new.message)
    .bind(&annotation_snapshot)
    .bind(&page_text_snapshot)
    .bind(new.binary_content.len() as i64)
    .execute(&mut *conn)
    .await?;

    contents::put_content(&mut *conn, &id, &new.binary_content).await?;

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnnotationEntry, PageText};
    use crate::test_support::{memory_pool, new_version, seed_document};

    #[tokio::test]
    async fn first_version_must_be_number_one() {
        let pool = memory_pool().await;
        let store = VersionStore::new(pool.clone());
        documents::create_document(&pool, "doc-1", "Contract", "contract")
            .await
            .unwrap();

        let err = store.create(&new_version("doc-1", 2, "skip ahead")).await.unwrap_err();
        assert!(matches!(err, AppError::Sequence { expected: 1, actual: 2 }));

        let v1 = store.create(&new_version("doc-1", 1, "Initial upload")).await.unwrap();
        assert_eq!(v1.version_number, 1);
    }

    #[tokio::test]
    async fn rejects_gaps_and_duplicates() {
        let (store, doc, _v1) = seed_document().await;

        let dup = store.create(&new_version(&doc.id, 1, "again")).await.unwrap_err();
        assert!(matches!(dup, AppError::Sequence { expected: 2, actual: 1 }));

        let gap = store.create(&new_version(&doc.id, 3, "gap")).await.unwrap_err();
        assert!(matches!(gap, AppError::Sequence { expected: 2, actual: 3 }));

        // 실패한 시도는 아무것도 남기지 않습니다.
        assert_eq!(store.max_version_number(&doc.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn lists_versions_in_ascending_order() {
        let (store, doc, _v1) = seed_document().await;
        store.create(&new_version(&doc.id, 2, "second")).await.unwrap();
        store.create(&new_version(&doc.id, 3, "third")).await.unwrap();

        let numbers: Vec<i64> = store
            .list_by_document(&doc.id)
            .await
            .unwrap()
            .iter()
            .map(|v| v.version_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn unknown_version_is_not_found() {
        let (store, _doc, _v1) = seed_document().await;
        let err = store.get_by_id("missing").await.unwrap_err();
        assert!(matches!(err, AppError::VersionNotFound(id) if id == "missing"));
        assert!(matches!(store.content("missing").await, Err(AppError::VersionNotFound(_))));
    }

    #[tokio::test]
    async fn stores_snapshots_and_content() {
        let (store, doc, _v1) = seed_document().await;
        let mut new = new_version(&doc.id, 2, "with data");
        new.binary_content = vec![1, 2, 3, 4];
        new.annotation_snapshot = vec![AnnotationEntry {
            id: "a1".to_string(),
            kind: "highlight".to_string(),
            page_index: 0,
            contents: None,
            color: Some("#ff0".to_string()),
        }];
        new.page_text_snapshot = vec![PageText {
            page_index: 0,
            text: "Hello".to_string(),
        }];

        let version = store.create(&new).await.unwrap();

        assert_eq!(version.content_size, 4);
        assert_eq!(version.annotations().unwrap(), new.annotation_snapshot);
        assert_eq!(version.pages().unwrap(), new.page_text_snapshot);
        assert_eq!(store.content(&version.id).await.unwrap(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn create_and_checkout_moves_document_pointer() {
        let (store, doc, v1) = seed_document().await;
        assert_eq!(doc.current_version_id.as_deref(), Some(v1.id.as_str()));

        let v2 = store.create_and_checkout(&new_version(&doc.id, 2, "next")).await.unwrap();
        let reloaded = documents::get_document(store.pool(), &doc.id).await.unwrap().unwrap();
        assert_eq!(reloaded.current_version_id, Some(v2.id));
    }

    #[tokio::test]
    async fn failed_checkout_leaves_pointer_alone() {
        let (store, doc, v1) = seed_document().await;

        let err = store
            .create_and_checkout(&new_version(&doc.id, 5, "bad number"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Sequence { .. }));

        let reloaded = documents::get_document(store.pool(), &doc.id).await.unwrap().unwrap();
        assert_eq!(reloaded.current_version_id, Some(v1.id));
    }

    #[tokio::test]
    async fn persisted_versions_cannot_be_updated() {
        let (store, _doc, v1) = seed_document().await;

        let result = sqlx::query("UPDATE document_versions SET message = 'rewritten' WHERE id = ?")
            .bind(&v1.id)
            .execute(store.pool())
            .await;
        assert!(result.is_err());

        assert_eq!(store.get_by_id(&v1.id).await.unwrap(), v1);
    }
}
