//! 문서 업로드: 문서 행, 최초 버전("Initial upload"), 현재 버전 포인터를 한 트랜잭션으로 만듭니다.

use crate::db::{self, versions, VersionStore};
use crate::error::AppError;
use crate::models::*;

use super::renderer::{capture, CaptureLimits, Renderer};

pub const INITIAL_VERSION_MESSAGE: &str = "Initial upload";

pub async fn upload_document(
    store: &VersionStore,
    name: &str,
    renderer: &dyn Renderer,
    capture_limits: CaptureLimits,
) -> Result<(Document, Version), AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("document name must not be empty".to_string()));
    }

    let captured = capture(renderer, capture_limits).await?;

    let document_id = uuid::Uuid::now_v7().to_string();
    // "Q3 Contract (final)" → "q3-contract-final"
    let slug = slug::slugify(name);

    let mut tx = store.pool().begin().await?;
    db::create_document(&mut *tx, &document_id, name, &slug).await?;
    let new = NewVersion {
        document_id: document_id.clone(),
        version_number: 1,
        message: INITIAL_VERSION_MESSAGE.to_string(),
        binary_content: captured.binary_content,
        annotation_snapshot: captured.annotations,
        page_text_snapshot: captured.pages,
    };
    let version_id = versions::insert_version(&mut tx, &new).await?;
    db::set_current_version(&mut *tx, &document_id, &version_id).await?;
    tx.commit().await?;

    let document = db::get_document(store.pool(), &document_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let version = store.get_by_id(&version_id).await?;

    tracing::info!("Uploaded document {} ({}) with {} page(s)", document.name, document.id, renderer.total_page_count());
    Ok((document, version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{entry, memory_pool, FakeRenderer, CAPTURE_LIMITS};

    #[tokio::test]
    async fn upload_creates_document_with_initial_version() {
        let store = VersionStore::new(memory_pool().await);
        let renderer = FakeRenderer::with_pages(&["Page one", "Page two"])
            .with_annotations(vec![entry("a1", "note", 1, Some("review"))]);

        let (document, version) = upload_document(&store, " Q3 Contract (final) ", &renderer, CAPTURE_LIMITS)
            .await
            .unwrap();

        assert_eq!(document.name, "Q3 Contract (final)");
        assert_eq!(document.slug, "q3-contract-final");
        assert_eq!(document.current_version_id.as_deref(), Some(version.id.as_str()));
        assert_eq!(version.version_number, 1);
        assert_eq!(version.message, INITIAL_VERSION_MESSAGE);
        assert_eq!(version.pages().unwrap().len(), 2);
        assert_eq!(version.annotations().unwrap().len(), 1);
        assert_eq!(store.content(&version.id).await.unwrap(), renderer.binary);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let store = VersionStore::new(memory_pool().await);
        let err = upload_document(&store, "  ", &FakeRenderer::with_pages(&[]), CAPTURE_LIMITS)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(db::list_documents(store.pool()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_capture_leaves_nothing_behind() {
        let store = VersionStore::new(memory_pool().await);
        let renderer = FakeRenderer::with_pages(&["x"]).failing_binary();

        assert!(upload_document(&store, "Broken", &renderer, CAPTURE_LIMITS).await.is_err());
        assert!(db::list_documents(store.pool()).await.unwrap().is_empty());
    }
}
