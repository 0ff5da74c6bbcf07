//! 테스트 공용 도우미: 인메모리 DB, 샘플 데이터, 스크립트로 동작하는 렌더러

use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::db::{self, VersionStore};
use crate::error::AppError;
use crate::models::*;
use crate::services::renderer::{CaptureLimits, Renderer};

pub const CAPTURE_LIMITS: CaptureLimits = CaptureLimits {
    per_call: Duration::from_secs(1),
    max_pages: 100,
};

/// 마이그레이션이 적용된 인메모리 SQLite.
/// `sqlite::memory:`는 연결마다 별도 DB라 연결을 하나로 제한합니다.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

pub fn new_version(document_id: &str, version_number: i64, message: &str) -> NewVersion {
    NewVersion {
        document_id: document_id.to_string(),
        version_number,
        message: message.to_string(),
        binary_content: Vec::new(),
        annotation_snapshot: Vec::new(),
        page_text_snapshot: Vec::new(),
    }
}

/// 버전 1이 현재 버전인 문서 하나
pub async fn seed_document() -> (VersionStore, Document, Version) {
    let pool = memory_pool().await;
    let store = VersionStore::new(pool.clone());

    db::create_document(&pool, "doc-1", "Contract", "contract").await.unwrap();
    let v1 = store
        .create_and_checkout(&new_version("doc-1", 1, "Initial upload"))
        .await
        .unwrap();
    let doc = db::get_document(&pool, "doc-1").await.unwrap().unwrap();

    (store, doc, v1)
}

pub fn page(page_index: usize, text: &str) -> PageText {
    PageText {
        page_index,
        text: text.to_string(),
    }
}

pub fn entry(id: &str, kind: &str, page_index: usize, contents: Option<&str>) -> AnnotationEntry {
    AnnotationEntry {
        id: id.to_string(),
        kind: kind.to_string(),
        page_index,
        contents: contents.map(str::to_string),
        color: None,
    }
}

pub fn raw_annotation(id: &str, subtype: &str, contents: Option<&str>) -> RawAnnotation {
    RawAnnotation {
        id: id.to_string(),
        subtype: subtype.to_string(),
        page_index: 0,
        contents: contents.map(str::to_string),
        color: None,
    }
}

/// 페이지 텍스트와 실패 지점을 미리 정해두는 렌더러
#[derive(Debug, Clone)]
pub struct FakeRenderer {
    pub binary: Vec<u8>,
    pub annotations: Vec<AnnotationEntry>,
    pub pages: Vec<String>,
    pub failing_pages: Vec<usize>,
    pub fail_binary: bool,
    pub stall: Option<Duration>,
}

impl FakeRenderer {
    pub fn with_pages(pages: &[&str]) -> Self {
        Self {
            binary: b"%PDF-1.7 fake".to_vec(),
            annotations: Vec::new(),
            pages: pages.iter().map(|p| p.to_string()).collect(),
            failing_pages: Vec::new(),
            fail_binary: false,
            stall: None,
        }
    }

    pub fn with_annotations(mut self, annotations: Vec<AnnotationEntry>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn failing_page(mut self, page_index: usize) -> Self {
        self.failing_pages.push(page_index);
        self
    }

    pub fn failing_binary(mut self) -> Self {
        self.fail_binary = true;
        self
    }

    /// 바이너리 내보내기가 이 시간만큼 걸립니다.
    pub fn stalling(mut self, delay: Duration) -> Self {
        self.stall = Some(delay);
        self
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    fn total_page_count(&self) -> usize {
        self.pages.len()
    }

    async fn export_binary_content(&self) -> Result<Vec<u8>, AppError> {
        if let Some(delay) = self.stall {
            tokio::time::sleep(delay).await;
        }
        if self.fail_binary {
            return Err(AppError::Extraction("renderer crashed".to_string()));
        }
        Ok(self.binary.clone())
    }

    async fn export_annotation_snapshot(&self) -> Result<Vec<AnnotationEntry>, AppError> {
        Ok(self.annotations.clone())
    }

    async fn export_page_text(&self, page_index: usize) -> Result<String, AppError> {
        if self.failing_pages.contains(&page_index) {
            return Err(AppError::Extraction(format!("page {page_index} unreadable")));
        }
        self.pages
            .get(page_index)
            .cloned()
            .ok_or_else(|| AppError::Extraction(format!("no page {page_index}")))
    }
}
