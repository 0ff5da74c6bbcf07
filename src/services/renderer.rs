//! 렌더러 포트
//!
//! 문서 렌더러는 이 서비스 밖(브라우저의 뷰어)에서 돕니다. 커밋 프로토콜은
//! [`Renderer`] 트레이트를 통해서만 렌더러의 현재 상태를 읽습니다.
//! HTTP 요청 본문으로 받은 [`RendererSnapshot`]이 기본 구현입니다.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::AppError;
use crate::models::{AnnotationEntry, PageText, RendererSnapshot};

#[async_trait]
pub trait Renderer: Send + Sync {
    fn total_page_count(&self) -> usize;

    /// 주석이 반영된 문서 바이트
    async fn export_binary_content(&self) -> Result<Vec<u8>, AppError>;

    async fn export_annotation_snapshot(&self) -> Result<Vec<AnnotationEntry>, AppError>;

    /// 페이지 하나의 텍스트. 실패는 그 페이지에만 영향을 줍니다.
    async fn export_page_text(&self, page_index: usize) -> Result<String, AppError>;
}

/// 렌더러 상태를 읽을 때의 한도
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureLimits {
    /// 렌더러 호출 하나당 제한 시간
    pub per_call: Duration,
    /// 렌더러가 알려줄 수 있는 최대 페이지 수
    pub max_pages: usize,
}

/// 커밋에 필요한 렌더러 상태 전체
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedState {
    pub binary_content: Vec<u8>,
    pub annotations: Vec<AnnotationEntry>,
    pub pages: Vec<PageText>,
}

/// 렌더러에서 바이너리, 주석 스냅샷, 모든 페이지 텍스트를 차례로 읽습니다.
///
/// 페이지 수가 `max_pages`를 넘으면 아무것도 읽기 전에 거절합니다.
/// 렌더러 호출마다 `per_call` 제한이 걸립니다. 바이너리나 주석을 못 읽으면 전체가 실패하고,
/// 페이지 텍스트를 못 읽으면 경고를 남기고 그 페이지를 빈 문자열로 채웁니다.
pub async fn capture(renderer: &dyn Renderer, limits: CaptureLimits) -> Result<CapturedState, AppError> {
    let page_count = renderer.total_page_count();
    if page_count > limits.max_pages {
        return Err(AppError::Validation(format!(
            "document reports {page_count} pages; at most {} are supported",
            limits.max_pages
        )));
    }

    let limit = limits.per_call;
    let binary_content = bounded(limit, "binary export", renderer.export_binary_content()).await?;
    let annotations = bounded(
        limit,
        "annotation export",
        renderer.export_annotation_snapshot(),
    )
    .await?;

    let mut pages = Vec::new();
    for page_index in 0..page_count {
        let text = match bounded(limit, "page text export", renderer.export_page_text(page_index)).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Text extraction failed for page {}: {}", page_index, e);
                String::new()
            }
        };
        pages.push(PageText { page_index, text });
    }

    Ok(CapturedState {
        binary_content,
        annotations,
        pages,
    })
}

async fn bounded<T>(
    limit: Duration,
    what: &str,
    call: impl std::future::Future<Output = Result<T, AppError>>,
) -> Result<T, AppError> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| AppError::Timeout(format!("renderer {what} exceeded {limit:?}")))?
}

#[async_trait]
impl Renderer for RendererSnapshot {
    fn total_page_count(&self) -> usize {
        self.total_page_count
    }

    async fn export_binary_content(&self) -> Result<Vec<u8>, AppError> {
        STANDARD
            .decode(&self.binary_content)
            .map_err(|e| AppError::Extraction(format!("binary content is not valid base64: {e}")))
    }

    async fn export_annotation_snapshot(&self) -> Result<Vec<AnnotationEntry>, AppError> {
        Ok(self.annotations.clone().into_entries())
    }

    async fn export_page_text(&self, page_index: usize) -> Result<String, AppError> {
        self.pages
            .iter()
            .find(|p| p.page_index == page_index)
            .map(|p| p.text.clone())
            .ok_or_else(|| AppError::Extraction(format!("page {page_index} has no text")))
    }
}
