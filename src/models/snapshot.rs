use serde::{Deserialize, Serialize};

use super::{AnnotationSnapshot, PageText};

/// 클라이언트 렌더러가 내보낸 현재 상태.
///
/// 뷰어는 브라우저에서 돌기 때문에 업로드와 커밋 요청은 이 묶음을 본문으로 보냅니다.
/// 서버는 이것을 [`crate::services::renderer::Renderer`]로 감싸서 커밋 프로토콜에 넘깁니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RendererSnapshot {
    /// 렌더링된 문서 바이트 (base64)
    pub binary_content: String,
    /// 렌더러가 내보낸 주석 스냅샷 (맨 배열 또는 `{ annotations }`)
    #[serde(default)]
    pub annotations: AnnotationSnapshot,
    pub total_page_count: usize,
    /// 페이지별 텍스트. 빠진 페이지는 그 페이지의 추출 실패로 취급합니다.
    #[serde(default)]
    pub pages: Vec<PageText>,
}
