use serde::{Deserialize, Serialize};

use super::RendererSnapshot;

/// 업로드된 문서. 여러 버전을 소유하며 `current_version_id`는 현재 표시 중인 버전입니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// 업로드 트랜잭션이 끝나기 전까지만 None
    pub current_version_id: Option<String>,
    pub created_at: String,
}

/// `POST /documents` 본문. 문서 이름과 렌더러가 내보낸 최초 상태를 함께 받습니다.
#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub name: String,
    pub snapshot: RendererSnapshot,
}
