use serde::{Deserialize, Serialize};

use super::{AnnotationEntry, AnnotationSnapshot};

/// 커밋 시점의 문서 상태. 한 번 저장되면 어떤 필드도 바뀌지 않습니다.
///
/// 스냅샷은 JSON 문자열 그대로 보관하고, 읽을 때 [`Version::annotations`] /
/// [`Version::pages`]로 파싱합니다. 바이너리 내용은 `version_contents` 테이블에 따로 있습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Version {
    pub id: String,
    pub document_id: String,
    pub version_number: i64,
    pub message: String,
    pub annotation_snapshot: String,
    pub page_text_snapshot: String,
    pub content_size: i64,
    pub created_at: String,
}

impl Version {
    pub fn annotations(&self) -> Result<Vec<AnnotationEntry>, serde_json::Error> {
        AnnotationSnapshot::parse(&self.annotation_snapshot)
    }

    pub fn pages(&self) -> Result<Vec<PageText>, serde_json::Error> {
        serde_json::from_str(&self.page_text_snapshot)
    }

    pub fn summary(&self) -> VersionSummary {
        VersionSummary {
            id: self.id.clone(),
            document_id: self.document_id.clone(),
            version_number: self.version_number,
            message: self.message.clone(),
            content_size: self.content_size,
            created_at: self.created_at.clone(),
        }
    }

    /// API 응답용으로 스냅샷을 파싱한 형태
    pub fn detail(&self) -> Result<VersionDetail, serde_json::Error> {
        Ok(VersionDetail {
            id: self.id.clone(),
            document_id: self.document_id.clone(),
            version_number: self.version_number,
            message: self.message.clone(),
            annotations: self.annotations()?,
            pages: self.pages()?,
            content_size: self.content_size,
            created_at: self.created_at.clone(),
        })
    }
}

/// 목록 조회용. 스냅샷을 뺀 버전 메타데이터입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VersionSummary {
    pub id: String,
    pub document_id: String,
    pub version_number: i64,
    pub message: String,
    pub content_size: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionDetail {
    pub id: String,
    pub document_id: String,
    pub version_number: i64,
    pub message: String,
    pub annotations: Vec<AnnotationEntry>,
    pub pages: Vec<PageText>,
    pub content_size: i64,
    pub created_at: String,
}

/// 페이지 하나의 정규화된 텍스트 `{ pageIndex, text }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageText {
    pub page_index: usize,
    pub text: String,
}

/// 저장소에 넘기는 새 버전. ID와 생성 시각은 저장소가 채웁니다.
#[derive(Debug, Clone)]
pub struct NewVersion {
    pub document_id: String,
    pub version_number: i64,
    pub message: String,
    pub binary_content: Vec<u8>,
    pub annotation_snapshot: Vec<AnnotationEntry>,
    pub page_text_snapshot: Vec<PageText>,
}
