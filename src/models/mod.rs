//! # 데이터 모델 모듈
//!
//! 애플리케이션에서 사용하는 데이터 구조체(struct)들을 정의합니다.
//! 각 하위 모듈은 특정 도메인의 데이터 타입을 담당합니다:
//! - `annotation`: 주석 스냅샷 항목, 렌더러 원본 주석, 추적 중인 주석과 변경 기록
//! - `diff`: 텍스트 diff, 주석 diff, 비교 리포트
//! - `document`: 문서(Document)와 업로드 요청
//! - `session`: 커밋/전환 세션의 상태와 요청/응답 타입
//! - `snapshot`: 클라이언트 렌더러가 내보낸 상태 (업로드/커밋 본문)
//! - `version`: 불변 버전(Version)과 페이지 텍스트 스냅샷
//!
//! `pub use X::*;`로 재공개하여 `crate::models::Version`처럼 짧게 쓸 수 있습니다.

pub mod annotation;
pub mod diff;
pub mod document;
pub mod session;
pub mod snapshot;
pub mod version;

pub use annotation::*;
pub use diff::*;
pub use document::*;
pub use session::*;
pub use snapshot::*;
pub use version::*;
