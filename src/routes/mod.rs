//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들을 모아둔 모듈입니다.
//! Axum에서 핸들러는 HTTP 요청을 받아 응답을 반환하는 async 함수입니다.
//!
//! 각 하위 모듈:
//! - `documents`: 문서 업로드/조회 핸들러와 공유 상태(`AppState`)
//! - `health`: 서버 상태 확인 (헬스체크)
//! - `sessions`: 문서 세션 (주석 이벤트, 커밋, 버전 전환)
//! - `versions`: 버전 목록/상세/내용과 버전 비교

pub mod documents;
pub mod health;
pub mod sessions;
pub mod versions;

// 각 모듈의 핸들러 함수들을 재공개하여
// main.rs에서 `routes::list_documents`처럼 바로 접근 가능하게 합니다.
pub use documents::*;
pub use health::*;
pub use sessions::*;
pub use versions::*;
