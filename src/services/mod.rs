//! # 서비스 모듈
//!
//! HTTP와 무관한 핵심 로직입니다:
//! - `tracker`: 렌더러 이벤트로 주석 사본과 변경 로그를 유지
//! - `renderer`: 렌더러 포트와 커밋용 상태 수집
//! - `diff`: 버전 비교 엔진
//! - `session`: 커밋/전환 상태 기계
//! - `registry`: 문서별 세션 작업과 명령 큐
//! - `upload`: 새 문서와 최초 버전 생성

pub mod diff;
pub mod registry;
pub mod renderer;
pub mod session;
pub mod tracker;
pub mod upload;

pub use registry::SessionRegistry;
pub use upload::upload_document;
