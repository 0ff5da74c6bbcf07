//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//!
//! 각 하위 모듈:
//! - `contents`: 버전별 바이너리 내용 put/get
//! - `documents`: 문서 조회/생성과 현재 버전 포인터 갱신
//! - `versions`: 불변 버전 저장소 (`VersionStore`)

pub mod contents;
pub mod documents;
pub mod versions;

// `crate::db::get_document`, `crate::db::VersionStore`처럼 바로 접근할 수 있게 재공개합니다.
pub use documents::*;
pub use versions::VersionStore;
