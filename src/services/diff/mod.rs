//! 버전 비교 엔진
//!
//! - `text`: 페이지별 문자 단위 diff와 시맨틱 정리
//! - `annotations`: ID 기준 주석 스냅샷 diff
//! - `report`: 둘을 동시에 계산해 하나의 리포트로 합침

pub mod annotations;
pub mod report;
pub mod text;

pub use annotations::compute_annotation_diff;
pub use report::{annotation_changes, build_report, compute_full_diff};
pub use text::{compute_text_diff, diff_page, diff_text};
