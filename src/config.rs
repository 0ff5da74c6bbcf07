//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: SQLite 데이터베이스 경로 (버전 저장소)
//! - `HOST`: 서버 바인딩 주소
//! - `PORT`: 서버 포트 번호
//! - `RENDERER_TIMEOUT_MS`: 렌더러 내보내기 호출 하나당 제한 시간
//! - `DIFF_TIMEOUT_MS`: 버전 비교 한 번의 제한 시간
//! - `MAX_PAGE_COUNT`: 업로드/커밋 한 번에 받을 수 있는 최대 페이지 수

use std::env;
use std::time::Duration;

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후,
/// 애플리케이션 전체에서 공유됩니다.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 데이터베이스 파일 경로 (예: "sqlite:data/docrev.db")
    pub database_url: String,
    /// 서버가 바인딩할 호스트 주소 (기본값: "0.0.0.0")
    pub host: String,
    /// 서버 포트 번호 (기본값: 3000)
    pub port: u16,
    /// 렌더러 호출(바이너리/주석/페이지 텍스트 내보내기) 하나당 제한 시간
    /// 멈춘 렌더러가 커밋을 무한정 붙잡지 못하게 합니다.
    pub renderer_timeout: Duration,
    /// diff 계산 전체의 제한 시간
    pub diff_timeout: Duration,
    /// 렌더러 스냅샷이 알려줄 수 있는 최대 페이지 수 (기본값: 5000)
    pub max_page_count: usize,
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// # 에러
    /// `DATABASE_URL`은 필수이며, 없으면 에러가 발생합니다.
    /// 나머지 설정은 기본값이 있어 환경변수가 없어도 동작합니다.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?, // 필수: 없으면 에러
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            renderer_timeout: millis_from_env("RENDERER_TIMEOUT_MS", 10_000),
            diff_timeout: millis_from_env("DIFF_TIMEOUT_MS", 15_000),
            max_page_count: env::var("MAX_PAGE_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5_000),
        })
    }
}

/// 밀리초 단위 환경변수를 읽습니다. 없거나 숫자가 아니면 기본값을 씁니다.
fn millis_from_env(key: &str, default_ms: u64) -> Duration {
    let ms = env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_fall_back_to_default_when_missing_or_invalid() {
        assert_eq!(
            millis_from_env("DOCREV_TEST_UNSET_TIMEOUT_MS", 250),
            Duration::from_millis(250)
        );

        env::set_var("DOCREV_TEST_BAD_TIMEOUT_MS", "soon");
        assert_eq!(
            millis_from_env("DOCREV_TEST_BAD_TIMEOUT_MS", 250),
            Duration::from_millis(250)
        );

        env::set_var("DOCREV_TEST_GOOD_TIMEOUT_MS", "1200");
        assert_eq!(
            millis_from_env("DOCREV_TEST_GOOD_TIMEOUT_MS", 250),
            Duration::from_millis(1200)
        );
    }
}
