//! # docrev 웹 서버 진입점
//!
//! 이 파일은 문서 버전 관리 서비스의 **시작점(entry point)**입니다.
//! Rust 프로그램은 항상 `main()` 함수에서 실행이 시작됩니다.
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. SQLite 데이터베이스 연결 풀 생성
//! 4. 데이터베이스 마이그레이션 실행
//! 5. 버전 저장소와 세션 레지스트리 생성
//! 6. API 라우터 설정
//! 7. HTTP 서버 시작

// ── 모듈 선언 ──
// `mod` 키워드는 다른 파일을 모듈로 가져옵니다.
// 예: `mod config;`는 같은 디렉토리의 `config.rs` 또는 `config/mod.rs`를 가져옵니다.
// Rust에서는 파일 시스템 구조가 곧 모듈 구조입니다.
mod config;
mod db;
mod error;
mod models;
mod routes;
mod services;

// 테스트 빌드에서만 포함되는 공용 도우미 (인메모리 DB, 가짜 렌더러)
#[cfg(test)]
mod test_support;

// ── 외부 크레이트 및 모듈에서 필요한 항목 가져오기 ──
use anyhow::Result; // anyhow::Result: 어떤 에러 타입이든 담을 수 있는 범용 Result 타입
use axum::{
    // Axum: Rust의 비동기 웹 프레임워크
    routing::{get, post, put}, // HTTP 메서드별 라우팅 함수들
    Router,                    // 라우터: URL 경로와 핸들러를 연결하는 구조체
};
use config::Config; // 우리가 만든 설정 모듈
use db::VersionStore;
use routes::{documents::AppState, *}; // `*`는 모듈의 모든 공개 항목을 가져옴 (glob import)
use services::{renderer::CaptureLimits, SessionRegistry};
use sqlx::sqlite::SqlitePoolOptions; // SQLite 연결 풀 설정 옵션
use tower_http::{
    // tower-http: HTTP 미들웨어 모음 크레이트
    cors::{Any, CorsLayer}, // CORS(Cross-Origin Resource Sharing) 설정
    trace::TraceLayer,      // HTTP 요청/응답 로깅 미들웨어
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt}; // 로깅 초기화 유틸리티

// #[tokio::main]: 비동기 런타임을 시작하는 **어트리뷰트 매크로**
// 이 매크로가 내부적으로 tokio 런타임을 생성하고 main을 그 안에서 실행합니다.
// 세션 작업(문서마다 하나)과 diff 계산용 블로킹 스레드도 이 런타임 위에서 돕니다.
#[tokio::main]
async fn main() -> Result<()> {
    // ── 1단계: 환경변수 로딩 ──
    // .env 파일에서 환경변수를 읽어옵니다. (예: DATABASE_URL, RENDERER_TIMEOUT_MS 등)
    // .ok()는 Result를 Option으로 변환하여, .env 파일이 없어도 에러 없이 넘어갑니다.
    dotenvy::dotenv().ok();

    // ── 2단계: 로깅(tracing) 초기화 ──
    // registry(): 로그 수집기를 만들고
    // .with(): 필터와 포맷터를 레이어처럼 쌓아올립니다
    tracing_subscriber::registry()
        .with(
            // EnvFilter: RUST_LOG 환경변수로 로그 레벨을 제어합니다.
            // 환경변수가 없으면 기본값으로 docrev, tower_http, axum 모듈을 debug 레벨로 설정
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docrev=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer()) // 로그를 터미널에 출력하는 포맷터 레이어
        .init(); // 전역 로거로 등록

    // ── 3단계: 설정 로딩 ──
    // `?` 연산자: Result가 Err이면 즉시 함수에서 반환(에러 전파).
    let config = Config::from_env()?;
    tracing::info!("Starting docrev server on {}:{}", config.host, config.port);
    tracing::debug!(
        "Renderer timeout {:?}, diff timeout {:?}, max {} page(s)",
        config.renderer_timeout,
        config.diff_timeout,
        config.max_page_count
    );

    // ── 4단계: SQLite 연결 풀 생성 ──
    // 연결 풀(Connection Pool): 데이터베이스 연결을 미리 여러 개 만들어두고 재사용하는 패턴.
    let pool = SqlitePoolOptions::new()
        .max_connections(5) // 최대 5개의 동시 연결을 유지
        .connect(&config.database_url) // 데이터베이스에 연결 (비동기)
        .await?; // 연결 실패 시 에러 전파

    // ── 5단계: 데이터베이스 마이그레이션 실행 ──
    // sqlx::migrate!는 컴파일 타임에 ./migrations 폴더의 SQL 파일들을 포함시키는 매크로
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool) // 아직 실행되지 않은 마이그레이션만 순서대로 실행
        .await?;

    // ── 6단계: 애플리케이션 상태(State) 생성 ──
    // 버전 저장소는 전역 싱글턴이 아니라 여기서 한 번 만들어 명시적으로 주입합니다.
    // 세션 레지스트리도 같은 저장소를 받아 문서 세션마다 넘겨줍니다.
    // 렌더러 한도(호출당 시간, 최대 페이지 수)는 업로드와 커밋이 같은 값을 씁니다.
    let capture_limits = CaptureLimits {
        per_call: config.renderer_timeout,
        max_pages: config.max_page_count,
    };
    let store = VersionStore::new(pool.clone());
    let sessions = SessionRegistry::new(store.clone(), capture_limits);
    let state = AppState {
        pool: pool.clone(),
        store,
        sessions,
        capture_limits,
        diff_timeout: config.diff_timeout,
    };

    // ── 7단계: API 라우터 설정 ──
    // .route(): URL 패턴과 핸들러 함수를 연결합니다.
    // axum 0.8부터 경로 파라미터는 `{id}` 문법을 씁니다.

    // 문서 세션 라우트 (주석 이벤트, 커밋, 버전 전환)
    let session_routes = Router::new()
        .route(
            "/documents/{id}/session",
            get(get_session_status).post(open_session).delete(close_session),
        )
        .route("/documents/{id}/session/events", post(post_renderer_event))
        .route("/documents/{id}/session/annotations", put(resync_annotations))
        .route("/documents/{id}/session/changes", get(list_pending_changes))
        .route("/documents/{id}/session/commit", post(commit_session))
        .route("/documents/{id}/session/switch", post(request_switch))
        .route("/documents/{id}/session/switch/resolve", post(resolve_switch));

    // 모든 API 라우트를 하나로 합칩니다.
    let api_routes = Router::new()
        .merge(session_routes)
        // 문서 업로드/조회 API
        .route("/documents", get(list_documents).post(create_document))
        .route("/documents/{id}", get(get_document))
        // 버전 API (불변이라 조회만 있음)
        .route("/documents/{id}/versions", get(list_document_versions))
        .route("/versions/{id}", get(get_version))
        .route("/versions/{id}/content", get(get_version_content))
        .route("/versions/{base}/compare/{compare}", get(compare_versions))
        // 헬스체크 API (서버 상태 확인용)
        .route("/health", get(health_check))
        // .with_state(): 이 라우터의 모든 핸들러에서 AppState를 사용할 수 있게 합니다.
        .with_state(state);

    // ── 8단계: CORS 미들웨어 설정 ──
    // 뷰어는 브라우저에서 돌기 때문에 다른 출처에서의 호출을 허용합니다.
    let cors = CorsLayer::new()
        .allow_origin(Any)  // 모든 출처(origin) 허용
        .allow_methods(Any) // 모든 HTTP 메서드 허용
        .allow_headers(Any); // 모든 헤더 허용

    let app = Router::new()
        // .nest(): API 라우트를 /api/v1 경로 아래에 중첩시킵니다.
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http()); // HTTP 요청/응답 자동 로깅

    // ── 9단계: 서버 시작 ──
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // 이 줄에서 서버가 영원히 실행됩니다 (Ctrl+C로 종료할 때까지).
    axum::serve(listener, app).await?;

    Ok(())
}
