//! 에러 타입 — 도메인별 에러 정의
//!
//! 사용자가 제공하는 콜백(훅, 팩토리, 스텝 본문)은 `anyhow::Result`를 반환하며,
//! 프레임워크는 그 에러를 아래 타입들의 `source`로 감싸서 전파합니다.

/// 사용자 콜백 에러를 담는 박스 타입
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Orquestra 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum OrquestraError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// DI 프로바이더 에러
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// 생명주기(start/teardown) 에러
    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// 매크로 레지스트리 에러
    #[error("macro error: {0}")]
    Macro(#[from] MacroError),

    /// 이벤트 로그(샤드) 에러
    #[error("event log error: {0}")]
    EventLog(#[from] EventLogError),

    /// 시나리오 실행 에러
    #[error("scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// DI 프로바이더 에러
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// 토큰에 등록된 프로바이더가 없음
    #[error("provider not found for token: {token}")]
    NotFound { token: String },

    /// 팩토리 실행 실패
    #[error("failed to instantiate provider '{token}'")]
    Instantiation {
        token: String,
        #[source]
        source: BoxError,
    },

    /// 인스턴스 타입이 요청한 타입과 다름
    #[error("instance for token '{token}' is not a {expected}")]
    TypeMismatch { token: String, expected: &'static str },
}

/// 생명주기 에러
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// 컴포넌트 훅(on_start/on_teardown) 실패
    #[error("{hook} hook failed for '{component}'")]
    Hook {
        component: String,
        hook: &'static str,
        #[source]
        source: BoxError,
    },

    /// 컨테이너 의존성 순환
    #[error("circular dependency detected for container: {token}")]
    CircularDependency { token: String },

    /// 컨테이너 시작 실패
    #[error("failed to start container '{name}'")]
    ContainerStart {
        name: String,
        #[source]
        source: BoxError,
    },

    /// 컨테이너로 등록되지 않은 토큰
    #[error("token '{token}' does not resolve to a container")]
    NotAContainer { token: String },

    /// strict 모드에서 하나 이상의 컨테이너 정지 실패
    #[error("container teardown failed: {}", failures.join("; "))]
    ContainerTeardown { failures: Vec<String> },

    /// HTTP 서버 팩토리 실패
    #[error("http server factory failed")]
    HttpServerFactory {
        #[source]
        source: BoxError,
    },

    /// 등록된 HTTP 서버가 없음
    #[error("no http server registered")]
    HttpServerMissing,
}

/// 매크로 레지스트리 에러
#[derive(Debug, thiserror::Error)]
pub enum MacroError {
    /// 빈 제목
    #[error("macro must have a non-empty title")]
    EmptyTitle,
}

/// 이벤트 로그 에러
#[derive(Debug, thiserror::Error)]
pub enum EventLogError {
    /// 이벤트 기록 실패
    #[error("failed to write event to {path}: {reason}")]
    Write { path: String, reason: String },

    /// 이벤트 디렉토리 조회 실패
    #[error("failed to read events from {path}: {reason}")]
    Read { path: String, reason: String },
}

/// 시나리오 실행 에러
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// 이름으로 참조한 스텝이 정의되지 않음
    #[error("step not found: {keyword} {name}")]
    StepNotFound { keyword: String, name: String },

    /// 스텝 실행 실패
    #[error("step '{keyword} {step}' failed in {feature} / {scenario}: {reason}")]
    StepFailed {
        feature: String,
        scenario: String,
        keyword: String,
        step: String,
        reason: String,
    },

    /// 이벤트 기록 실패로 시나리오를 진행할 수 없음
    #[error("event sink failed: {0}")]
    Sink(String),
}
