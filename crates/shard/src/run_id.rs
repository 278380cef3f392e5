//! 런 식별자 -- 한 번의 논리적 테스트 실행을 여러 워커 프로세스가 공유
//!
//! 해석 순서: 명시적 값 → 환경변수 → 새 UUID 생성. 새로 생성한 ID는
//! 환경변수로 게시되어 이후에 띄워지는 자식 프로세스가 상속합니다.

use std::fmt;

use orquestra_core::config::ShardConfig;
use tracing::{debug, info};

use crate::error::ShardError;

/// 런 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(String);

impl RunId {
    /// 런 ID를 검증하여 생성합니다. 디렉토리 이름으로 쓰이므로 단일 경로 세그먼트여야 합니다.
    pub fn new(id: impl Into<String>) -> Result<Self, ShardError> {
        let id = id.into();
        let invalid = |reason: &str| ShardError::InvalidRunId {
            run_id: id.clone(),
            reason: reason.to_owned(),
        };
        if id.trim().is_empty() {
            return Err(invalid("must not be empty"));
        }
        if id.contains(['/', '\\']) {
            return Err(invalid("must not contain a path separator"));
        }
        if id == "." || id == ".." {
            return Err(invalid("must not be a relative path component"));
        }
        Ok(Self(id))
    }

    /// 새 런 ID를 생성합니다.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// 환경변수에서 런 ID를 읽습니다. 비어 있으면 `None`입니다.
    pub fn from_env(env_var: &str) -> Option<Result<Self, ShardError>> {
        let value = std::env::var(env_var).ok()?;
        if value.trim().is_empty() {
            return None;
        }
        Some(Self::new(value))
    }

    /// 명시적 값 → 환경변수 → 생성 순서로 런 ID를 결정합니다.
    ///
    /// 생성한 경우 `env_var`로 게시합니다.
    pub fn resolve(explicit: Option<&str>, env_var: &str) -> Result<Self, ShardError> {
        if let Some(id) = explicit {
            debug!(run_id = id, "using explicit run id");
            return Self::new(id);
        }
        if let Some(id) = Self::from_env(env_var) {
            let id = id?;
            debug!(run_id = %id, env_var, "using run id from environment");
            return Ok(id);
        }

        let id = Self::generate();
        // SAFETY: 런 ID는 부트스트랩 설정 단계에서 워커를 띄우기 전에 한 번 게시되며,
        // 같은 시점에 환경변수를 읽는 다른 스레드가 없습니다.
        unsafe { std::env::set_var(env_var, id.as_str()) };
        info!(run_id = %id, env_var, "generated new run id");
        Ok(id)
    }

    /// 샤드 설정으로 런 ID를 결정합니다.
    pub fn from_config(config: &ShardConfig) -> Result<Self, ShardError> {
        Self::resolve(config.run_id.as_deref(), &config.run_id_env)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RunId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
