//! 설정 관리 — orquestra.toml 파싱 및 런타임 설정
//!
//! [`OrquestraConfig`]는 부트스트랩, 샤드 로그, 리포터, 로깅 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`ORQUESTRA_SHARD_ROOT_DIR=/tmp/runs` 형식)
//! 2. 설정 파일 (`orquestra.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), orquestra_core::error::OrquestraError> {
//! use orquestra_core::config::OrquestraConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = OrquestraConfig::load("orquestra.toml").await?;
//!
//! // 파일 없이 기본값 + 환경변수
//! let config = OrquestraConfig::from_env()?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, OrquestraError};

/// 런 ID 기본 환경변수 이름
pub const DEFAULT_RUN_ID_ENV: &str = "ORQUESTRA_RUN_ID";

/// 샤드 로그 기본 루트 디렉토리
pub const DEFAULT_SHARD_ROOT: &str = ".orquestra";

/// Orquestra 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrquestraConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 샤드(이벤트 로그) 설정
    #[serde(default)]
    pub shard: ShardConfig,
    /// 부트스트랩 설정
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    /// 콘솔 리포터 설정
    #[serde(default)]
    pub reporter: ReporterConfig,
}

impl OrquestraConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, OrquestraError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OrquestraError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                OrquestraError::Io(e)
            }
        })?;
        let mut config = Self::parse(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 기본값에 환경변수 오버라이드만 적용합니다.
    pub fn from_env() -> Result<Self, OrquestraError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, OrquestraError> {
        toml::from_str(toml_str).map_err(|e| {
            OrquestraError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `ORQUESTRA_{SECTION}_{FIELD}`
    /// 예: `ORQUESTRA_BOOTSTRAP_SKIP_CONTAINERS=true`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "ORQUESTRA_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "ORQUESTRA_GENERAL_LOG_FORMAT");

        // Shard
        override_path(&mut self.shard.root_dir, "ORQUESTRA_SHARD_ROOT_DIR");
        override_string(&mut self.shard.run_id_env, "ORQUESTRA_SHARD_RUN_ID_ENV");

        // Bootstrap
        override_bool(
            &mut self.bootstrap.skip_containers,
            "ORQUESTRA_BOOTSTRAP_SKIP_CONTAINERS",
        );
        override_bool(
            &mut self.bootstrap.strict_container_teardown,
            "ORQUESTRA_BOOTSTRAP_STRICT_CONTAINER_TEARDOWN",
        );

        // Reporter
        override_bool(&mut self.reporter.enabled, "ORQUESTRA_REPORTER_ENABLED");
        override_bool(&mut self.reporter.color, "ORQUESTRA_REPORTER_COLOR");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), OrquestraError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.shard.root_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "shard.root_dir".to_owned(),
                reason: "root directory must not be empty".to_owned(),
            }
            .into());
        }

        if self.shard.run_id_env.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "shard.run_id_env".to_owned(),
                reason: "environment variable name must not be empty".to_owned(),
            }
            .into());
        }

        // 런 ID는 디렉토리 이름으로 쓰이므로 경로 구분자를 허용하지 않음
        if let Some(run_id) = &self.shard.run_id {
            if run_id.is_empty() || run_id.contains(['/', '\\']) || run_id == "." || run_id == ".."
            {
                return Err(ConfigError::InvalidValue {
                    field: "shard.run_id".to_owned(),
                    reason: "must be a non-empty single path segment".to_owned(),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 샤드 로그 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardConfig {
    /// 런 디렉토리들이 생성될 루트 (상대 경로는 현재 작업 디렉토리 기준)
    pub root_dir: PathBuf,
    /// 워커 프로세스 간에 공유되는 런 ID 환경변수 이름
    pub run_id_env: String,
    /// 명시적인 런 ID (환경변수보다 우선)
    pub run_id: Option<String>,
}

impl ShardConfig {
    /// 현재 작업 디렉토리 기준으로 해석한 루트 디렉토리
    pub fn resolved_root(&self) -> PathBuf {
        if self.root_dir.is_absolute() {
            return self.root_dir.clone();
        }
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(&self.root_dir),
            Err(e) => {
                warn!(error = %e, "current directory unavailable, using relative shard root");
                self.root_dir.clone()
            }
        }
    }
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from(DEFAULT_SHARD_ROOT),
            run_id_env: DEFAULT_RUN_ID_ENV.to_owned(),
            run_id: None,
        }
    }
}

/// 부트스트랩 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// 컨테이너 단계 건너뛰기
    pub skip_containers: bool,
    /// 컨테이너 정지 실패를 teardown 에러로 보고
    pub strict_container_teardown: bool,
}

/// 콘솔 리포터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// teardown 후 리포트 출력 여부
    pub enabled: bool,
    /// ANSI 색상 사용 여부
    pub color: bool,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            color: true,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_path(target: &mut PathBuf, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = PathBuf::from(val);
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}
