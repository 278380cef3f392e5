//! 샤드 로그 에러 타입
//!
//! [`ShardError`]는 `From<ShardError> for OrquestraError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.

use orquestra_core::error::{ConfigError, EventLogError, OrquestraError};

/// 샤드 로그 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ShardError {
    /// 이벤트 파일 또는 런 디렉토리 기록 실패
    #[error("write error: {path}: {source}")]
    Write {
        /// 대상 경로
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 런 디렉토리 조회 실패
    #[error("read error: {path}: {source}")]
    Read {
        /// 대상 경로
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 이벤트 직렬화 실패
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// 디렉토리 이름으로 쓸 수 없는 런 ID
    #[error("invalid run id '{run_id}': {reason}")]
    InvalidRunId {
        /// 문제가 된 런 ID
        run_id: String,
        /// 사유
        reason: String,
    },

    /// 리포트 출력 실패
    #[error("report output error: {0}")]
    Output(std::io::Error),
}

impl From<ShardError> for OrquestraError {
    fn from(err: ShardError) -> Self {
        match err {
            ShardError::Write { path, source } => OrquestraError::EventLog(EventLogError::Write {
                path,
                reason: source.to_string(),
            }),
            ShardError::Read { path, source } => OrquestraError::EventLog(EventLogError::Read {
                path,
                reason: source.to_string(),
            }),
            ShardError::Serialize(e) => OrquestraError::EventLog(EventLogError::Write {
                path: String::new(),
                reason: e.to_string(),
            }),
            ShardError::InvalidRunId { reason, .. } => {
                OrquestraError::Config(ConfigError::InvalidValue {
                    field: "shard.run_id".to_owned(),
                    reason,
                })
            }
            ShardError::Output(e) => OrquestraError::Io(e),
        }
    }
}
