//! 샤드 매니저 -- 런 디렉토리에 이벤트를 파일 단위로 추가하고 다시 읽음
//!
//! 파일 이름은 `<hrtime>-<pid>-<rand>.json`입니다. `hrtime`은 20자리로 0을 채운
//! 나노초 시각이라 사전순 정렬이 기록 순서를 근사합니다. 같은 프로세스 안에서는
//! 시각이 항상 증가하도록 보정합니다.
//!
//! 기록은 임시 파일에 쓴 뒤 rename하므로, 동시에 읽는 프로세스가
//! 반쯤 쓰인 `.json` 파일을 보지 않습니다.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use orquestra_core::config::ShardConfig;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ShardError;
use crate::event::StepEvent;
use crate::run_id::RunId;

const EVENT_EXT: &str = "json";

/// 런 디렉토리 요약
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunInfo {
    /// 런 ID (디렉토리 이름)
    pub run_id: String,
    /// 이벤트 파일 수
    pub events: usize,
}

/// 런 하나의 이벤트 로그
#[derive(Debug, Clone)]
pub struct ShardManager {
    root: PathBuf,
    run_id: RunId,
}

impl ShardManager {
    /// 루트 디렉토리와 런 ID로 매니저를 생성합니다. 디렉토리는 첫 기록 시 만들어집니다.
    pub fn new(root: impl Into<PathBuf>, run_id: RunId) -> Self {
        Self {
            root: root.into(),
            run_id,
        }
    }

    /// 샤드 설정으로 매니저를 생성합니다. 런 ID는 [`RunId::from_config`] 규칙을 따릅니다.
    pub fn from_config(config: &ShardConfig) -> Result<Self, ShardError> {
        Ok(Self::new(config.resolved_root(), RunId::from_config(config)?))
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// 런 디렉토리들의 루트
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 이 런의 이벤트 디렉토리
    pub fn run_dir(&self) -> PathBuf {
        self.root.join(self.run_id.as_str())
    }

    /// 이벤트 하나를 새 파일로 기록하고 그 경로를 반환합니다.
    pub async fn write(&self, event: &StepEvent) -> Result<PathBuf, ShardError> {
        let dir = self.run_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| ShardError::Write {
                path: dir.display().to_string(),
                source,
            })?;

        let payload = serde_json::to_vec(event)?;
        let name = event_file_name();
        let tmp = dir.join(format!(".{name}.tmp"));
        let path = dir.join(&name);

        tokio::fs::write(&tmp, &payload)
            .await
            .map_err(|source| ShardError::Write {
                path: tmp.display().to_string(),
                source,
            })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| ShardError::Write {
                path: path.display().to_string(),
                source,
            })?;

        debug!(
            run_id = %self.run_id,
            step_id = %event.step_id,
            status = %event.status,
            file = %name,
            "wrote step event"
        );
        Ok(path)
    }

    /// 런의 모든 이벤트를 파일 이름 순서로 읽습니다.
    ///
    /// 런 디렉토리가 없으면 빈 목록입니다. 읽을 수 없거나 손상된 파일은 건너뜁니다.
    pub async fn read_events(&self) -> Result<Vec<StepEvent>, ShardError> {
        let dir = self.run_dir();
        let files = match event_files(&dir).await {
            Ok(files) => files,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(ShardError::Read {
                    path: dir.display().to_string(),
                    source,
                });
            }
        };

        let mut events = Vec::with_capacity(files.len());
        let mut skipped = 0usize;
        for file in &files {
            let raw = match tokio::fs::read(dir.join(file)).await {
                Ok(raw) => raw,
                Err(e) => {
                    debug!(file = %file, error = %e, "skipping unreadable event file");
                    skipped += 1;
                    continue;
                }
            };
            match serde_json::from_slice::<StepEvent>(&raw) {
                Ok(event) => events.push(event),
                Err(e) => {
                    debug!(file = %file, error = %e, "skipping corrupt event file");
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            warn!(run_id = %self.run_id, skipped, "some event files could not be read");
        }
        Ok(events)
    }

    /// 이 런의 이벤트 디렉토리를 삭제합니다. 삭제했으면 `true`입니다.
    pub async fn clean(&self) -> Result<bool, ShardError> {
        remove_dir(&self.run_dir()).await
    }

    /// 루트 아래의 모든 런을 이름순으로 나열합니다. 루트가 없으면 빈 목록입니다.
    pub async fn list_runs(root: &Path) -> Result<Vec<RunInfo>, ShardError> {
        let read_err = |source| ShardError::Read {
            path: root.display().to_string(),
            source,
        };
        let mut entries = match tokio::fs::read_dir(root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(read_err(e)),
        };

        let mut runs = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if !is_dir {
                continue;
            }
            let run_id = entry.file_name().to_string_lossy().into_owned();
            let events = event_files(&entry.path()).await.map(|f| f.len()).unwrap_or(0);
            runs.push(RunInfo { run_id, events });
        }
        runs.sort_by(|a, b| a.run_id.cmp(&b.run_id));
        Ok(runs)
    }

    /// 루트 디렉토리 전체를 삭제합니다. 삭제했으면 `true`입니다.
    pub async fn clean_all(root: &Path) -> Result<bool, ShardError> {
        remove_dir(root).await
    }
}

/// 디렉토리의 이벤트 파일 이름을 사전순으로 반환합니다.
async fn event_files(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_event = Path::new(&name)
            .extension()
            .is_some_and(|ext| ext == EVENT_EXT);
        if is_event && !name.starts_with('.') {
            files.push(name);
        }
    }
    files.sort();
    Ok(files)
}

async fn remove_dir(dir: &Path) -> Result<bool, ShardError> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {
            debug!(path = %dir.display(), "removed shard directory");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(ShardError::Write {
            path: dir.display().to_string(),
            source,
        }),
    }
}

fn event_file_name() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{:020}-{}-{}.{EVENT_EXT}",
        monotonic_nanos(),
        std::process::id(),
        &suffix[..8]
    )
}

/// 프로세스 안에서 엄격히 증가하는 나노초 시각
fn monotonic_nanos() -> u64 {
    static LAST: AtomicU64 = AtomicU64::new(0);

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0);

    let mut last = LAST.load(Ordering::Relaxed);
    loop {
        let next = now.max(last.saturating_add(1));
        match LAST.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}
