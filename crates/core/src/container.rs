//! 인프라 컨테이너 계약 — 일시적 외부 서비스(DB, 브로커 등)의 시작/정지
//!
//! 사용자는 [`InfraContainer`]를 구현하고, 프레임워크는 이를 [`OrquestraContainer`]로
//! 감싸 실행 상태를 관리합니다. 컨테이너 간 의존성은 [`ContainerProvider::depends_on`]으로
//! 선언하며, 오케스트레이터가 의존성 순서대로 시작하고 역순으로 정지합니다.
//!
//! # 상태 전이
//! ```text
//! unstarted ──start()──▶ running ──stop()──▶ stopped ──start()──▶ running
//! ```

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::component::{BoxFuture, Constructible, Injectable, Instance, downcast};
use crate::context::Context;
use crate::registry::{Provider, Token};

/// `up()`이 반환하는 실행 중인 컨테이너 핸들
pub trait StartedContainer: Send + Sync + 'static {
    /// 컨테이너를 정지합니다.
    fn stop(&self) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// 사용자가 구현하는 인프라 컨테이너
///
/// # 구현 예시
/// ```ignore
/// struct PostgresContainer;
///
/// impl Injectable for PostgresContainer {}
///
/// impl InfraContainer for PostgresContainer {
///     type Handle = StartedPostgres;
///
///     fn container_name(&self) -> &str {
///         "postgres"
///     }
///
///     async fn up(&self) -> anyhow::Result<StartedPostgres> {
///         StartedPostgres::launch().await
///     }
/// }
/// ```
pub trait InfraContainer: Injectable {
    /// 실행 중 핸들 타입
    type Handle: StartedContainer;

    /// 컨테이너 이름 (로그 및 에러 메시지용)
    fn container_name(&self) -> &str;

    /// 컨테이너를 띄우고 핸들을 반환합니다.
    fn up(&self) -> impl Future<Output = anyhow::Result<Self::Handle>> + Send;
}

/// 실행 상태를 관리하는 컨테이너 래퍼
pub struct OrquestraContainer<C: InfraContainer> {
    inner: C,
    handle: Mutex<Option<Arc<C::Handle>>>,
    transition: tokio::sync::Mutex<()>,
}

impl<C: InfraContainer> OrquestraContainer<C> {
    /// 컨테이너를 감쌉니다. 초기 상태는 unstarted입니다.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            handle: Mutex::new(None),
            transition: tokio::sync::Mutex::new(()),
        }
    }

    /// 감싼 사용자 컨테이너
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// 컨테이너 이름
    pub fn name(&self) -> &str {
        self.inner.container_name()
    }

    /// 실행 중 핸들 (정지 상태면 `None`)
    pub fn unwrap(&self) -> Option<Arc<C::Handle>> {
        self.slot().clone()
    }

    /// 실행 중인지 확인합니다.
    pub fn is_running(&self) -> bool {
        self.slot().is_some()
    }

    /// 컨테이너를 시작합니다. 이미 실행 중이면 기존 핸들을 반환합니다.
    pub async fn start(&self) -> anyhow::Result<Arc<C::Handle>> {
        let _guard = self.transition.lock().await;
        if let Some(handle) = self.unwrap() {
            return Ok(handle);
        }
        let handle = Arc::new(self.inner.up().await?);
        *self.slot() = Some(Arc::clone(&handle));
        Ok(handle)
    }

    /// 컨테이너를 정지합니다. 실행 중이 아니면 아무것도 하지 않습니다.
    ///
    /// 정지에 실패하면 핸들을 유지하므로 다시 시도할 수 있습니다.
    pub async fn stop(&self) -> anyhow::Result<()> {
        let _guard = self.transition.lock().await;
        let Some(handle) = self.unwrap() else {
            return Ok(());
        };
        handle.stop().await?;
        *self.slot() = None;
        Ok(())
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<C::Handle>>> {
        self.handle.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<C: InfraContainer> Injectable for OrquestraContainer<C> {}

impl<C: InfraContainer + Constructible> Constructible for OrquestraContainer<C> {
    fn construct(ctx: &Context) -> Self {
        Self::new(C::construct(ctx))
    }
}

// ─── DynContainer ────────────────────────────────────────────────────

/// 오케스트레이터가 사용하는 dyn-compatible 컨테이너 trait
pub trait DynContainer: Send + Sync + 'static {
    /// 컨테이너 이름
    fn name(&self) -> &str;

    /// 실행 중인지 확인합니다.
    fn is_running(&self) -> bool;

    /// 컨테이너를 시작합니다.
    fn start(&self) -> BoxFuture<'_, anyhow::Result<()>>;

    /// 컨테이너를 정지합니다.
    fn stop(&self) -> BoxFuture<'_, anyhow::Result<()>>;
}

impl<C: InfraContainer> DynContainer for OrquestraContainer<C> {
    fn name(&self) -> &str {
        OrquestraContainer::name(self)
    }

    fn is_running(&self) -> bool {
        OrquestraContainer::is_running(self)
    }

    fn start(&self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move { OrquestraContainer::start(self).await.map(|_| ()) })
    }

    fn stop(&self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(OrquestraContainer::stop(self))
    }
}

// ─── ContainerProvider ───────────────────────────────────────────────

/// 레지스트리 인스턴스를 컨테이너 trait 객체로 변환하는 함수
pub type ContainerCast = fn(Instance) -> Option<Arc<dyn DynContainer>>;

fn cast<C: InfraContainer>(instance: Instance) -> Option<Arc<dyn DynContainer>> {
    downcast::<OrquestraContainer<C>>(instance).map(|c| c as Arc<dyn DynContainer>)
}

/// 컨테이너 프로바이더와 의존성 선언
///
/// 레지스트리에 등록되는 인스턴스는 항상 [`OrquestraContainer<C>`]입니다.
#[derive(Clone)]
pub struct ContainerProvider {
    provider: Provider,
    cast: ContainerCast,
    depends_on: Vec<ContainerProvider>,
}

impl ContainerProvider {
    /// 컨텍스트로 생성되는 컨테이너 (토큰 = 사용자 컨테이너 타입)
    pub fn of<C: InfraContainer + Constructible>() -> Self {
        Self {
            provider: Provider::class_as::<OrquestraContainer<C>>(Token::of::<C>()),
            cast: cast::<C>,
            depends_on: Vec::new(),
        }
    }

    /// 비동기 팩토리로 생성되는 컨테이너
    pub fn factory<C, F, Fut>(token: impl Into<Token>, factory: F) -> Self
    where
        C: InfraContainer,
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<C>> + Send + 'static,
    {
        let factory = Arc::new(factory);
        Self {
            provider: Provider::factory(token, move |ctx| {
                let fut = factory(ctx);
                async move { fut.await.map(OrquestraContainer::new) }
            }),
            cast: cast::<C>,
            depends_on: Vec::new(),
        }
    }

    /// 미리 만들어진 컨테이너
    pub fn value<C: InfraContainer>(token: impl Into<Token>, container: C) -> Self {
        Self {
            provider: Provider::value(token, OrquestraContainer::new(container)),
            cast: cast::<C>,
            depends_on: Vec::new(),
        }
    }

    /// 의존 컨테이너를 추가합니다. 여러 번 호출하면 누적됩니다.
    pub fn depends_on(mut self, deps: impl IntoIterator<Item = ContainerProvider>) -> Self {
        self.depends_on.extend(deps);
        self
    }

    /// 컨테이너 토큰
    pub fn token(&self) -> &Token {
        self.provider.token()
    }

    /// 레지스트리에 등록할 프로바이더
    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// 직접 의존 컨테이너 (토큰 기준 중복 제거, 선언 순서 유지)
    pub fn dependencies(&self) -> Vec<&ContainerProvider> {
        let mut seen: Vec<&Token> = Vec::new();
        let mut deps = Vec::new();
        for dep in &self.depends_on {
            if !seen.contains(&dep.token()) {
                seen.push(dep.token());
                deps.push(dep);
            }
        }
        deps
    }

    /// 인스턴스를 컨테이너 trait 객체로 변환합니다.
    pub fn cast(&self, instance: Instance) -> Option<Arc<dyn DynContainer>> {
        (self.cast)(instance)
    }
}

impl std::fmt::Debug for ContainerProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerProvider")
            .field("token", self.token())
            .field(
                "depends_on",
                &self
                    .dependencies()
                    .iter()
                    .map(|d| d.token().to_string())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
