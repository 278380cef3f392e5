//! 공유 컨텍스트 — DI 레지스트리와 컴포넌트 프로바이더 목록
//!
//! [`ContextBuilder`]로 설정 단계에서 프로바이더를 모으고, `build()` 이후에는
//! 읽기 전용입니다. [`Context`]는 내부가 `Arc`이므로 컴포넌트가 자유롭게
//! 복제해 보관할 수 있습니다.

use std::sync::Arc;

use crate::config::OrquestraConfig;
use crate::container::ContainerProvider;
use crate::error::MacroError;
use crate::http::{HttpServerAdapter, HttpServerFactory, HttpServerSource};
use crate::macros::{MacroRegistry, OrquestraMacro};
use crate::registry::{Provider, Registry};

struct ContextInner {
    config: OrquestraConfig,
    registry: Registry,
    macros: MacroRegistry,
    helpers: Vec<Provider>,
    plugins: Vec<Provider>,
    services: Vec<Provider>,
    containers: Vec<ContainerProvider>,
    http_server: Option<HttpServerSource>,
}

/// 공유 컨텍스트
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    /// 빌더를 생성합니다.
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    /// 설정
    pub fn config(&self) -> &OrquestraConfig {
        &self.inner.config
    }

    /// DI 레지스트리
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// 매크로 레지스트리
    pub fn macros(&self) -> &MacroRegistry {
        &self.inner.macros
    }

    /// 헬퍼 프로바이더 (등록 순서)
    pub fn helpers(&self) -> &[Provider] {
        &self.inner.helpers
    }

    /// 플러그인 프로바이더 (등록 순서)
    pub fn plugins(&self) -> &[Provider] {
        &self.inner.plugins
    }

    /// 서비스 프로바이더 (등록 순서)
    pub fn services(&self) -> &[Provider] {
        &self.inner.services
    }

    /// 최상위 컨테이너 프로바이더 (의존 컨테이너는 각 프로바이더 안에 있음)
    pub fn containers(&self) -> &[ContainerProvider] {
        &self.inner.containers
    }

    /// HTTP 서버 소스
    pub fn http_server(&self) -> Option<&HttpServerSource> {
        self.inner.http_server.as_ref()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("helpers", &self.inner.helpers)
            .field("plugins", &self.inner.plugins)
            .field("services", &self.inner.services)
            .field("containers", &self.inner.containers)
            .field("http_server", &self.inner.http_server)
            .field("macros", &self.inner.macros)
            .finish()
    }
}

/// [`Context`] 빌더
#[derive(Default)]
pub struct ContextBuilder {
    config: OrquestraConfig,
    macros: MacroRegistry,
    helpers: Vec<Provider>,
    plugins: Vec<Provider>,
    services: Vec<Provider>,
    containers: Vec<ContainerProvider>,
    http_server: Option<HttpServerSource>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 설정을 지정합니다.
    pub fn config(mut self, config: OrquestraConfig) -> Self {
        self.config = config;
        self
    }

    /// 헬퍼를 추가합니다.
    pub fn helper(mut self, provider: impl Into<Provider>) -> Self {
        self.helpers.push(provider.into());
        self
    }

    /// 플러그인을 추가합니다.
    pub fn plugin(mut self, provider: impl Into<Provider>) -> Self {
        self.plugins.push(provider.into());
        self
    }

    /// 서비스를 추가합니다.
    pub fn service(mut self, provider: impl Into<Provider>) -> Self {
        self.services.push(provider.into());
        self
    }

    /// 컨테이너를 추가합니다.
    pub fn container(mut self, provider: ContainerProvider) -> Self {
        self.containers.push(provider);
        self
    }

    /// 미리 만들어진 HTTP 서버 어댑터를 지정합니다.
    pub fn http_server(mut self, adapter: impl HttpServerAdapter) -> Self {
        self.http_server = Some(HttpServerSource::Adapter(Arc::new(adapter)));
        self
    }

    /// 지연 생성 HTTP 서버 팩토리를 지정합니다.
    pub fn http_server_factory(mut self, factory: HttpServerFactory) -> Self {
        self.http_server = Some(HttpServerSource::Factory(factory));
        self
    }

    /// 매크로를 등록합니다. 제목이 비어 있으면 실패합니다.
    pub fn macro_(self, m: impl OrquestraMacro) -> Result<Self, MacroError> {
        self.macros.register(Arc::new(m))?;
        Ok(self)
    }

    /// 컨텍스트를 생성합니다.
    pub fn build(self) -> Context {
        Context {
            inner: Arc::new(ContextInner {
                config: self.config,
                registry: Registry::new(),
                macros: self.macros,
                helpers: self.helpers,
                plugins: self.plugins,
                services: self.services,
                containers: self.containers,
                http_server: self.http_server,
            }),
        }
    }
}
