//! HTTP 서버 어댑터 계약
//!
//! 테스트 대상 HTTP 애플리케이션을 프레임워크에 연결합니다. 어댑터는
//! 프레임워크 앱 핸들, 요청을 보내는 테스트 클라이언트, 요청 전 훅,
//! 종료 핸들러를 제공합니다.
//!
//! 어댑터는 미리 만들어 등록하거나, [`HttpServerFactory`]로 지연 생성할 수 있습니다.
//! 팩토리는 컨테이너가 모두 시작된 뒤 한 번 호출됩니다.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::component::{BoxFuture, Injectable};
use crate::context::Context;
use crate::registry::Token;

/// HTTP 서버 팩토리가 등록되는 토큰
pub const HTTP_SERVER_FACTORY_TOKEN: Token =
    Token::Named(Cow::Borrowed("ORQUESTRA_HTTP_SERVER_FACTORY"));

/// 활성 HTTP 서버가 등록되는 토큰
pub const HTTP_SERVER_TOKEN: Token = Token::Named(Cow::Borrowed("ORQUESTRA_HTTP_SERVER"));

// ─── HttpMethod / MethodFilter ───────────────────────────────────────

/// 요청 전 훅이 구분하는 HTTP 메서드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    /// 모든 메서드
    pub const ALL: [HttpMethod; 7] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Delete,
        Self::Patch,
        Self::Head,
        Self::Options,
    ];

    /// 소문자 메서드 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
            Self::Patch => "patch",
            Self::Head => "head",
            Self::Options => "options",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
            Self::Patch => reqwest::Method::PATCH,
            Self::Head => reqwest::Method::HEAD,
            Self::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown http method: {s}"))
    }
}

/// 훅을 적용할 메서드 필터
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MethodFilter {
    /// 모든 메서드
    #[default]
    All,
    /// 지정한 메서드만
    Only(Vec<HttpMethod>),
}

impl MethodFilter {
    /// 메서드가 필터에 해당하는지 확인합니다.
    pub fn matches(&self, method: HttpMethod) -> bool {
        match self {
            Self::All => true,
            Self::Only(methods) => methods.contains(&method),
        }
    }
}

impl From<HttpMethod> for MethodFilter {
    fn from(method: HttpMethod) -> Self {
        Self::Only(vec![method])
    }
}

impl From<Vec<HttpMethod>> for MethodFilter {
    fn from(methods: Vec<HttpMethod>) -> Self {
        Self::Only(methods)
    }
}

impl<const N: usize> From<[HttpMethod; N]> for MethodFilter {
    fn from(methods: [HttpMethod; N]) -> Self {
        Self::Only(methods.to_vec())
    }
}

// ─── Hooks ───────────────────────────────────────────────────────────

/// 요청 빌더를 변환하는 요청 전 훅 (예: 인증 헤더 추가)
pub type PreRequestHook =
    Arc<dyn Fn(reqwest::RequestBuilder) -> reqwest::RequestBuilder + Send + Sync>;

/// 서버 종료 시 호출되는 핸들러
pub type CloseHandler = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

#[derive(Clone)]
struct HookEntry {
    hook: PreRequestHook,
    filter: MethodFilter,
}

type HookList = Arc<Mutex<Vec<HookEntry>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

// ─── HttpServerAdapter ───────────────────────────────────────────────

/// HTTP 서버 어댑터 trait
pub trait HttpServerAdapter: Send + Sync + 'static {
    /// 프레임워크 앱 핸들
    fn app(&self) -> &(dyn Any + Send + Sync);

    /// 요청을 보내는 테스트 클라이언트를 생성합니다.
    fn create_client(&self) -> TestClient;

    /// 종료 핸들러를 설정합니다.
    fn set_close_handler(&self, handler: CloseHandler);

    /// 요청 전 훅을 추가합니다.
    fn add_pre_request_hook(&self, hook: PreRequestHook, filter: MethodFilter);

    /// 서버를 종료합니다. 종료 핸들러가 없으면 아무것도 하지 않습니다.
    fn close(&self) -> BoxFuture<'_, anyhow::Result<()>>;
}

/// 재사용 가능한 어댑터 구현
///
/// 프레임워크 앱 `T`와 서버의 base URL을 보관하고, 훅과 종료 핸들러를 관리합니다.
///
/// # 사용 예시
/// ```ignore
/// let server = HttpServerBase::new(router, format!("http://{addr}"));
/// server.add_pre_request_hook(
///     Arc::new(|req| req.bearer_auth("token")),
///     MethodFilter::from([HttpMethod::Post, HttpMethod::Put]),
/// );
/// ```
pub struct HttpServerBase<T> {
    app: T,
    base_url: String,
    client: reqwest::Client,
    hooks: HookList,
    close_handler: Mutex<Option<CloseHandler>>,
}

impl<T: Send + Sync + 'static> HttpServerBase<T> {
    /// 어댑터를 생성합니다.
    pub fn new(app: T, base_url: impl Into<String>) -> Self {
        Self {
            app,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            client: reqwest::Client::new(),
            hooks: Arc::new(Mutex::new(Vec::new())),
            close_handler: Mutex::new(None),
        }
    }

    /// 프레임워크 앱 참조
    pub fn inner(&self) -> &T {
        &self.app
    }

    /// 서버 base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 등록된 훅 수
    pub fn hook_count(&self) -> usize {
        lock(&self.hooks).len()
    }
}

impl<T: Send + Sync + 'static> HttpServerAdapter for HttpServerBase<T> {
    fn app(&self) -> &(dyn Any + Send + Sync) {
        &self.app
    }

    fn create_client(&self) -> TestClient {
        TestClient {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            hooks: Arc::clone(&self.hooks),
        }
    }

    fn set_close_handler(&self, handler: CloseHandler) {
        *lock(&self.close_handler) = Some(handler);
    }

    fn add_pre_request_hook(&self, hook: PreRequestHook, filter: MethodFilter) {
        lock(&self.hooks).push(HookEntry { hook, filter });
    }

    fn close(&self) -> BoxFuture<'_, anyhow::Result<()>> {
        let handler = lock(&self.close_handler).clone();
        Box::pin(async move {
            match handler {
                Some(handler) => handler().await,
                None => Ok(()),
            }
        })
    }
}

// ─── TestClient ──────────────────────────────────────────────────────

/// 어댑터의 훅을 적용해 요청을 만드는 테스트 클라이언트
///
/// 훅 목록은 어댑터와 공유되므로, 클라이언트 생성 이후 추가된 훅도 적용됩니다.
#[derive(Clone)]
pub struct TestClient {
    client: reqwest::Client,
    base_url: String,
    hooks: HookList,
}

impl TestClient {
    /// 요청 빌더를 만들고 메서드에 해당하는 훅을 등록 순서대로 적용합니다.
    pub fn request(&self, method: HttpMethod, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let hooks: Vec<HookEntry> = lock(&self.hooks).clone();
        hooks
            .into_iter()
            .filter(|entry| entry.filter.matches(method))
            .fold(
                self.client.request(method.to_reqwest(), url),
                |req, entry| (entry.hook)(req),
            )
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(HttpMethod::Get, path)
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(HttpMethod::Post, path)
    }

    pub fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(HttpMethod::Put, path)
    }

    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(HttpMethod::Delete, path)
    }

    pub fn patch(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(HttpMethod::Patch, path)
    }

    pub fn head(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(HttpMethod::Head, path)
    }

    pub fn options(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(HttpMethod::Options, path)
    }

    /// 서버 base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl fmt::Debug for TestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

// ─── OrquestraHttpServer ─────────────────────────────────────────────

/// 활성 어댑터를 감싸는 관리 컴포넌트
///
/// teardown 시 어댑터를 종료합니다.
#[derive(Clone)]
pub struct OrquestraHttpServer {
    adapter: Arc<dyn HttpServerAdapter>,
}

impl OrquestraHttpServer {
    pub fn new(adapter: Arc<dyn HttpServerAdapter>) -> Self {
        Self { adapter }
    }

    /// 감싼 어댑터
    pub fn adapter(&self) -> &Arc<dyn HttpServerAdapter> {
        &self.adapter
    }

    /// 프레임워크 앱을 구체 타입으로 꺼냅니다.
    pub fn app<T: Any>(&self) -> Option<&T> {
        self.adapter.app().downcast_ref::<T>()
    }

    pub fn create_client(&self) -> TestClient {
        self.adapter.create_client()
    }

    pub fn set_close_handler(&self, handler: CloseHandler) {
        self.adapter.set_close_handler(handler);
    }

    pub fn add_pre_request_hook(&self, hook: PreRequestHook, filter: impl Into<MethodFilter>) {
        self.adapter.add_pre_request_hook(hook, filter.into());
    }

    pub async fn close(&self) -> anyhow::Result<()> {
        self.adapter.close().await
    }
}

impl Injectable for OrquestraHttpServer {
    async fn on_teardown(&self) -> anyhow::Result<()> {
        self.close().await
    }
}

// ─── HttpServerFactory ───────────────────────────────────────────────

type FactoryFn =
    Arc<dyn Fn(Context) -> BoxFuture<'static, anyhow::Result<Arc<dyn HttpServerAdapter>>> + Send + Sync>;

/// 지연 생성되는 HTTP 서버 팩토리
///
/// [`HTTP_SERVER_FACTORY_TOKEN`]으로 레지스트리에 등록되며, HTTP 서버 단계에서
/// 한 번 호출됩니다.
#[derive(Clone)]
pub struct HttpServerFactory {
    create: FactoryFn,
}

impl HttpServerFactory {
    /// 동기 팩토리
    pub fn sync<A, F>(factory: F) -> Self
    where
        A: HttpServerAdapter,
        F: Fn(&Context) -> anyhow::Result<A> + Send + Sync + 'static,
    {
        Self {
            create: Arc::new(move |ctx: Context| {
                let result = factory(&ctx).map(|a| Arc::new(a) as Arc<dyn HttpServerAdapter>);
                Box::pin(async move { result }) as BoxFuture<'static, _>
            }),
        }
    }

    /// 비동기 팩토리
    pub fn from_async<A, F, Fut>(factory: F) -> Self
    where
        A: HttpServerAdapter,
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<A>> + Send + 'static,
    {
        Self {
            create: Arc::new(move |ctx: Context| {
                let fut = factory(ctx);
                Box::pin(async move {
                    let adapter = fut.await?;
                    Ok(Arc::new(adapter) as Arc<dyn HttpServerAdapter>)
                }) as BoxFuture<'static, _>
            }),
        }
    }

    /// 어댑터를 생성합니다.
    pub async fn create(&self, ctx: &Context) -> anyhow::Result<Arc<dyn HttpServerAdapter>> {
        (self.create)(ctx.clone()).await
    }
}

impl Injectable for HttpServerFactory {}

impl fmt::Debug for HttpServerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HttpServerFactory")
    }
}

/// 컨텍스트에 등록된 HTTP 서버 소스
#[derive(Clone)]
pub enum HttpServerSource {
    /// 미리 만들어진 어댑터
    Adapter(Arc<dyn HttpServerAdapter>),
    /// 지연 생성 팩토리
    Factory(HttpServerFactory),
}

impl fmt::Debug for HttpServerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adapter(_) => f.write_str("HttpServerSource::Adapter"),
            Self::Factory(_) => f.write_str("HttpServerSource::Factory"),
        }
    }
}
