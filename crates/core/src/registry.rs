//! DI 레지스트리 — 토큰별 프로바이더 등록과 싱글턴 인스턴스 해석
//!
//! [`Registry`]는 [`Token`] → [`Provider`] 매핑과 인스턴스 캐시를 보관합니다.
//! 같은 토큰에 대한 해석은 프로세스 수명 동안 최대 한 번만 수행되며,
//! 동시에 들어온 해석 요청은 하나의 생성 작업을 공유합니다(single-flight).
//!
//! # 사용 예시
//! ```ignore
//! let registry = ctx.registry();
//! let token = registry.register(Provider::class::<DatabaseHelper>());
//! let helper = registry.resolve_as::<DatabaseHelper>(&ctx, &token).await?;
//! ```

use std::any::TypeId;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OnceCell;

use crate::component::{BoxFuture, Constructible, Injectable, Instance, downcast};
use crate::context::Context;
use crate::error::{OrquestraError, ProviderError};

// ─── Token ───────────────────────────────────────────────────────────

/// 프로바이더 식별자
///
/// 문자열 이름 또는 Rust 타입으로 구분합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    /// 이름 기반 토큰
    Named(Cow<'static, str>),
    /// 타입 기반 토큰 (클래스 프로바이더의 기본 토큰)
    Type {
        /// 타입 ID
        id: TypeId,
        /// 표시용 타입 이름
        name: &'static str,
    },
}

impl Token {
    /// 이름 기반 토큰을 생성합니다.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Named(name.into())
    }

    /// 타입 기반 토큰을 생성합니다.
    pub fn of<T: 'static>() -> Self {
        Self::Type {
            id: TypeId::of::<T>(),
            name: short_type_name(std::any::type_name::<T>()),
        }
    }

    /// 표시용 이름
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Type { name, .. } => name,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&'static str> for Token {
    fn from(name: &'static str) -> Self {
        Self::named(name)
    }
}

impl From<String> for Token {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

/// `my_crate::helpers::DatabaseHelper` → `DatabaseHelper`
///
/// 제네릭 인자가 있는 경우 전체 이름을 유지합니다.
fn short_type_name(full: &'static str) -> &'static str {
    if full.contains('<') {
        return full;
    }
    full.rsplit("::").next().unwrap_or(full)
}

// ─── Provider ────────────────────────────────────────────────────────

/// 컨텍스트로 인스턴스를 생성하는 함수 (클래스 프로바이더)
pub type ClassFn = Arc<dyn Fn(&Context) -> Instance + Send + Sync>;

/// 컨텍스트로 인스턴스를 비동기 생성하는 함수 (팩토리 프로바이더)
pub type FactoryFn =
    Arc<dyn Fn(Context) -> BoxFuture<'static, anyhow::Result<Instance>> + Send + Sync>;

/// 프로바이더 종류
#[derive(Clone)]
pub enum ProviderKind {
    /// 컨텍스트로 동기 생성
    Class(ClassFn),
    /// 컨텍스트로 비동기 생성
    Factory(FactoryFn),
    /// 미리 만들어진 인스턴스
    Value(Instance),
}

impl ProviderKind {
    /// 종류 이름 (로깅용)
    pub fn label(&self) -> &'static str {
        match self {
            Self::Class(_) => "class",
            Self::Factory(_) => "factory",
            Self::Value(_) => "value",
        }
    }
}

/// 인스턴스 생성 레시피
#[derive(Clone)]
pub struct Provider {
    token: Token,
    kind: ProviderKind,
}

impl Provider {
    /// 타입 자신을 토큰으로 하는 클래스 프로바이더
    pub fn class<T: Constructible>() -> Self {
        Self::class_as::<T>(Token::of::<T>())
    }

    /// 지정한 토큰으로 등록되는 클래스 프로바이더
    pub fn class_as<T: Constructible>(token: impl Into<Token>) -> Self {
        Self {
            token: token.into(),
            kind: ProviderKind::Class(Arc::new(|ctx: &Context| -> Instance {
                Arc::new(T::construct(ctx))
            })),
        }
    }

    /// 비동기 팩토리 프로바이더
    pub fn factory<T, F, Fut>(token: impl Into<Token>, factory: F) -> Self
    where
        T: Injectable,
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let factory: FactoryFn = Arc::new(move |ctx: Context| {
            let fut = factory(ctx);
            Box::pin(async move {
                let instance = fut.await?;
                Ok(Arc::new(instance) as Instance)
            }) as BoxFuture<'static, anyhow::Result<Instance>>
        });
        Self {
            token: token.into(),
            kind: ProviderKind::Factory(factory),
        }
    }

    /// 미리 만들어진 인스턴스를 그대로 제공하는 프로바이더
    pub fn value<T: Injectable>(token: impl Into<Token>, value: T) -> Self {
        Self::shared(token, Arc::new(value))
    }

    /// 이미 `Arc`로 공유 중인 인스턴스를 제공하는 프로바이더
    pub fn shared<T: Injectable>(token: impl Into<Token>, value: Arc<T>) -> Self {
        Self {
            token: token.into(),
            kind: ProviderKind::Value(value),
        }
    }

    /// 원시 구성 요소로 프로바이더를 만듭니다.
    pub fn from_parts(token: Token, kind: ProviderKind) -> Self {
        Self { token, kind }
    }

    /// 프로바이더 토큰
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// 프로바이더 종류
    pub fn kind(&self) -> &ProviderKind {
        &self.kind
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("token", &self.token)
            .field("kind", &self.kind.label())
            .finish()
    }
}

// ─── Registry ────────────────────────────────────────────────────────

type Slot = Arc<OnceCell<Instance>>;

/// DI 레지스트리
///
/// 프로바이더 맵은 등록 단계에서만 변경되고, 인스턴스 슬롯은 해석 시 채워집니다.
/// 토큰마다 하나의 `OnceCell` 슬롯을 두어 동시 해석에도 인스턴스가 하나만 생성됩니다.
#[derive(Default)]
pub struct Registry {
    providers: Mutex<HashMap<Token, Provider>>,
    slots: Mutex<HashMap<Token, Slot>>,
}

impl Registry {
    /// 빈 레지스트리를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 프로바이더를 등록하고 토큰을 반환합니다.
    ///
    /// 같은 토큰으로 다시 등록하면 프로바이더를 덮어씁니다.
    /// 값 프로바이더는 즉시 캐시에 들어가므로 [`get`](Self::get)으로 바로 조회됩니다.
    pub fn register(&self, provider: impl Into<Provider>) -> Token {
        let provider = provider.into();
        let token = provider.token.clone();

        if let ProviderKind::Value(instance) = &provider.kind {
            let slot = Arc::new(OnceCell::new_with(Some(Arc::clone(instance))));
            lock(&self.slots).insert(token.clone(), slot);
            tracing::debug!(token = %token, "registered value provider");
        } else {
            lock(&self.slots).remove(&token);
            tracing::debug!(token = %token, kind = provider.kind.label(), "registered provider");
        }

        lock(&self.providers).insert(token.clone(), provider);
        token
    }

    /// 타입 자신을 토큰으로 하는 클래스 프로바이더를 등록합니다.
    pub fn register_class<T: Constructible>(&self) -> Token {
        self.register(Provider::class::<T>())
    }

    /// 캐시된 인스턴스를 조회합니다. 해석을 트리거하지 않습니다.
    pub fn get(&self, token: &Token) -> Option<Instance> {
        let slot = lock(&self.slots).get(token).cloned()?;
        slot.get().cloned()
    }

    /// 캐시된 인스턴스를 구체 타입으로 조회합니다.
    pub fn get_as<T: Injectable>(&self, token: &Token) -> Option<Arc<T>> {
        self.get(token).and_then(downcast::<T>)
    }

    /// 토큰에 프로바이더가 등록되어 있는지 확인합니다.
    pub fn contains(&self, token: &Token) -> bool {
        lock(&self.providers).contains_key(token)
    }

    /// 등록된 프로바이더 수
    pub fn len(&self) -> usize {
        lock(&self.providers).len()
    }

    /// 등록된 프로바이더가 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        lock(&self.providers).is_empty()
    }

    /// 토큰을 해석하여 싱글턴 인스턴스를 반환합니다.
    ///
    /// 캐시에 있으면 그대로 반환하고, 없으면 프로바이더 종류에 따라 생성한 뒤 캐시합니다.
    /// 생성이 실패하면 아무것도 캐시하지 않으므로 다음 호출에서 다시 시도합니다.
    pub async fn resolve(&self, ctx: &Context, token: &Token) -> Result<Instance, OrquestraError> {
        let slot = {
            let mut slots = lock(&self.slots);
            match slots.get(token) {
                Some(slot) => Arc::clone(slot),
                None => {
                    if !self.contains(token) {
                        tracing::error!(token = %token, "provider not found");
                        return Err(ProviderError::NotFound {
                            token: token.to_string(),
                        }
                        .into());
                    }
                    let slot: Slot = Arc::new(OnceCell::new());
                    slots.insert(token.clone(), Arc::clone(&slot));
                    slot
                }
            }
        };

        if let Some(instance) = slot.get() {
            tracing::trace!(token = %token, "returning cached instance");
            return Ok(Arc::clone(instance));
        }

        let instance = slot
            .get_or_try_init(|| self.instantiate(ctx, token))
            .await?;
        Ok(Arc::clone(instance))
    }

    /// 토큰을 해석하여 구체 타입으로 반환합니다.
    pub async fn resolve_as<T: Injectable>(
        &self,
        ctx: &Context,
        token: &Token,
    ) -> Result<Arc<T>, OrquestraError> {
        let instance = self.resolve(ctx, token).await?;
        downcast::<T>(instance).ok_or_else(|| {
            ProviderError::TypeMismatch {
                token: token.to_string(),
                expected: std::any::type_name::<T>(),
            }
            .into()
        })
    }

    async fn instantiate(&self, ctx: &Context, token: &Token) -> Result<Instance, OrquestraError> {
        let kind = lock(&self.providers)
            .get(token)
            .map(|p| p.kind.clone())
            .ok_or_else(|| ProviderError::NotFound {
                token: token.to_string(),
            })?;

        tracing::debug!(token = %token, kind = kind.label(), "resolving provider");
        let instance = match kind {
            ProviderKind::Class(construct) => construct(ctx),
            ProviderKind::Factory(factory) => {
                factory(ctx.clone())
                    .await
                    .map_err(|e| ProviderError::Instantiation {
                        token: token.to_string(),
                        source: e.into(),
                    })?
            }
            ProviderKind::Value(instance) => instance,
        };
        tracing::debug!(token = %token, "resolved provider");
        Ok(instance)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("providers", &self.len())
            .finish()
    }
}

/// 뮤텍스 poison은 맵 구조를 깨뜨리지 않으므로 내부 값을 그대로 사용합니다.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
