//! 컴포넌트 계약 — 헬퍼, 플러그인, 서비스, 컨테이너가 공유하는 생명주기 능력
//!
//! [`Injectable`]은 선택적인 `on_start`/`on_teardown` 훅을 제공하며, 기본 구현은
//! 아무것도 하지 않습니다. 오케스트레이터는 훅 존재 여부를 검사하지 않고
//! 항상 호출합니다.
//!
//! # 생명주기
//! ```text
//! register → resolve (한 번, 싱글턴) → on_start() → ... → on_teardown()
//! ```

use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;

/// dyn-compatible trait에서 사용하는 boxed future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// DI 레지스트리가 보관하는 인스턴스
pub type Instance = Arc<dyn DynInjectable>;

/// 관리되는 컴포넌트가 구현하는 생명주기 trait
///
/// # 구현 예시
/// ```ignore
/// struct DatabaseHelper {
///     ctx: Context,
/// }
///
/// impl Injectable for DatabaseHelper {
///     async fn on_start(&self) -> anyhow::Result<()> {
///         // 연결 풀 준비
///         Ok(())
///     }
/// }
///
/// impl Constructible for DatabaseHelper {
///     fn construct(ctx: &Context) -> Self {
///         Self { ctx: ctx.clone() }
///     }
/// }
/// ```
pub trait Injectable: Send + Sync + 'static {
    /// 컴포넌트 시작 훅
    fn on_start(&self) -> impl Future<Output = anyhow::Result<()>> + Send {
        async { Ok(()) }
    }

    /// 컴포넌트 정리 훅
    fn on_teardown(&self) -> impl Future<Output = anyhow::Result<()>> + Send {
        async { Ok(()) }
    }
}

/// 클래스 프로바이더로 생성 가능한 컴포넌트
///
/// 공유 [`Context`]를 받아 인스턴스를 만듭니다. 협력 컴포넌트가 필요하면
/// 컨텍스트를 보관했다가 훅 안에서 `resolve`합니다.
pub trait Constructible: Injectable + Sized {
    /// 컨텍스트로부터 인스턴스를 생성합니다.
    fn construct(ctx: &Context) -> Self;
}

/// 헬퍼 역할 (환경, 데이터 준비 등)
pub trait Helper: Injectable {}
impl<T: Injectable> Helper for T {}

/// 플러그인 역할 (외부 시스템 연동)
pub trait Plugin: Injectable {}
impl<T: Injectable> Plugin for T {}

/// 서비스 역할 (테스트가 직접 사용하는 협력 객체)
pub trait Service: Injectable {}
impl<T: Injectable> Service for T {}

// ─── DynInjectable ───────────────────────────────────────────────────

/// dyn-compatible 컴포넌트 trait
///
/// `Injectable`은 RPITIT를 사용하므로 `dyn Injectable`이 불가합니다.
/// `DynInjectable`은 `BoxFuture`를 반환하여 레지스트리가
/// `Arc<dyn DynInjectable>`로 이질적인 컴포넌트를 보관할 수 있게 합니다.
pub trait DynInjectable: Send + Sync + 'static {
    /// 컴포넌트 시작 훅
    fn on_start(&self) -> BoxFuture<'_, anyhow::Result<()>>;

    /// 컴포넌트 정리 훅
    fn on_teardown(&self) -> BoxFuture<'_, anyhow::Result<()>>;

    /// 구체 타입 이름 (로깅용)
    fn type_name(&self) -> &'static str;

    /// 타입 다운캐스트용 `Any` 변환
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Injectable을 구현한 타입은 자동으로 DynInjectable도 구현됩니다.
impl<T: Injectable> DynInjectable for T {
    fn on_start(&self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(Injectable::on_start(self))
    }

    fn on_teardown(&self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(Injectable::on_teardown(self))
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// 인스턴스를 구체 타입으로 다운캐스트합니다.
pub fn downcast<T: Injectable>(instance: Instance) -> Option<Arc<T>> {
    instance.into_any().downcast::<T>().ok()
}
