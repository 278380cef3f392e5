#![doc = include_str!("../README.md")]

pub mod component;
pub mod config;
pub mod container;
pub mod context;
pub mod error;
pub mod http;
pub mod macros;
pub mod registry;
pub mod step_context;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{
    BoxError, ConfigError, EventLogError, LifecycleError, MacroError, OrquestraError,
    ProviderError, ScenarioError,
};

// 설정
pub use config::OrquestraConfig;

// 컴포넌트 계약
pub use component::{
    BoxFuture, Constructible, DynInjectable, Helper, Injectable, Instance, Plugin, Service,
    downcast,
};

// DI
pub use context::{Context, ContextBuilder};
pub use registry::{Provider, ProviderKind, Registry, Token};

// 컨테이너
pub use container::{
    ContainerProvider, DynContainer, InfraContainer, OrquestraContainer, StartedContainer,
};

// HTTP
pub use http::{
    CloseHandler, HTTP_SERVER_FACTORY_TOKEN, HTTP_SERVER_TOKEN, HttpMethod, HttpServerAdapter,
    HttpServerBase, HttpServerFactory, HttpServerSource, MethodFilter, OrquestraHttpServer,
    PreRequestHook, TestClient,
};

// 매크로
pub use macros::{DynMacro, MacroRegistry, OrquestraMacro};
pub use step_context::{RESULT_KEY, StepContext};
