//! Raya Host Bridge
//!
//! Plumbing that lets the Raya engine cooperate with its host platform:
//! - **Context**: per-thread execution context cell (`context` module)
//! - **Access**: best-effort access elevation of reflected host members
//!   under an [`AccessPolicy`] (`access` module)
//! - **Proxy**: host objects implementing host interfaces whose calls are
//!   forwarded into script code (`proxy` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use raya_bridge::{DynamicProxyBridge, InterfaceDescriptor, LoaderDomain, HostType};
//!
//! let domain = LoaderDomain::root("app");
//! let runnable = InterfaceDescriptor::new("Runnable", &domain)
//!     .method("run", &[], HostType::Void)
//!     .build();
//!
//! let bridge = DynamicProxyBridge::default();
//! let handle = bridge.build_proxy_handle(&[runnable])?;
//! let proxy = bridge.instantiate_proxy(&handle, factory, adapter, target, scope)?;
//! proxy.invoke_by_name("Runnable", "run", &[])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Reflected members and access elevation
pub mod access;

/// Bridge configuration
pub mod config;

/// Thread-local execution context cell
pub mod context;

/// Host type descriptors
pub mod descriptor;

/// Engine-side collaborators
pub mod engine;

/// Error types
pub mod error;

/// Dynamic interface proxies
pub mod proxy;

/// Host values and types
pub mod value;

pub use access::{
    try_elevate_access, AccessPermission, AccessPolicy, Accessible, MemberHandle, MemberKind,
    ReflectedMember, TypePermissionRule, Visibility,
};
pub use config::{AccessConfig, BridgeConfig, VariadicPolicy};
pub use context::{
    get_context_cell, read_context, set_thread_domain, thread_domain, write_context, CellHandle,
    ContextSlot,
};
pub use descriptor::{
    ClassDescriptor, DescriptorKind, DomainId, InterfaceDescriptor, InterfaceId, LoaderDomain,
    MethodDescriptor, MethodKey,
};
pub use engine::{
    undefined_method_message, BindingSlot, CallTarget, CompositeAdapter, CompositePayload,
    DefaultCoercion, DiagnosticSink, EngineServices, InterfaceAdapter, Invocation, NullCoercion,
    StrictCoercion, TracingSink,
};
pub use error::{
    AccessDenied, BridgeError, BridgeResult, ConfigError, InstantiationError,
    ProxyConstructionError, ScriptError,
};
pub use proxy::{
    DispatchHandler, DynamicProxyBridge, ProxyHandle, ProxyInstance, ProxyPlatform, ProxyType,
    VtablePlatform, WeakProxy,
};
pub use value::{HostType, HostValue, OpaqueRef};
