//! Dynamic interface proxies
//!
//! An interface set is turned into a [`ProxyType`] once (a flattened
//! dispatch table whose every slot forwards to a handler) and instantiated
//! cheaply per script target through a [`ProxyHandle`].

mod bridge;
mod instance;
mod platform;
mod types;

pub use bridge::{DynamicProxyBridge, ProxyHandle};
pub use instance::{DispatchHandler, ProxyInstance, WeakProxy};
pub use platform::{ProxyPlatform, VtablePlatform, MAX_PROXY_INTERFACES};
pub use types::{DispatchTable, HandlerConstructor, ProxyType};
