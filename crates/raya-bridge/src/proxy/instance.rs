//! Live proxy instances
//!
//! A `ProxyInstance` is what the host holds. Every method call on it is
//! resolved through the proxy type's dispatch table and handed to the
//! instance's `DispatchHandler`. The instance is released when the last
//! clone is dropped; there is no explicit close.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::descriptor::MethodDescriptor;
use crate::error::{BridgeError, BridgeResult, ScriptError};
use crate::proxy::types::ProxyType;
use crate::value::HostValue;

/// Uniform body of every proxy method slot
pub trait DispatchHandler: Send + Sync {
    /// Handle a call of `method` on `proxy`
    fn invoke(
        &self,
        proxy: &ProxyInstance,
        method: &MethodDescriptor,
        args: &[HostValue],
    ) -> Result<HostValue, ScriptError>;
}

impl<F> DispatchHandler for F
where
    F: Fn(&ProxyInstance, &MethodDescriptor, &[HostValue]) -> Result<HostValue, ScriptError>
        + Send
        + Sync,
{
    fn invoke(
        &self,
        proxy: &ProxyInstance,
        method: &MethodDescriptor,
        args: &[HostValue],
    ) -> Result<HostValue, ScriptError> {
        self(proxy, method, args)
    }
}

struct ProxyInner {
    id: u64,
    ty: Arc<ProxyType>,
    handler: Arc<dyn DispatchHandler>,
}

/// Host-visible proxy object
#[derive(Clone)]
pub struct ProxyInstance {
    inner: Arc<ProxyInner>,
}

impl ProxyInstance {
    /// Bind a handler to a proxy type. Called by platforms.
    pub fn new(ty: Arc<ProxyType>, handler: Arc<dyn DispatchHandler>) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self {
            inner: Arc::new(ProxyInner {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                ty,
                handler,
            }),
        }
    }

    /// Invoke an interface method
    pub fn invoke(&self, method: &MethodDescriptor, args: &[HostValue]) -> BridgeResult<HostValue> {
        let ty = &self.inner.ty;
        let slot = ty
            .table()
            .resolve(&method.key())
            .ok_or_else(|| BridgeError::NoSuchMethod {
                proxy: ty.name().to_string(),
                method: method.signature(),
            })?;

        check_arity(slot, args.len())?;

        tracing::trace!(proxy = ty.name(), method = %slot, "dispatch");
        self.inner
            .handler
            .invoke(self, slot, args)
            .map_err(BridgeError::Script)
    }

    /// Invoke the first method named `name` declared by `interface`
    pub fn invoke_by_name(
        &self,
        interface: &str,
        name: &str,
        args: &[HostValue],
    ) -> BridgeResult<HostValue> {
        let method = self
            .inner
            .ty
            .interfaces()
            .iter()
            .find(|i| i.name() == interface)
            .and_then(|i| i.find_method(name))
            .cloned()
            .ok_or_else(|| BridgeError::NoSuchMethod {
                proxy: self.inner.ty.name().to_string(),
                method: format!("{}.{}", interface, name),
            })?;
        self.invoke(&method, args)
    }

    /// Whether this proxy implements the named interface
    pub fn implements(&self, interface: &str) -> bool {
        self.inner.ty.implements(interface)
    }

    /// The proxy's type
    pub fn proxy_type(&self) -> &Arc<ProxyType> {
        &self.inner.ty
    }

    /// Unique instance ID
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Whether two references point at the same instance
    pub fn ptr_eq(&self, other: &ProxyInstance) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Non-owning reference that observes release
    pub fn downgrade(&self) -> WeakProxy {
        WeakProxy {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

fn check_arity(method: &MethodDescriptor, got: usize) -> BridgeResult<()> {
    let declared = method.params.len();
    let ok = if method.variadic {
        got + 1 >= declared
    } else {
        got == declared
    };
    if ok {
        Ok(())
    } else {
        Err(BridgeError::ArityMismatch {
            method: method.signature(),
            expected: declared,
            got,
        })
    }
}

impl std::fmt::Debug for ProxyInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyInstance")
            .field("id", &self.inner.id)
            .field("type", &self.inner.ty.name())
            .finish()
    }
}

/// Weak reference to a proxy instance
#[derive(Clone)]
pub struct WeakProxy {
    inner: Weak<ProxyInner>,
}

impl WeakProxy {
    /// Get the instance back if it has not been released
    pub fn upgrade(&self) -> Option<ProxyInstance> {
        self.inner.upgrade().map(|inner| ProxyInstance { inner })
    }

    /// Whether the host has dropped every strong reference
    pub fn is_released(&self) -> bool {
        self.inner.strong_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{InterfaceDescriptor, LoaderDomain};
    use crate::proxy::types::{DispatchTable, HandlerConstructor};
    use crate::value::HostType;

    fn proxy_type() -> Arc<ProxyType> {
        let d = LoaderDomain::root("app");
        let iface = InterfaceDescriptor::new("Greeter", &d)
            .method("greet", &[HostType::String], HostType::String)
            .variadic_method("log", &[HostType::String, HostType::array(HostType::String)], HostType::Void)
            .build();
        let table = DispatchTable::build(&[iface.clone()]).unwrap();
        Arc::new(ProxyType::define(&d, &[iface], table, Some(HandlerConstructor::default())))
    }

    fn echo_handler() -> Arc<dyn DispatchHandler> {
        Arc::new(|_: &ProxyInstance, method: &MethodDescriptor, args: &[HostValue]| -> Result<HostValue, ScriptError> {
            Ok(HostValue::string(format!("{}:{}", method.name, args.len())))
        })
    }

    #[test]
    fn test_invoke_by_name() {
        let proxy = ProxyInstance::new(proxy_type(), echo_handler());
        let result = proxy.invoke_by_name("Greeter", "greet", &[HostValue::from("bob")]).unwrap();
        assert_eq!(result.as_str(), Some("greet:1"));
    }

    #[test]
    fn test_unknown_method() {
        let proxy = ProxyInstance::new(proxy_type(), echo_handler());
        let err = proxy.invoke_by_name("Greeter", "wave", &[]).unwrap_err();
        assert!(matches!(err, BridgeError::NoSuchMethod { .. }));

        let foreign = MethodDescriptor::new("Other", "greet", HostType::String).param(HostType::Int);
        assert!(matches!(proxy.invoke(&foreign, &[HostValue::Int(1)]), Err(BridgeError::NoSuchMethod { .. })));
    }

    #[test]
    fn test_arity_checks() {
        let proxy = ProxyInstance::new(proxy_type(), echo_handler());
        let err = proxy.invoke_by_name("Greeter", "greet", &[]).unwrap_err();
        assert!(matches!(err, BridgeError::ArityMismatch { expected: 1, got: 0, .. }));

        // Variadic tail may be empty or long
        assert!(proxy.invoke_by_name("Greeter", "log", &[HostValue::from("a")]).is_ok());
        let many = vec![HostValue::from("a"); 4];
        assert!(proxy.invoke_by_name("Greeter", "log", &many).is_ok());
    }

    #[test]
    fn test_handler_error_becomes_script_error() {
        let handler: Arc<dyn DispatchHandler> = Arc::new(
            |_: &ProxyInstance, _: &MethodDescriptor, _: &[HostValue]| -> Result<HostValue, ScriptError> {
                Err(ScriptError::new("thrown"))
            },
        );
        let proxy = ProxyInstance::new(proxy_type(), handler);
        let err = proxy.invoke_by_name("Greeter", "greet", &[HostValue::from("x")]).unwrap_err();
        assert!(matches!(err, BridgeError::Script(e) if e.message() == "thrown"));
    }

    #[test]
    fn test_release() {
        let proxy = ProxyInstance::new(proxy_type(), echo_handler());
        let clone = proxy.clone();
        let weak = proxy.downgrade();

        assert!(proxy.ptr_eq(&clone));
        drop(proxy);
        assert!(!weak.is_released());
        assert!(weak.upgrade().is_some());

        drop(clone);
        assert!(weak.is_released());
        assert!(weak.upgrade().is_none());
    }
}
