//! Script-to-host interface bridge
//!
//! `DynamicProxyBridge` builds reusable handles for interface sets and turns
//! them into host objects whose every method call is forwarded to an engine
//! adapter. When the adapter has no behavior for a method the call still
//! completes: a warning is reported and the declared return type's default
//! is returned.

use std::sync::Arc;

use crate::access::ReflectedMember;
use crate::config::{BridgeConfig, VariadicPolicy};
use crate::descriptor::{ClassDescriptor, InterfaceDescriptor, LoaderDomain, MethodDescriptor};
use crate::engine::{
    undefined_method_message, BindingSlot, CallTarget, CompositeAdapter, CompositePayload,
    EngineServices, InterfaceAdapter, Invocation,
};
use crate::error::{BridgeError, BridgeResult, InstantiationError, ProxyConstructionError, ScriptError};
use crate::proxy::instance::{DispatchHandler, ProxyInstance};
use crate::proxy::platform::{ProxyPlatform, VtablePlatform};
use crate::proxy::types::ProxyType;
use crate::value::{HostValue, OpaqueRef};

/// Reusable recipe for instantiating proxies of one interface set
#[derive(Clone)]
pub struct ProxyHandle {
    platform: Arc<dyn ProxyPlatform>,
    ty: Arc<ProxyType>,
}

impl ProxyHandle {
    /// The synthesized proxy type
    pub fn proxy_type(&self) -> &Arc<ProxyType> {
        &self.ty
    }
}

impl std::fmt::Debug for ProxyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyHandle")
            .field("type", &self.ty.name())
            .field("interfaces", &self.ty.interfaces().len())
            .finish()
    }
}

/// Shared NotSupported handling for both handler flavors
struct Fallback {
    services: EngineServices,
    warn: bool,
}

impl Fallback {
    fn resolve(&self, method: &MethodDescriptor, outcome: Invocation) -> Result<HostValue, ScriptError> {
        match outcome {
            Invocation::Value(value) => Ok(value),
            Invocation::Error(err) => Err(err),
            Invocation::NotSupported => {
                if self.warn {
                    self.services
                        .diagnostics
                        .report_warning(&undefined_method_message(&method.name));
                }
                if method.return_type.is_void() {
                    Ok(HostValue::Null)
                } else {
                    self.services.coercion.coerce_null(&method.return_type)
                }
            }
        }
    }
}

struct InterfaceHandler {
    call: CallTarget,
    adapter: Arc<dyn InterfaceAdapter>,
    fallback: Fallback,
}

impl DispatchHandler for InterfaceHandler {
    fn invoke(
        &self,
        _proxy: &ProxyInstance,
        method: &MethodDescriptor,
        args: &[HostValue],
    ) -> Result<HostValue, ScriptError> {
        let outcome = self.adapter.invoke(
            &self.call.factory,
            &self.call.target,
            &self.call.scope,
            method,
            args,
        );
        self.fallback.resolve(method, outcome)
    }
}

struct CompositeHandler {
    call: CallTarget,
    adapter: Arc<dyn CompositeAdapter>,
    payload: CompositePayload,
    fallback: Fallback,
}

impl DispatchHandler for CompositeHandler {
    fn invoke(
        &self,
        _proxy: &ProxyInstance,
        method: &MethodDescriptor,
        args: &[HostValue],
    ) -> Result<HostValue, ScriptError> {
        let outcome = self.adapter.invoke(
            &self.call.factory,
            &self.call.target,
            &self.call.scope,
            method,
            args,
            &self.payload,
        );
        self.fallback.resolve(method, outcome)
    }
}

/// Bridge between script objects and host interfaces
pub struct DynamicProxyBridge {
    platform: Arc<dyn ProxyPlatform>,
    services: EngineServices,
    config: BridgeConfig,
}

impl DynamicProxyBridge {
    /// Create a bridge on the default platform.
    ///
    /// With `cache_proxy_types` on, the process-wide platform is used so
    /// identical interface sets share one proxy type.
    pub fn new(services: EngineServices, config: BridgeConfig) -> Self {
        let platform: Arc<dyn ProxyPlatform> = if config.cache_proxy_types {
            VtablePlatform::shared()
        } else {
            Arc::new(VtablePlatform::uncached())
        };
        Self::with_platform(platform, services, config)
    }

    /// Create a bridge on an explicit platform
    pub fn with_platform(
        platform: Arc<dyn ProxyPlatform>,
        services: EngineServices,
        config: BridgeConfig,
    ) -> Self {
        Self {
            platform,
            services,
            config,
        }
    }

    /// Bridge configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Build a handle for `interfaces`, defined in the first interface's domain
    pub fn build_proxy_handle(
        &self,
        interfaces: &[Arc<InterfaceDescriptor>],
    ) -> BridgeResult<ProxyHandle> {
        let first = interfaces
            .first()
            .ok_or(ProxyConstructionError::EmptyInterfaceSet)?;
        let domain = first.domain().clone();
        self.build_proxy_handle_in(&domain, interfaces)
    }

    /// Build a handle for `interfaces`, defined in `domain`
    pub fn build_proxy_handle_in(
        &self,
        domain: &LoaderDomain,
        interfaces: &[Arc<InterfaceDescriptor>],
    ) -> BridgeResult<ProxyHandle> {
        let ty = self.platform.proxy_type(domain, interfaces)?;
        if ty.handler_constructor().is_none() {
            return Err(BridgeError::illegal_state(format!(
                "{} has no handler constructor",
                ty.name()
            )));
        }
        Ok(ProxyHandle {
            platform: Arc::clone(&self.platform),
            ty,
        })
    }

    /// Build a handle proxying every interface `class` implements, defined
    /// in the class's domain.
    ///
    /// A class that implements no interface has nothing to dispatch and is
    /// rejected with [`ProxyConstructionError::EmptyInterfaceSet`].
    pub fn build_subclass_handle(&self, class: &ClassDescriptor) -> BridgeResult<ProxyHandle> {
        self.build_proxy_handle_in(&class.domain, &class.interfaces)
    }

    /// Instantiate a proxy forwarding every call to `adapter`
    pub fn instantiate_proxy(
        &self,
        handle: &ProxyHandle,
        factory: OpaqueRef,
        adapter: Arc<dyn InterfaceAdapter>,
        target: OpaqueRef,
        scope: OpaqueRef,
    ) -> BridgeResult<ProxyInstance> {
        let handler = InterfaceHandler {
            call: CallTarget {
                factory,
                target,
                scope,
            },
            adapter,
            fallback: self.fallback(),
        };
        instantiate(handle, Arc::new(handler))
    }

    /// Instantiate a composite proxy. `owner` and `slots` reach the adapter
    /// unchanged on every call.
    #[allow(clippy::too_many_arguments)]
    pub fn instantiate_composite_proxy(
        &self,
        handle: &ProxyHandle,
        factory: OpaqueRef,
        adapter: Arc<dyn CompositeAdapter>,
        target: OpaqueRef,
        scope: OpaqueRef,
        owner: OpaqueRef,
        slots: Vec<BindingSlot>,
    ) -> BridgeResult<ProxyInstance> {
        let handler = CompositeHandler {
            call: CallTarget {
                factory,
                target,
                scope,
            },
            adapter,
            payload: CompositePayload {
                owner,
                slots: slots.into(),
            },
            fallback: self.fallback(),
        };
        instantiate(handle, Arc::new(handler))
    }

    /// Whether `member` is reported as variadic
    pub fn is_variadic(&self, member: &dyn ReflectedMember) -> bool {
        match self.config.variadic {
            VariadicPolicy::AlwaysFalse => false,
            VariadicPolicy::Declared => member.is_variadic(),
        }
    }

    fn fallback(&self) -> Fallback {
        Fallback {
            services: self.services.clone(),
            warn: self.config.warn_unsupported,
        }
    }
}

impl Default for DynamicProxyBridge {
    fn default() -> Self {
        Self::new(EngineServices::default(), BridgeConfig::default())
    }
}

impl std::fmt::Debug for DynamicProxyBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicProxyBridge")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn instantiate(handle: &ProxyHandle, handler: Arc<dyn DispatchHandler>) -> BridgeResult<ProxyInstance> {
    handle
        .platform
        .instantiate(&handle.ty, handler)
        .map_err(|err| match err {
            InstantiationError::InvocationTarget(cause) => BridgeError::Script(cause),
            other => BridgeError::IllegalState {
                message: format!("cannot instantiate {}", handle.ty.name()),
                source: Some(other),
            },
        })
}
