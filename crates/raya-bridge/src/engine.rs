//! Engine-side collaborators of the proxy bridge
//!
//! The bridge does not route calls, convert values or print warnings itself.
//! The embedding engine supplies these capabilities through the traits in
//! this module:
//! - [`InterfaceAdapter`] / [`CompositeAdapter`]: resolve a forwarded call
//!   to script behavior or report [`Invocation::NotSupported`]
//! - [`NullCoercion`]: the engine's conversion of "no value" to a host type
//! - [`DiagnosticSink`]: fire-and-forget warnings

use std::sync::Arc;

use crate::descriptor::MethodDescriptor;
use crate::error::ScriptError;
use crate::value::{HostType, HostValue, OpaqueRef};

// ============================================================================
// Invocation outcome
// ============================================================================

/// Outcome of forwarding one call into the engine
#[derive(Debug)]
pub enum Invocation {
    /// Call handled, returned a host-compatible value
    Value(HostValue),
    /// No script-side behavior matches this method
    NotSupported,
    /// Script code raised an error
    Error(ScriptError),
}

impl Invocation {
    /// Create a successful null result
    #[inline]
    pub fn null() -> Self {
        Self::Value(HostValue::Null)
    }

    /// Wrap a value
    #[inline]
    pub fn value(value: impl Into<HostValue>) -> Self {
        Self::Value(value.into())
    }

    /// Create an error outcome
    #[inline]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ScriptError::new(message))
    }
}

// ============================================================================
// Adapters
// ============================================================================

/// Call context captured by a proxy instance at construction
#[derive(Clone)]
pub struct CallTarget {
    /// Engine factory that owns the target
    pub factory: OpaqueRef,
    /// Script callable the proxy forwards to
    pub target: OpaqueRef,
    /// Top-level scope the target runs in
    pub scope: OpaqueRef,
}

impl std::fmt::Debug for CallTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallTarget")
            .field("factory", &Arc::as_ptr(&self.factory))
            .field("target", &Arc::as_ptr(&self.target))
            .field("scope", &Arc::as_ptr(&self.scope))
            .finish()
    }
}

/// Routes a forwarded interface call into script code.
///
/// Must return [`Invocation::NotSupported`] rather than an error when no
/// script-side handler matches the method.
pub trait InterfaceAdapter: Send + Sync {
    /// Forward one call
    fn invoke(
        &self,
        factory: &OpaqueRef,
        target: &OpaqueRef,
        scope: &OpaqueRef,
        method: &MethodDescriptor,
        args: &[HostValue],
    ) -> Invocation;
}

/// Named binding exposed by a composite proxy
#[derive(Debug, Clone, PartialEq)]
pub struct BindingSlot {
    /// Binding name
    pub name: Arc<str>,
    /// Current value
    pub value: HostValue,
}

impl BindingSlot {
    /// Create a binding slot
    pub fn new(name: impl Into<Arc<str>>, value: HostValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Auxiliary state carried by a composite proxy.
///
/// The bridge passes this through to the adapter unchanged on every call and
/// never interprets it.
#[derive(Clone)]
pub struct CompositePayload {
    /// Owning reference
    pub owner: OpaqueRef,
    /// Named bindings, in order
    pub slots: Arc<[BindingSlot]>,
}

impl std::fmt::Debug for CompositePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositePayload")
            .field("owner", &Arc::as_ptr(&self.owner))
            .field("slots", &self.slots)
            .finish()
    }
}

/// Routes a forwarded call for a composite proxy (native subclass mimic
/// plus script-side bindings)
pub trait CompositeAdapter: Send + Sync {
    /// Forward one call together with the composite payload
    fn invoke(
        &self,
        factory: &OpaqueRef,
        target: &OpaqueRef,
        scope: &OpaqueRef,
        method: &MethodDescriptor,
        args: &[HostValue],
        payload: &CompositePayload,
    ) -> Invocation;
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Non-fatal diagnostic sink. Must not block and must not fail visibly.
pub trait DiagnosticSink: Send + Sync {
    /// Report a warning
    fn report_warning(&self, message: &str);
}

/// Default sink: emits warnings through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report_warning(&self, message: &str) {
        tracing::warn!(target: "raya_bridge::diagnostics", "{}", message);
    }
}

/// Warning emitted when a proxied method has no script implementation
pub fn undefined_method_message(method: &str) -> String {
    format!("Property \"{}\" is not defined in interface adapter", method)
}

// ============================================================================
// Null coercion
// ============================================================================

/// The engine's conversion of "no value" into a declared host type
pub trait NullCoercion: Send + Sync {
    /// Convert null to `ty`
    fn coerce_null(&self, ty: &HostType) -> Result<HostValue, ScriptError>;
}

/// Zero value for primitives, null for references
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCoercion;

impl NullCoercion for DefaultCoercion {
    fn coerce_null(&self, ty: &HostType) -> Result<HostValue, ScriptError> {
        Ok(match ty {
            HostType::Boolean => HostValue::Bool(false),
            HostType::Byte => HostValue::Byte(0),
            HostType::Short => HostValue::Short(0),
            HostType::Char => HostValue::Char('\0'),
            HostType::Int => HostValue::Int(0),
            HostType::Long => HostValue::Long(0),
            HostType::Float => HostValue::Float(0.0),
            HostType::Double => HostValue::Double(0.0),
            HostType::Void | HostType::String | HostType::Object(_) | HostType::Array(_) => {
                HostValue::Null
            }
        })
    }
}

/// Rejects null for primitive types, like a strict script-to-host conversion
#[derive(Debug, Default, Clone, Copy)]
pub struct StrictCoercion;

impl NullCoercion for StrictCoercion {
    fn coerce_null(&self, ty: &HostType) -> Result<HostValue, ScriptError> {
        if ty.is_primitive() {
            return Err(ScriptError::new(format!(
                "Cannot convert null to {}",
                ty
            )));
        }
        Ok(HostValue::Null)
    }
}

/// Engine services used while dispatching proxy calls
#[derive(Clone)]
pub struct EngineServices {
    /// Warning sink
    pub diagnostics: Arc<dyn DiagnosticSink>,
    /// Null coercion
    pub coercion: Arc<dyn NullCoercion>,
}

impl EngineServices {
    /// Create services from explicit collaborators
    pub fn new(diagnostics: Arc<dyn DiagnosticSink>, coercion: Arc<dyn NullCoercion>) -> Self {
        Self {
            diagnostics,
            coercion,
        }
    }
}

impl Default for EngineServices {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink), Arc::new(DefaultCoercion))
    }
}

impl std::fmt::Debug for EngineServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineServices").finish_non_exhaustive()
    }
}
