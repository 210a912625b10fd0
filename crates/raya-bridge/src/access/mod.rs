//! Best-effort visibility relaxation for reflected host members
//!
//! When the engine's member lookup hits a visibility failure it calls
//! [`try_elevate_access`] and proceeds or falls back depending on the
//! boolean. This module never decides policy; the host's [`AccessPolicy`]
//! does, and every refusal is folded into `false`.

mod policy;

pub use policy::{AccessPermission, AccessPolicy, TypePermissionRule};

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::descriptor::MethodDescriptor;
use crate::error::AccessDenied;
use crate::value::HostType;

/// Kind of reflected member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Field
    Field,
    /// Method
    Method,
    /// Constructor
    Constructor,
    /// Anything else the host reflects (cannot be elevated)
    Other,
}

/// Declared visibility of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Public
    Public,
    /// Protected
    Protected,
    /// Package / module private
    Package,
    /// Private
    Private,
}

/// Capability to change a member's access mode
pub trait Accessible {
    /// Whether reflective access is currently permitted
    fn is_accessible(&self) -> bool;

    /// Change the access mode
    fn set_accessible(&self, flag: bool) -> Result<(), AccessDenied>;
}

/// Reflected host member (field, method, constructor, ...)
pub trait ReflectedMember {
    /// Member name
    fn name(&self) -> &str;

    /// Member kind
    fn kind(&self) -> MemberKind;

    /// Name of the declaring type
    fn declaring_type(&self) -> &str;

    /// Whether the host declares this member as variadic
    fn is_variadic(&self) -> bool {
        false
    }

    /// Access-mode capability, `None` if this member type does not support it
    fn as_accessible(&self) -> Option<&dyn Accessible> {
        None
    }
}

/// Try to make `member` accessible.
///
/// Returns `false` immediately for members without an access mode, `true`
/// without mutation for members that are already accessible, and otherwise
/// the accessibility observed after the attempt. Never fails and never
/// panics; the change is visible to every holder of the member.
pub fn try_elevate_access(member: &dyn ReflectedMember) -> bool {
    let Some(accessible) = member.as_accessible() else {
        return false;
    };

    let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
        if accessible.is_accessible() {
            return true;
        }
        if let Err(err) = accessible.set_accessible(true) {
            tracing::debug!(member = member.name(), "elevation refused: {}", err);
        }
        accessible.is_accessible()
    }));

    attempt.unwrap_or_else(|_| {
        tracing::debug!(member = member.name(), "elevation attempt panicked");
        false
    })
}

#[derive(Debug)]
struct MemberInner {
    name: String,
    declaring: String,
    kind: MemberKind,
    visibility: Visibility,
    params: Vec<HostType>,
    variadic: bool,
    accessible: AtomicBool,
    policy: Arc<AccessPolicy>,
}

/// Reflected member backed by the host access policy.
///
/// Clones share one accessibility flag, so elevating any clone elevates the
/// member for all of them.
#[derive(Debug, Clone)]
pub struct MemberHandle {
    inner: Arc<MemberInner>,
}

impl MemberHandle {
    fn create(
        declaring: &str,
        name: &str,
        kind: MemberKind,
        visibility: Visibility,
        params: Vec<HostType>,
        variadic: bool,
        policy: &Arc<AccessPolicy>,
    ) -> Self {
        Self {
            inner: Arc::new(MemberInner {
                name: name.to_string(),
                declaring: declaring.to_string(),
                kind,
                visibility,
                params,
                variadic,
                accessible: AtomicBool::new(visibility == Visibility::Public),
                policy: Arc::clone(policy),
            }),
        }
    }

    /// Reflect a field
    pub fn field(declaring: &str, name: &str, visibility: Visibility, policy: &Arc<AccessPolicy>) -> Self {
        Self::create(declaring, name, MemberKind::Field, visibility, Vec::new(), false, policy)
    }

    /// Reflect a method
    pub fn method(method: &MethodDescriptor, visibility: Visibility, policy: &Arc<AccessPolicy>) -> Self {
        Self::create(
            &method.declaring,
            &method.name,
            MemberKind::Method,
            visibility,
            method.params.clone(),
            method.variadic,
            policy,
        )
    }

    /// Reflect a constructor
    pub fn constructor(
        declaring: &str,
        params: &[HostType],
        variadic: bool,
        visibility: Visibility,
        policy: &Arc<AccessPolicy>,
    ) -> Self {
        Self::create(declaring, "<init>", MemberKind::Constructor, visibility, params.to_vec(), variadic, policy)
    }

    /// Declared visibility
    pub fn visibility(&self) -> Visibility {
        self.inner.visibility
    }

    /// Declared parameter types (empty for fields)
    pub fn params(&self) -> &[HostType] {
        &self.inner.params
    }

    /// Whether two handles reflect the same member
    pub fn same_member(&self, other: &MemberHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Accessible for MemberHandle {
    fn is_accessible(&self) -> bool {
        self.inner.accessible.load(Ordering::Acquire)
    }

    fn set_accessible(&self, flag: bool) -> Result<(), AccessDenied> {
        let inner = &self.inner;
        if flag && !inner.policy.allows(&inner.declaring, inner.kind, inner.visibility) {
            return Err(AccessDenied {
                member: format!("{}.{}", inner.declaring, inner.name),
            });
        }
        inner.accessible.store(flag, Ordering::Release);
        Ok(())
    }
}

impl ReflectedMember for MemberHandle {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn kind(&self) -> MemberKind {
        self.inner.kind
    }

    fn declaring_type(&self) -> &str {
        &self.inner.declaring
    }

    fn is_variadic(&self) -> bool {
        self.inner.variadic
    }

    fn as_accessible(&self) -> Option<&dyn Accessible> {
        match self.inner.kind {
            MemberKind::Other => None,
            _ => Some(self),
        }
    }
}
