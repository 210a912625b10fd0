//! Host type descriptors
//!
//! Describes the host-side contracts a proxy can implement: loader domains,
//! interfaces, their methods, and classes that implement interfaces.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::value::HostType;

/// Unique identifier for a loader domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomainId(u64);

impl DomainId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        DomainId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct DomainInner {
    id: DomainId,
    name: String,
    parent: Option<LoaderDomain>,
}

/// Code-generation / origin domain of host types.
///
/// Domains form a delegation chain through their parents. A type defined in
/// domain `P` is visible from domain `D` when `P` is `D` or one of its
/// ancestors. Proxy types are generated inside one domain and can only
/// implement interfaces visible from it.
#[derive(Debug, Clone)]
pub struct LoaderDomain {
    inner: Arc<DomainInner>,
}

impl LoaderDomain {
    /// Create a root domain
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(DomainInner {
                id: DomainId::next(),
                name: name.into(),
                parent: None,
            }),
        }
    }

    /// Create a domain that delegates to `self`
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(DomainInner {
                id: DomainId::next(),
                name: name.into(),
                parent: Some(self.clone()),
            }),
        }
    }

    /// Domain ID
    pub fn id(&self) -> DomainId {
        self.inner.id
    }

    /// Domain name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Parent domain, if any
    pub fn parent(&self) -> Option<&LoaderDomain> {
        self.inner.parent.as_ref()
    }

    /// Check whether types defined in `other` are visible from this domain
    pub fn can_see(&self, other: &LoaderDomain) -> bool {
        let mut current = Some(self);
        while let Some(domain) = current {
            if domain.id() == other.id() {
                return true;
            }
            current = domain.parent();
        }
        false
    }
}

impl PartialEq for LoaderDomain {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for LoaderDomain {}

impl fmt::Display for LoaderDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Interface method as seen at call time
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    /// Declaring interface name
    pub declaring: Arc<str>,
    /// Method name
    pub name: Arc<str>,
    /// Declared parameter types
    pub params: Vec<HostType>,
    /// Declared return type
    pub return_type: HostType,
    /// Whether the last parameter is variadic
    pub variadic: bool,
}

impl MethodDescriptor {
    /// Create a method with no parameters
    pub fn new(
        declaring: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        return_type: HostType,
    ) -> Self {
        Self {
            declaring: declaring.into(),
            name: name.into(),
            params: Vec::new(),
            return_type,
            variadic: false,
        }
    }

    /// Append a parameter
    pub fn param(mut self, ty: HostType) -> Self {
        self.params.push(ty);
        self
    }

    /// Mark the method as variadic
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// Dispatch key: name plus parameter types
    pub fn key(&self) -> MethodKey {
        MethodKey {
            name: self.name.clone(),
            params: self.params.clone(),
        }
    }

    /// Signature string, e.g. `run(int, String)`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.name()).collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}.{}", self.return_type, self.declaring, self.signature())
    }
}

/// Method identity within a proxy's dispatch table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey {
    /// Method name
    pub name: Arc<str>,
    /// Parameter types
    pub params: Vec<HostType>,
}

/// Whether a host type descriptor is an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    /// Interface (can be proxied)
    Interface,
    /// Concrete or abstract class
    Class,
}

/// Identity of one built interface descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceId(u64);

impl InterfaceId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        InterfaceId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Host interface contract.
///
/// Two descriptors with the same name in the same domain are still distinct
/// interfaces; identity comes from [`InterfaceDescriptor::id`], assigned by
/// `build`.
#[derive(Debug, Clone)]
pub struct InterfaceDescriptor {
    id: InterfaceId,
    name: Arc<str>,
    domain: LoaderDomain,
    kind: DescriptorKind,
    methods: Vec<MethodDescriptor>,
}

impl InterfaceDescriptor {
    /// Create an empty interface in the given domain
    pub fn new(name: impl Into<Arc<str>>, domain: &LoaderDomain) -> Self {
        Self {
            id: InterfaceId(0),
            name: name.into(),
            domain: domain.clone(),
            kind: DescriptorKind::Interface,
            methods: Vec::new(),
        }
    }

    /// Create a descriptor for a class (cannot be proxied directly)
    pub fn class(name: impl Into<Arc<str>>, domain: &LoaderDomain) -> Self {
        Self {
            kind: DescriptorKind::Class,
            ..Self::new(name, domain)
        }
    }

    /// Declare a method with the given parameter and return types
    pub fn method(mut self, name: &str, params: &[HostType], return_type: HostType) -> Self {
        let mut method = MethodDescriptor::new(self.name.clone(), name, return_type);
        method.params = params.to_vec();
        self.methods.push(method);
        self
    }

    /// Declare a variadic method
    pub fn variadic_method(mut self, name: &str, params: &[HostType], return_type: HostType) -> Self {
        let mut method = MethodDescriptor::new(self.name.clone(), name, return_type).variadic();
        method.params = params.to_vec();
        self.methods.push(method);
        self
    }

    /// Freeze into a shareable descriptor
    pub fn build(mut self) -> Arc<Self> {
        self.id = InterfaceId::next();
        Arc::new(self)
    }

    /// Identity assigned by `build`
    pub fn id(&self) -> InterfaceId {
        self.id
    }

    /// Interface name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Defining domain
    pub fn domain(&self) -> &LoaderDomain {
        &self.domain
    }

    /// Descriptor kind
    pub fn kind(&self) -> DescriptorKind {
        self.kind
    }

    /// Whether this descriptor is an interface
    pub fn is_interface(&self) -> bool {
        self.kind == DescriptorKind::Interface
    }

    /// Declared methods in declaration order
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// Find a declared method by name
    pub fn find_method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| &*m.name == name)
    }
}

/// Host class together with the interfaces it implements
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    /// Class name
    pub name: Arc<str>,
    /// Defining domain
    pub domain: LoaderDomain,
    /// Implemented interfaces, in declaration order
    pub interfaces: Vec<Arc<InterfaceDescriptor>>,
}

impl ClassDescriptor {
    /// Create a class descriptor
    pub fn new(
        name: impl Into<Arc<str>>,
        domain: &LoaderDomain,
        interfaces: Vec<Arc<InterfaceDescriptor>>,
    ) -> Self {
        Self {
            name: name.into(),
            domain: domain.clone(),
            interfaces,
        }
    }
}
