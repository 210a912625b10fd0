//! Proxy type synthesis
//!
//! `ProxyPlatform` is the host's dynamic-dispatch machinery: it turns an
//! interface set into a proxy type and instantiates proxy types with a
//! dispatch handler. `VtablePlatform` is the in-process implementation,
//! generating a dispatch table per interface set and caching the resulting
//! type per domain.
//!
//! The cache holds types weakly. A type lives as long as some handle or
//! instance uses it; dead entries are pruned on the next miss.

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::descriptor::{DomainId, InterfaceDescriptor, InterfaceId, LoaderDomain};
use crate::error::{InstantiationError, ProxyConstructionError};
use crate::proxy::instance::{DispatchHandler, ProxyInstance};
use crate::proxy::types::{DispatchTable, HandlerConstructor, ProxyType};

/// Maximum number of interfaces one proxy type may implement
pub const MAX_PROXY_INTERFACES: usize = 65535;

/// Host facility that synthesizes and instantiates proxy types
pub trait ProxyPlatform: Send + Sync {
    /// Synthesize (or fetch a cached) proxy type implementing exactly
    /// `interfaces`, defined in `domain`
    fn proxy_type(
        &self,
        domain: &LoaderDomain,
        interfaces: &[Arc<InterfaceDescriptor>],
    ) -> Result<Arc<ProxyType>, ProxyConstructionError>;

    /// Instantiate a proxy type through its handler constructor
    fn instantiate(
        &self,
        ty: &Arc<ProxyType>,
        handler: Arc<dyn DispatchHandler>,
    ) -> Result<ProxyInstance, InstantiationError> {
        let Some(ctor) = ty.handler_constructor() else {
            return Err(InstantiationError::Instantiation(format!(
                "{} has no handler constructor",
                ty.name()
            )));
        };
        if !ctor.accessible {
            return Err(InstantiationError::IllegalAccess(ty.name().to_string()));
        }
        if !ctor.instantiable {
            return Err(InstantiationError::Instantiation(ty.name().to_string()));
        }
        Ok(ProxyInstance::new(Arc::clone(ty), handler))
    }
}

/// Cache key: defining domain plus the ordered interface identities
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TypeKey {
    domain: DomainId,
    interfaces: Vec<InterfaceId>,
}

impl TypeKey {
    fn new(domain: &LoaderDomain, interfaces: &[Arc<InterfaceDescriptor>]) -> Self {
        Self {
            domain: domain.id(),
            interfaces: interfaces.iter().map(|i| i.id()).collect(),
        }
    }
}

/// In-process proxy platform backed by generated dispatch tables
pub struct VtablePlatform {
    cache: Option<DashMap<TypeKey, Weak<ProxyType>>>,
}

static SHARED_PLATFORM: Lazy<Arc<VtablePlatform>> = Lazy::new(|| Arc::new(VtablePlatform::new()));

impl VtablePlatform {
    /// Create a platform with its own type cache
    pub fn new() -> Self {
        Self {
            cache: Some(DashMap::new()),
        }
    }

    /// Create a platform that synthesizes a fresh type on every request
    pub fn uncached() -> Self {
        Self { cache: None }
    }

    /// Process-wide platform shared by every bridge that caches types
    pub fn shared() -> Arc<VtablePlatform> {
        Arc::clone(&SHARED_PLATFORM)
    }

    /// Number of cached proxy types still in use
    pub fn cached_types(&self) -> usize {
        self.cache.as_ref().map_or(0, |c| {
            c.iter().filter(|e| e.value().strong_count() > 0).count()
        })
    }

    fn prune(cache: &DashMap<TypeKey, Weak<ProxyType>>) {
        let before = cache.len();
        cache.retain(|_, ty| ty.strong_count() > 0);
        let pruned = before.saturating_sub(cache.len());
        if pruned > 0 {
            tracing::debug!(pruned, "dropped unused proxy types from cache");
        }
    }

    fn validate(
        domain: &LoaderDomain,
        interfaces: &[Arc<InterfaceDescriptor>],
    ) -> Result<(), ProxyConstructionError> {
        if interfaces.is_empty() {
            return Err(ProxyConstructionError::EmptyInterfaceSet);
        }
        if interfaces.len() > MAX_PROXY_INTERFACES {
            return Err(ProxyConstructionError::TooManyInterfaces(interfaces.len()));
        }

        let mut seen = HashSet::with_capacity(interfaces.len());
        for iface in interfaces {
            if !iface.is_interface() {
                return Err(ProxyConstructionError::NotAnInterface(iface.name().to_string()));
            }
            if !domain.can_see(iface.domain()) {
                return Err(ProxyConstructionError::NotVisible {
                    interface: iface.name().to_string(),
                    domain: domain.name().to_string(),
                });
            }
            if !seen.insert(iface.id()) {
                return Err(ProxyConstructionError::DuplicateInterface(iface.name().to_string()));
            }
        }
        Ok(())
    }

    fn synthesize(
        domain: &LoaderDomain,
        interfaces: &[Arc<InterfaceDescriptor>],
    ) -> Result<Arc<ProxyType>, ProxyConstructionError> {
        Self::validate(domain, interfaces)?;
        let table = DispatchTable::build(interfaces)?;
        let ty = ProxyType::define(domain, interfaces, table, Some(HandlerConstructor::default()));
        tracing::debug!(
            proxy = ty.name(),
            domain = domain.name(),
            interfaces = interfaces.len(),
            slots = ty.table().len(),
            "synthesized proxy type"
        );
        Ok(Arc::new(ty))
    }
}

impl Default for VtablePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VtablePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VtablePlatform")
            .field("cached", &self.cache.is_some())
            .field("types", &self.cached_types())
            .finish()
    }
}

impl ProxyPlatform for VtablePlatform {
    fn proxy_type(
        &self,
        domain: &LoaderDomain,
        interfaces: &[Arc<InterfaceDescriptor>],
    ) -> Result<Arc<ProxyType>, ProxyConstructionError> {
        let Some(cache) = &self.cache else {
            return Self::synthesize(domain, interfaces);
        };

        let key = TypeKey::new(domain, interfaces);
        if let Some(hit) = cache.get(&key).and_then(|e| e.value().upgrade()) {
            tracing::debug!(proxy = hit.name(), "proxy type cache hit");
            return Ok(hit);
        }

        Self::prune(cache);

        // Racing builders may both synthesize; the first live insert wins and
        // every caller gets that type.
        let built = Self::synthesize(domain, interfaces)?;
        let ty = match cache.entry(key) {
            Entry::Occupied(mut slot) => match slot.get().upgrade() {
                Some(winner) => winner,
                None => {
                    slot.insert(Arc::downgrade(&built));
                    built
                }
            },
            Entry::Vacant(slot) => {
                slot.insert(Arc::downgrade(&built));
                built
            }
        };
        Ok(ty)
    }
}
