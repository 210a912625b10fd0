//! Synthesized proxy types and their dispatch tables

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::descriptor::{InterfaceDescriptor, LoaderDomain, MethodDescriptor, MethodKey};
use crate::error::ProxyConstructionError;

/// Flattened method table of a proxy type.
///
/// Built once when the type is synthesized. Every slot has the same body
/// (forward to the instance's dispatch handler), so a slot is just the
/// method descriptor handed to the handler. Lookup is by name and parameter
/// types; when two interfaces declare the same method, the first
/// declaration owns the slot.
pub struct DispatchTable {
    slots: Vec<MethodDescriptor>,
    index: FxHashMap<MethodKey, usize>,
}

impl DispatchTable {
    /// Build the table for an ordered interface set
    pub fn build(interfaces: &[Arc<InterfaceDescriptor>]) -> Result<Self, ProxyConstructionError> {
        let mut slots: Vec<MethodDescriptor> = Vec::new();
        let mut index = FxHashMap::default();

        for iface in interfaces {
            for method in iface.methods() {
                let key = method.key();
                if let Some(&existing) = index.get(&key) {
                    let first: &MethodDescriptor = &slots[existing];
                    if first.return_type != method.return_type {
                        return Err(ProxyConstructionError::ConflictingReturnTypes {
                            method: method.signature(),
                            first: first.return_type.name(),
                            second: method.return_type.name(),
                        });
                    }
                    continue;
                }
                index.insert(key, slots.len());
                slots.push(method.clone());
            }
        }

        Ok(Self { slots, index })
    }

    /// Resolve a method to its slot
    pub fn resolve(&self, key: &MethodKey) -> Option<&MethodDescriptor> {
        self.index.get(key).map(|&i| &self.slots[i])
    }

    /// Slot index of a method
    pub fn slot_of(&self, key: &MethodKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Slot by index
    pub fn slot(&self, index: usize) -> Option<&MethodDescriptor> {
        self.slots.get(index)
    }

    /// All slots in declaration order
    pub fn slots(&self) -> &[MethodDescriptor] {
        &self.slots
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the table has no slots (marker interfaces only)
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchTable")
            .field("count", &self.slots.len())
            .finish()
    }
}

/// Modifiers of the constructor that accepts a dispatch handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerConstructor {
    /// Callable from the bridge
    pub accessible: bool,
    /// The type can be instantiated
    pub instantiable: bool,
}

impl Default for HandlerConstructor {
    fn default() -> Self {
        Self {
            accessible: true,
            instantiable: true,
        }
    }
}

/// Runtime-synthesized type implementing a fixed interface set
#[derive(Debug)]
pub struct ProxyType {
    id: u64,
    name: String,
    domain: LoaderDomain,
    interfaces: Vec<Arc<InterfaceDescriptor>>,
    table: DispatchTable,
    constructor: Option<HandlerConstructor>,
}

impl ProxyType {
    /// Define a proxy type with a fresh `$Proxy<N>` name
    pub fn define(
        domain: &LoaderDomain,
        interfaces: &[Arc<InterfaceDescriptor>],
        table: DispatchTable,
        constructor: Option<HandlerConstructor>,
    ) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            id,
            name: format!("$Proxy{}", id),
            domain: domain.clone(),
            interfaces: interfaces.to_vec(),
            table,
            constructor,
        }
    }

    /// Type ID
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Generated type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Domain the type was defined in
    pub fn domain(&self) -> &LoaderDomain {
        &self.domain
    }

    /// Implemented interfaces, in the order requested
    pub fn interfaces(&self) -> &[Arc<InterfaceDescriptor>] {
        &self.interfaces
    }

    /// Whether the type implements the named interface
    pub fn implements(&self, name: &str) -> bool {
        self.interfaces.iter().any(|i| i.name() == name)
    }

    /// Dispatch table
    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    /// Constructor accepting a dispatch handler, if the type has one
    pub fn handler_constructor(&self) -> Option<HandlerConstructor> {
        self.constructor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::HostType;

    fn domain() -> LoaderDomain {
        LoaderDomain::root("app")
    }

    #[test]
    fn test_table_flattens_in_order() {
        let d = domain();
        let a = InterfaceDescriptor::new("A", &d)
            .method("one", &[], HostType::Int)
            .method("two", &[HostType::Int], HostType::Void)
            .build();
        let b = InterfaceDescriptor::new("B", &d)
            .method("three", &[], HostType::String)
            .build();

        let table = DispatchTable::build(&[a, b]).unwrap();
        assert_eq!(table.len(), 3);
        let names: Vec<&str> = table.slots().iter().map(|m| &*m.name).collect();
        assert_eq!(names, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_duplicate_method_keeps_first() {
        let d = domain();
        let a = InterfaceDescriptor::new("A", &d).method("close", &[], HostType::Void).build();
        let b = InterfaceDescriptor::new("B", &d).method("close", &[], HostType::Void).build();

        let table = DispatchTable::build(&[a, b.clone()]).unwrap();
        assert_eq!(table.len(), 1);

        let key = b.methods()[0].key();
        assert_eq!(&*table.resolve(&key).unwrap().declaring, "A");
    }

    #[test]
    fn test_overloads_get_separate_slots() {
        let d = domain();
        let a = InterfaceDescriptor::new("A", &d)
            .method("put", &[HostType::Int], HostType::Void)
            .method("put", &[HostType::String], HostType::Void)
            .build();

        let table = DispatchTable::build(&[a]).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_conflicting_return_types() {
        let d = domain();
        let a = InterfaceDescriptor::new("A", &d).method("size", &[], HostType::Int).build();
        let b = InterfaceDescriptor::new("B", &d).method("size", &[], HostType::Long).build();

        let err = DispatchTable::build(&[a, b]).unwrap_err();
        assert_eq!(
            err,
            ProxyConstructionError::ConflictingReturnTypes {
                method: "size()".to_string(),
                first: "int".to_string(),
                second: "long".to_string(),
            }
        );
    }

    #[test]
    fn test_proxy_type_names_are_unique() {
        let d = domain();
        let a = InterfaceDescriptor::new("A", &d).build();
        let t1 = ProxyType::define(&d, &[a.clone()], DispatchTable::build(&[a.clone()]).unwrap(), None);
        let t2 = ProxyType::define(&d, &[a.clone()], DispatchTable::build(&[a]).unwrap(), None);

        assert_ne!(t1.name(), t2.name());
        assert!(t1.name().starts_with("$Proxy"));
        assert!(t1.implements("A"));
        assert!(!t1.implements("B"));
        assert!(t1.table().is_empty());
    }
}
