//! Host Access Policy
//!
//! Public members are always reachable. The policy only decides which kinds
//! of non-public member may be opened up, per declaring type.
//!
//! Resolution order for a declaring type (most specific first):
//! 1. Exact type entry (`"com.example.Secret"`)
//! 2. First matching wildcard rule (`"plugins.*"`, `"plugins.**"`, `"*"`)
//! 3. Global default

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::access::{MemberKind, Visibility};

/// Kinds of non-public member a type lets the bridge open up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessPermission(u8);

impl AccessPermission {
    /// Non-public members stay closed
    pub const PUBLIC_ONLY: Self = Self(0);
    /// Non-public fields
    pub const FIELDS: Self = Self(1 << 0);
    /// Non-public methods
    pub const METHODS: Self = Self(1 << 1);
    /// Non-public constructors
    pub const CONSTRUCTORS: Self = Self(1 << 2);
    /// Every member kind
    pub const ALL: Self = Self(0b111);

    /// Permission a member needs before it can be made accessible, `None`
    /// for public members
    pub fn required_for(kind: MemberKind, visibility: Visibility) -> Option<Self> {
        if visibility == Visibility::Public {
            return None;
        }
        Some(match kind {
            MemberKind::Field => Self::FIELDS,
            MemberKind::Method => Self::METHODS,
            MemberKind::Constructor => Self::CONSTRUCTORS,
            MemberKind::Other => Self::ALL,
        })
    }

    /// Check if every kind in `other` is granted
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Parse a `|`-separated list such as `"METHODS|CONSTRUCTORS"`
    pub fn parse(s: &str) -> Option<Self> {
        s.split('|').try_fold(Self::PUBLIC_ONLY, |acc, part| {
            let kind = match part.trim().to_ascii_uppercase().as_str() {
                "PUBLIC_ONLY" | "NONE" => Self::PUBLIC_ONLY,
                "FIELDS" => Self::FIELDS,
                "METHODS" => Self::METHODS,
                "CONSTRUCTORS" => Self::CONSTRUCTORS,
                "ALL" => Self::ALL,
                _ => return None,
            };
            Some(Self(acc.0 | kind.0))
        })
    }
}

/// Wildcard rule over dotted type names
#[derive(Debug, Clone)]
pub struct TypePermissionRule {
    /// Pattern: `pkg.*` (direct and nested members of `pkg`), `pkg.**`
    /// (`pkg` itself and everything below it) or `*`
    pub pattern: String,
    /// Permissions for matching types
    pub permissions: AccessPermission,
}

impl TypePermissionRule {
    /// Check if a type name matches this rule
    pub fn matches(&self, type_name: &str) -> bool {
        if self.pattern == "*" || self.pattern == "**" {
            return true;
        }

        if let Some(prefix) = self.pattern.strip_suffix(".**") {
            type_name
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
        } else if let Some(prefix) = self.pattern.strip_suffix(".*") {
            type_name
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('.') && rest.len() > 1)
        } else {
            self.pattern == type_name
        }
    }
}

#[derive(Debug)]
struct PolicyState {
    global: AccessPermission,
    types: HashMap<String, AccessPermission>,
    rules: Vec<TypePermissionRule>,
}

/// Host security policy consulted when a member is made accessible.
///
/// Shared by every member handle created against it; changes apply to later
/// elevation attempts.
#[derive(Debug)]
pub struct AccessPolicy {
    state: RwLock<PolicyState>,
}

impl AccessPolicy {
    /// Policy that allows everything
    pub fn permissive() -> Self {
        Self::with_global(AccessPermission::ALL)
    }

    /// Policy with the given global default
    pub fn with_global(global: AccessPermission) -> Self {
        Self {
            state: RwLock::new(PolicyState {
                global,
                types: HashMap::new(),
                rules: Vec::new(),
            }),
        }
    }

    /// Global default
    pub fn global(&self) -> AccessPermission {
        self.state.read().global
    }

    /// Set permissions for one type
    pub fn set_type(&self, type_name: &str, permissions: AccessPermission) {
        self.state
            .write()
            .types
            .insert(type_name.to_string(), permissions);
    }

    /// Add a wildcard rule (first match wins)
    pub fn add_rule(&self, rule: TypePermissionRule) {
        self.state.write().rules.push(rule);
    }

    /// Resolve the permissions that apply to a declaring type
    pub fn resolve(&self, type_name: &str) -> AccessPermission {
        let state = self.state.read();
        if let Some(perms) = state.types.get(type_name) {
            return *perms;
        }
        state
            .rules
            .iter()
            .find(|rule| rule.matches(type_name))
            .map(|rule| rule.permissions)
            .unwrap_or(state.global)
    }

    /// Whether a member of `declaring` may be made accessible
    pub fn allows(&self, declaring: &str, kind: MemberKind, visibility: Visibility) -> bool {
        match AccessPermission::required_for(kind, visibility) {
            None => true,
            Some(required) => self.resolve(declaring).contains(required),
        }
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::permissive()
    }
}
