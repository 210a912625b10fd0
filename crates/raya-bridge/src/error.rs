//! Error types for the host bridge

use std::sync::Arc;

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Engine runtime exception as seen from the host side.
///
/// Failures raised by a forwarded script call travel back to the host caller
/// as a `ScriptError`. The optional cause keeps the chain of the original
/// failure (for example, the error a proxy constructor raised).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ScriptError {
    message: String,
    #[source]
    cause: Option<Arc<ScriptError>>,
}

impl ScriptError {
    /// Create a new script error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Attach the error that caused this one
    pub fn with_cause(mut self, cause: ScriptError) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Underlying cause, if any
    pub fn cause(&self) -> Option<&ScriptError> {
        self.cause.as_deref()
    }
}

impl From<String> for ScriptError {
    fn from(s: String) -> Self {
        ScriptError::new(s)
    }
}

impl From<&str> for ScriptError {
    fn from(s: &str) -> Self {
        ScriptError::new(s)
    }
}

/// The platform refused to synthesize a proxy type for an interface set.
///
/// Fatal for the call that produced it. Retrying with the same inputs yields
/// the same error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProxyConstructionError {
    /// No interfaces were supplied
    #[error("Cannot build a proxy for an empty interface set")]
    EmptyInterfaceSet,

    /// A descriptor in the set is not an interface
    #[error("{0} is not an interface")]
    NotAnInterface(String),

    /// The same interface appears more than once
    #[error("Repeated interface: {0}")]
    DuplicateInterface(String),

    /// An interface cannot be seen from the domain the proxy is defined in
    #[error("Interface {interface} is not visible from domain {domain}")]
    NotVisible {
        /// Interface name
        interface: String,
        /// Domain the proxy type is being defined in
        domain: String,
    },

    /// Two methods share name and parameters but disagree on the return type
    #[error("Methods named {method} with the same parameter types have different return types ({first} vs {second})")]
    ConflictingReturnTypes {
        /// Method name
        method: String,
        /// First declared return type
        first: String,
        /// Conflicting return type
        second: String,
    },

    /// Interface limit exceeded
    #[error("Interface limit exceeded: {0}")]
    TooManyInterfaces(usize),
}

/// Failure reported by the platform while instantiating a proxy type
#[derive(Debug, Clone, thiserror::Error)]
pub enum InstantiationError {
    /// The constructor itself raised an error
    #[error("Proxy constructor raised: {0}")]
    InvocationTarget(ScriptError),

    /// The constructor is not accessible
    #[error("Illegal access to proxy constructor: {0}")]
    IllegalAccess(String),

    /// The type cannot be instantiated
    #[error("Cannot instantiate proxy type: {0}")]
    Instantiation(String),
}

/// Bridge errors surfaced to the engine or the host caller
#[derive(Debug, Clone, thiserror::Error)]
pub enum BridgeError {
    /// Proxy type synthesis was refused
    #[error("Proxy construction failed: {0}")]
    ProxyConstruction(#[from] ProxyConstructionError),

    /// An internal invariant was violated
    #[error("Illegal state: {message}")]
    IllegalState {
        /// What went wrong
        message: String,
        /// Underlying failure, if any
        #[source]
        source: Option<InstantiationError>,
    },

    /// Script runtime exception
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    /// The proxy does not implement the requested method
    #[error("No such method on {proxy}: {method}")]
    NoSuchMethod {
        /// Proxy type name
        proxy: String,
        /// Method signature
        method: String,
    },

    /// Wrong number of arguments for a non-variadic method
    #[error("{method} expects {expected} arguments, got {got}")]
    ArityMismatch {
        /// Method name
        method: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },
}

impl BridgeError {
    /// Create an illegal-state error without a source
    pub fn illegal_state(message: impl Into<String>) -> Self {
        BridgeError::IllegalState {
            message: message.into(),
            source: None,
        }
    }
}

/// Returned when the host security policy denies an accessibility change
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Access denied: cannot make {member} accessible")]
pub struct AccessDenied {
    /// Member that was refused
    pub member: String,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A permission string could not be parsed
    #[error("Invalid permission value for {key}: {value}")]
    InvalidPermission {
        /// Config key
        key: String,
        /// Offending value
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_script_error_cause_chain() {
        let inner = ScriptError::new("boom");
        let outer = ScriptError::new("constructor failed").with_cause(inner);

        assert_eq!(outer.message(), "constructor failed");
        assert_eq!(outer.cause().map(|c| c.message()), Some("boom"));
        assert_eq!(outer.source().map(|s| s.to_string()), Some("boom".to_string()));
    }

    #[test]
    fn test_bridge_error_display() {
        let err: BridgeError = ProxyConstructionError::DuplicateInterface("Runnable".into()).into();
        assert_eq!(err.to_string(), "Proxy construction failed: Repeated interface: Runnable");

        let err = BridgeError::illegal_state("no handler constructor");
        assert_eq!(err.to_string(), "Illegal state: no handler constructor");
    }
}
