//! Host values and declared host types
//!
//! `HostValue` is what crosses the bridge as a method argument or result.
//! `HostType` is what an interface method declares for its parameters and
//! return value.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque engine- or host-owned reference.
///
/// The bridge never looks inside these; it only stores, clones and passes
/// them along. Identity is pointer identity.
pub type OpaqueRef = Arc<dyn Any + Send + Sync>;

/// Declared type of a parameter or return value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostType {
    /// No value (void-like return type)
    Void,
    /// boolean
    Boolean,
    /// 8-bit integer
    Byte,
    /// 16-bit integer
    Short,
    /// UTF-16 code unit / character
    Char,
    /// 32-bit integer
    Int,
    /// 64-bit integer
    Long,
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
    /// String reference type
    String,
    /// Any other reference type, by name
    Object(Arc<str>),
    /// Array of the element type
    Array(Box<HostType>),
}

impl HostType {
    /// Create a named reference type
    pub fn object(name: impl Into<Arc<str>>) -> Self {
        HostType::Object(name.into())
    }

    /// Create an array type
    pub fn array(element: HostType) -> Self {
        HostType::Array(Box::new(element))
    }

    /// Whether this type carries no value
    pub fn is_void(&self) -> bool {
        matches!(self, HostType::Void)
    }

    /// Whether this is a primitive (non-reference, non-void) type
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            HostType::Boolean
                | HostType::Byte
                | HostType::Short
                | HostType::Char
                | HostType::Int
                | HostType::Long
                | HostType::Float
                | HostType::Double
        )
    }

    /// Type name as written in signatures
    pub fn name(&self) -> String {
        match self {
            HostType::Void => "void".to_string(),
            HostType::Boolean => "boolean".to_string(),
            HostType::Byte => "byte".to_string(),
            HostType::Short => "short".to_string(),
            HostType::Char => "char".to_string(),
            HostType::Int => "int".to_string(),
            HostType::Long => "long".to_string(),
            HostType::Float => "float".to_string(),
            HostType::Double => "double".to_string(),
            HostType::String => "String".to_string(),
            HostType::Object(name) => name.to_string(),
            HostType::Array(elem) => format!("{}[]", elem.name()),
        }
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Value passed across the bridge
#[derive(Clone)]
pub enum HostValue {
    /// null / unit
    Null,
    /// boolean
    Bool(bool),
    /// 8-bit integer
    Byte(i8),
    /// 16-bit integer
    Short(i16),
    /// Character
    Char(char),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Double(f64),
    /// String
    Str(Arc<str>),
    /// Opaque object reference
    Object(OpaqueRef),
}

impl HostValue {
    /// Create a string value
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        HostValue::Str(s.into())
    }

    /// Wrap an arbitrary object
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        HostValue::Object(Arc::new(value))
    }

    /// Check if this is null
    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    /// Get as bool if this is a bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i32 if this is an int
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            HostValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a double
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Get as str if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Downcast an object reference
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            HostValue::Object(obj) => obj.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl Default for HostValue {
    fn default() -> Self {
        HostValue::Null
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Null, HostValue::Null) => true,
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::Byte(a), HostValue::Byte(b)) => a == b,
            (HostValue::Short(a), HostValue::Short(b)) => a == b,
            (HostValue::Char(a), HostValue::Char(b)) => a == b,
            (HostValue::Int(a), HostValue::Int(b)) => a == b,
            (HostValue::Long(a), HostValue::Long(b)) => a == b,
            (HostValue::Float(a), HostValue::Float(b)) => a.to_bits() == b.to_bits(),
            (HostValue::Double(a), HostValue::Double(b)) => a.to_bits() == b.to_bits(),
            (HostValue::Str(a), HostValue::Str(b)) => a == b,
            // Object identity, ignoring vtable metadata
            (HostValue::Object(a), HostValue::Object(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Null => write!(f, "HostValue::Null"),
            HostValue::Bool(b) => write!(f, "HostValue::Bool({})", b),
            HostValue::Byte(i) => write!(f, "HostValue::Byte({})", i),
            HostValue::Short(i) => write!(f, "HostValue::Short({})", i),
            HostValue::Char(c) => write!(f, "HostValue::Char({:?})", c),
            HostValue::Int(i) => write!(f, "HostValue::Int({})", i),
            HostValue::Long(i) => write!(f, "HostValue::Long({})", i),
            HostValue::Float(x) => write!(f, "HostValue::Float({})", x),
            HostValue::Double(x) => write!(f, "HostValue::Double({})", x),
            HostValue::Str(s) => write!(f, "HostValue::Str({:?})", s),
            HostValue::Object(obj) => write!(f, "HostValue::Object({:p})", Arc::as_ptr(obj)),
        }
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<i32> for HostValue {
    fn from(i: i32) -> Self {
        HostValue::Int(i)
    }
}

impl From<i64> for HostValue {
    fn from(i: i64) -> Self {
        HostValue::Long(i)
    }
}

impl From<f64> for HostValue {
    fn from(x: f64) -> Self {
        HostValue::Double(x)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::Str(s.into())
    }
}

impl From<()> for HostValue {
    fn from(_: ()) -> Self {
        HostValue::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_type_names() {
        assert_eq!(HostType::Int.name(), "int");
        assert_eq!(HostType::object("host.lang.Runnable").name(), "host.lang.Runnable");
        assert_eq!(HostType::array(HostType::array(HostType::Byte)).to_string(), "byte[][]");
    }

    #[test]
    fn test_host_type_classification() {
        assert!(HostType::Void.is_void());
        assert!(!HostType::Void.is_primitive());
        assert!(HostType::Char.is_primitive());
        assert!(!HostType::String.is_primitive());
        assert!(!HostType::array(HostType::Int).is_primitive());
    }

    #[test]
    fn test_object_identity() {
        let a = HostValue::object(5u32);
        let b = a.clone();
        let c = HostValue::object(5u32);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.downcast_ref::<u32>(), Some(&5));
    }

    #[test]
    fn test_value_accessors() {
        assert!(HostValue::from(()).is_null());
        assert_eq!(HostValue::from(7).as_i32(), Some(7));
        assert_eq!(HostValue::from("hi").as_str(), Some("hi"));
        assert_eq!(HostValue::from(true).as_bool(), Some(true));
        assert_eq!(HostValue::Long(7).as_i32(), None);
    }
}
