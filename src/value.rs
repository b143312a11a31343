//! Context values.
//!
//! [`Value`] is the closed set of shapes a context frame (or anything found
//! during lookup) can take: scalars, sequences, mappings, callable lambdas,
//! and opaque objects exposing named accessors. The renderer dispatches on
//! these variants by pattern matching; there is no runtime type inspection
//! beyond the enum tag.
//!
//! Mappings are `Rc<RefCell<...>>` so that cloning a frame onto the context
//! stack shares the underlying map, which is what lets the renderer memoize
//! computed lambda results back into the owning frame.
//!
//! Contexts are usually built from serde data: `Value` converts from
//! [`serde_json::Value`] (so `serde_json::json!` literals work directly) and
//! implements [`serde::Deserialize`] by funneling through the JSON value
//! model, so any serde format can produce a context root.

use crate::error::Result;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Shared, interior-mutable mapping frame.
pub type MapRef = Rc<RefCell<HashMap<String, Value>>>;

/// A frame exposing named zero-argument accessors.
///
/// The object-flavored alternative to a mapping frame: lookup calls
/// [`Object::field`] and accepts the frame when it returns `Some`, even if
/// the returned value is falsy.
pub trait Object {
    /// Resolve a single, undotted field name, or `None` if this object does
    /// not expose it.
    fn field(&self, name: &str) -> Option<Value>;
}

/// A callable context value.
///
/// Lambdas are invoked in two shapes, mirrored by the first argument:
/// `None` in variable position (`{{name}}`) and `Some(raw_body)` in section
/// position (`{{#name}}...{{/name}}`). The second argument is a render
/// callback that parses and renders arbitrary text against the context
/// current at the call site.
#[derive(Clone)]
pub struct Lambda(Rc<dyn Fn(Option<&str>, &mut dyn FnMut(&str) -> Result<String>) -> String>);

impl Lambda {
    /// Wrap a closure as a lambda value.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<&str>, &mut dyn FnMut(&str) -> Result<String>) -> String + 'static,
    {
        Self(Rc::new(f))
    }

    pub(crate) fn call(
        &self,
        body: Option<&str>,
        render: &mut dyn FnMut(&str) -> Result<String>,
    ) -> String {
        (self.0)(body, render)
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Lambda(..)")
    }
}

/// One context value: a frame on the context stack or anything resolved
/// from one.
#[derive(Clone)]
pub enum Value {
    /// Absent / null. Falsy; renders as the empty string.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Numeric scalar.
    Num(serde_json::Number),
    /// String scalar.
    Str(String),
    /// Ordered sequence; sections render once per element.
    Seq(Vec<Value>),
    /// Key-value mapping frame.
    Map(MapRef),
    /// Callable value.
    Lambda(Lambda),
    /// Accessor-backed frame.
    Object(Rc<dyn Object>),
}

impl Value {
    /// Build a mapping value from key-value pairs.
    pub fn map<K, V, I>(entries: I) -> Value
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Value::Map(Rc::new(RefCell::new(map)))
    }

    /// Wrap a closure as a lambda value. See [`Lambda`] for the call shapes.
    pub fn lambda<F>(f: F) -> Value
    where
        F: Fn(Option<&str>, &mut dyn FnMut(&str) -> Result<String>) -> String + 'static,
    {
        Value::Lambda(Lambda::new(f))
    }

    /// Wrap an accessor-backed object as a value.
    pub fn object<O: Object + 'static>(object: O) -> Value {
        Value::Object(Rc::new(object))
    }

    /// Section truthiness: emptiness decides for strings, sequences and
    /// mappings; numbers and objects are always truthy.
    pub(crate) fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Num(_) => true,
            Value::Str(s) => !s.is_empty(),
            Value::Seq(items) => !items.is_empty(),
            Value::Map(map) => !map.borrow().is_empty(),
            Value::Lambda(_) | Value::Object(_) => true,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Num(n) => write!(f, "Num({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Seq(items) => f.debug_tuple("Seq").field(items).finish(),
            Value::Map(map) => f.debug_tuple("Map").field(&*map.borrow()).finish(),
            Value::Lambda(_) => f.write_str("Lambda(..)"),
            Value::Object(_) => f.write_str("Object(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::Lambda(a), Value::Lambda(b)) => Rc::ptr_eq(&a.0, &b.0),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Num(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Num(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        // Non-finite numbers have no JSON representation.
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Num)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(items: Vec<V>) -> Self {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Value>> From<HashMap<String, V>> for Value {
    fn from(map: HashMap<String, V>) -> Self {
        Value::map(map)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Num(n),
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::Seq(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::map(map.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

impl<'de> serde::Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_covers_every_shape() {
        let v = Value::from(json!({
            "s": "text",
            "n": 3,
            "b": true,
            "null": null,
            "seq": [1, 2],
            "map": {"inner": "x"},
        }));

        let Value::Map(map) = v else {
            panic!("expected a map");
        };
        let map = map.borrow();
        assert_eq!(map["s"], Value::Str("text".to_string()));
        assert_eq!(map["n"], Value::from(3i64));
        assert_eq!(map["b"], Value::Bool(true));
        assert_eq!(map["null"], Value::Null);
        assert_eq!(map["seq"], Value::from(vec![1i64, 2]));
        assert!(matches!(map["map"], Value::Map(_)));
    }

    #[test]
    fn truthiness_by_emptiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::from(0i64).is_truthy());
        assert!(!Value::Seq(vec![]).is_truthy());
        assert!(Value::from(vec![1i64]).is_truthy());
        assert!(!Value::map(Vec::<(String, Value)>::new()).is_truthy());
        assert!(Value::map([("k", "v")]).is_truthy());
    }

    #[test]
    fn cloned_maps_share_storage() {
        let original = Value::map([("k", "old")]);
        let clone = original.clone();

        if let Value::Map(map) = &clone {
            map.borrow_mut()
                .insert("k".to_string(), Value::from("new"));
        }
        if let Value::Map(map) = &original {
            assert_eq!(map.borrow()["k"], Value::from("new"));
        }
    }

    #[test]
    fn lambda_equality_is_identity() {
        let a = Value::lambda(|_, _| String::new());
        let b = Value::lambda(|_, _| String::new());
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(Value::from(f64::NAN), Value::Null);
        assert_eq!(Value::from(1.5f64), Value::Num(
            serde_json::Number::from_f64(1.5).unwrap()
        ));
    }

    #[test]
    fn deserialize_through_serde() {
        let v: Value = serde_json::from_str(r#"{"name": "world"}"#).unwrap();
        let Value::Map(map) = v else {
            panic!("expected a map");
        };
        assert_eq!(map.borrow()["name"], Value::from("world"));
    }

    struct Point {
        x: i64,
        y: i64,
    }

    impl Object for Point {
        fn field(&self, name: &str) -> Option<Value> {
            match name {
                "x" => Some(Value::from(self.x)),
                "y" => Some(Value::from(self.y)),
                _ => None,
            }
        }
    }

    #[test]
    fn object_accessor_dispatch() {
        let v = Value::object(Point { x: 1, y: 2 });
        let Value::Object(obj) = &v else {
            panic!("expected an object");
        };
        assert_eq!(obj.field("y"), Some(Value::from(2i64)));
        assert_eq!(obj.field("z"), None);
    }
}
