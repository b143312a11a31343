//! Context-stack field resolution.
//!
//! A context stack is a `Vec<Value>` with the innermost frame last; the
//! renderer pushes a frame on section and lambda entry and pops it on exit.
//! [`lookup`] walks the stack innermost → outermost with one fixed rule set:
//!
//! - a `Map` frame wins if it *contains* the key, even when the stored value
//!   is falsy or null (presence decides, not truthiness);
//! - an `Object` frame wins if its accessor returns `Some`;
//! - sequence, scalar and lambda frames expose no fields and are skipped.
//!
//! Only exact, single-segment names are resolved: no dotted paths, no
//! parent-traversal syntax, no implicit-self token. `{{.}}` looks up the
//! literal key `"."` like any other name.

use crate::value::Value;

/// Resolve `name` against the stack, innermost frame first.
///
/// Returns the owning frame (so the renderer can memoize lambda results back
/// into a mapping) and the resolved value. When no frame matches, the
/// outermost frame is returned with [`Value::Null`].
pub(crate) fn lookup(name: &str, stack: &[Value]) -> (Option<Value>, Value) {
    for frame in stack.iter().rev() {
        match frame {
            Value::Map(map) => {
                if let Some(value) = map.borrow().get(name) {
                    return (Some(frame.clone()), value.clone());
                }
            }
            Value::Object(object) => {
                if let Some(value) = object.field(name) {
                    return (Some(frame.clone()), value);
                }
            }
            _ => {}
        }
    }
    (stack.first().cloned(), Value::Null)
}
