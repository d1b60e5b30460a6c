//! Attribute bags and the row keys reserved by the record layer.

use serde_json::Value;

/// A flat attribute bag. Also the shape of one row in the shared table.
pub type Item = serde_json::Map<String, Value>;

/// Partition key.
pub const ID_ATTR: &str = "id";
/// Type discriminator.
pub const TYPE_ATTR: &str = "type";
pub const CREATED_AT_ATTR: &str = "createdAt";
pub const MODIFIED_AT_ATTR: &str = "modifiedAt";
/// Optimistic concurrency counter. Underscored so it never collides with a
/// domain attribute such as `version`.
pub const VERSION_ATTR: &str = "_version";

/// Keys written by the record layer itself, never by a schema.
pub const RESERVED_ATTRS: [&str; 5] = [
    ID_ATTR,
    TYPE_ATTR,
    CREATED_AT_ATTR,
    MODIFIED_AT_ATTR,
    VERSION_ATTR,
];

/// Returns true if `name` is one of [`RESERVED_ATTRS`].
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_ATTRS.contains(&name)
}

/// Truthiness used to pick the keys of a partial update.
///
/// `null`, `false`, zero and `""` are falsy. Arrays and objects are truthy
/// even when empty.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Attribute equality as filters and write conditions see it.
///
/// Numbers compare by value, so `41` equals `41.0`. Arrays and objects compare
/// element-wise under the same rule; everything else is structural.
#[must_use]
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => match (a.as_u64(), b.as_u64()) {
                (Some(a), Some(b)) => a == b,
                _ => a.as_f64().zip(b.as_f64()).is_some_and(|(a, b)| a == b),
            },
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, x)| b.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => left == right,
    }
}

/// A reference attribute holding nothing to resolve.
#[must_use]
pub fn is_empty_reference(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
