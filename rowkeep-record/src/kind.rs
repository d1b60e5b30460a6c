use crate::error::{RecordError, RecordResult};
use rowkeep_model::Schema;
use rowkeep_types::{Item, TYPE_ATTR};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// The closed set of entity kinds stored in one table.
///
/// Implemented by an application enum whose `from_discriminator` is an
/// exhaustive `match`, so every kind that can be rehydrated is known at
/// compile time and an unknown discriminator is an ordinary `None`.
///
/// ```
/// use std::sync::Arc;
/// use rowkeep_model::{EntitySchema, FieldSpec, Schema};
/// use rowkeep_record::EntityKind;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum Kind {
///     User,
///     Team,
/// }
///
/// impl EntityKind for Kind {
///     fn discriminator(&self) -> &'static str {
///         match self {
///             Kind::User => "User",
///             Kind::Team => "Team",
///         }
///     }
///
///     fn from_discriminator(tag: &str) -> Option<Self> {
///         match tag {
///             "User" => Some(Kind::User),
///             "Team" => Some(Kind::Team),
///             _ => None,
///         }
///     }
///
///     fn schema(&self) -> Arc<dyn Schema> {
///         Arc::new(EntitySchema::new(vec![FieldSpec::text("name").required()]))
///     }
///
///     fn refs(&self) -> &'static [&'static str] {
///         match self {
///             Kind::User => &["managerId", "teamId"],
///             Kind::Team => &[],
///         }
///     }
/// }
///
/// assert_eq!(Kind::from_discriminator("Team"), Some(Kind::Team));
/// assert_eq!(Kind::from_discriminator("Robot"), None);
/// ```
pub trait EntityKind: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// The `type` value written to rows of this kind.
    fn discriminator(&self) -> &'static str;

    /// Maps a stored discriminator back to its kind.
    fn from_discriminator(tag: &str) -> Option<Self>;

    /// Schema used to parse and validate attributes of this kind.
    fn schema(&self) -> Arc<dyn Schema>;

    /// Attributes whose values are ids of other records in the same table.
    fn refs(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Resolves the kind of a stored row from its `type` attribute.
pub(crate) fn kind_of<K: EntityKind>(item: &Item) -> RecordResult<K> {
    match item.get(TYPE_ATTR) {
        Some(Value::String(tag)) => {
            K::from_discriminator(tag).ok_or_else(|| RecordError::UnknownType(tag.clone()))
        }
        Some(other) => Err(RecordError::InvalidData(format!(
            "discriminator must be a string, got {other}"
        ))),
        None => Err(RecordError::InvalidData("row has no type".to_string())),
    }
}
