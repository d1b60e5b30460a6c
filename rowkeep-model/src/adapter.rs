use crate::ValidationError;
use async_trait::async_trait;
use rowkeep_types::Item;

/// Normalizes and checks attribute bags before they reach the table.
///
/// `parse` applies defaults and coercions and must not reject a bag for being
/// incomplete; that is `validate`'s job. Records call `parse` once at
/// construction and `validate` before every persisted write.
#[async_trait]
pub trait Schema: Send + Sync {
    /// Returns the normalized form of `raw`.
    async fn parse(&self, raw: Item) -> Result<Item, ValidationError>;

    /// Accepts or rejects a normalized bag.
    async fn validate(&self, bag: &Item) -> Result<(), ValidationError>;
}

/// Schema with no fields: parse is the identity and every bag is valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveSchema;

#[async_trait]
impl Schema for PermissiveSchema {
    async fn parse(&self, raw: Item) -> Result<Item, ValidationError> {
        Ok(raw)
    }

    async fn validate(&self, _bag: &Item) -> Result<(), ValidationError> {
        Ok(())
    }
}
