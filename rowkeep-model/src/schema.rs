use crate::{Schema, ValidationError};
use async_trait::async_trait;
use rowkeep_types::{Item, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declarative schema: a list of typed fields, optionally closed to
/// undeclared keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntitySchema {
    pub fields: Vec<FieldSpec>,
    /// Reject (on validate) and drop (on parse) keys not listed in `fields`.
    #[serde(default)]
    pub strict: bool,
}

impl EntitySchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self {
            fields,
            strict: false,
        }
    }

    /// Closes the schema to undeclared keys.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn is_declared(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// A single declared attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    /// Applied by `parse` when the attribute is absent or null.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Allowed values. Only meaningful when the type is `Enum`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(alias = "options")]
    pub enum_options: Option<Vec<String>>,
}

impl FieldSpec {
    fn simple(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            default: None,
            enum_options: None,
        }
    }

    pub fn text(name: &str) -> Self {
        Self::simple(name, FieldType::Text)
    }

    pub fn number(name: &str) -> Self {
        Self::simple(name, FieldType::Number)
    }

    pub fn bool(name: &str) -> Self {
        Self::simple(name, FieldType::Bool)
    }

    /// Array of strings.
    pub fn tag(name: &str) -> Self {
        Self::simple(name, FieldType::Tag)
    }

    /// Holds another record's id.
    pub fn relation(name: &str) -> Self {
        Self::simple(name, FieldType::Relation)
    }

    pub fn datetime(name: &str) -> Self {
        Self::simple(name, FieldType::DateTime)
    }

    pub fn json(name: &str) -> Self {
        Self::simple(name, FieldType::Json)
    }

    /// String restricted to a fixed set of options.
    pub fn enumeration(name: &str, options: Vec<String>) -> Self {
        Self {
            enum_options: Some(options),
            ..Self::simple(name, FieldType::Enum)
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    fn coerce(&self, value: Value) -> Value {
        match (self.field_type, value) {
            (FieldType::Number, Value::String(s)) => match s.trim().parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => match s.trim().parse::<f64>() {
                    Ok(f) if f.is_finite() => Value::from(f),
                    _ => Value::String(s),
                },
            },
            (FieldType::Bool, Value::String(s)) => match s.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(s),
            },
            (FieldType::Text | FieldType::Relation | FieldType::Enum, Value::Number(n)) => {
                Value::String(n.to_string())
            }
            (FieldType::Text | FieldType::Relation | FieldType::Enum, Value::Bool(b)) => {
                Value::String(b.to_string())
            }
            (FieldType::Tag, Value::String(s)) => Value::Array(vec![Value::String(s)]),
            (_, v) => v,
        }
    }

    fn check(&self, value: &Value) -> Result<(), String> {
        let ok = match self.field_type {
            FieldType::Text | FieldType::Relation => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Bool => value.is_boolean(),
            FieldType::Tag => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            FieldType::DateTime => Timestamp::from_value(value).is_ok(),
            FieldType::Json => true,
            FieldType::Enum => {
                let Some(s) = value.as_str() else {
                    return Err("expected string".to_string());
                };
                return match &self.enum_options {
                    Some(options) if !options.iter().any(|o| o == s) => {
                        Err(format!("'{s}' is not one of [{}]", options.join(", ")))
                    }
                    _ => Ok(()),
                };
            }
        };
        if ok {
            Ok(())
        } else {
            Err(format!("expected {}", self.field_type.describe()))
        }
    }
}

/// The data type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Number,
    Bool,
    Tag,
    Relation,
    DateTime,
    Json,
    Enum,
}

impl FieldType {
    fn describe(self) -> &'static str {
        match self {
            Self::Text | Self::Relation | Self::Enum => "string",
            Self::Number => "number",
            Self::Bool => "boolean",
            Self::Tag => "array of strings",
            Self::DateTime => "RFC 3339 date or epoch milliseconds",
            Self::Json => "any JSON value",
        }
    }
}

#[async_trait]
impl Schema for EntitySchema {
    async fn parse(&self, raw: Item) -> Result<Item, ValidationError> {
        let mut bag = Item::new();
        for (name, value) in raw {
            match self.field(&name) {
                Some(spec) => {
                    bag.insert(name, spec.coerce(value));
                }
                None if self.strict => {}
                None => {
                    bag.insert(name, value);
                }
            }
        }
        for spec in &self.fields {
            let missing = bag.get(&spec.name).is_none_or(Value::is_null);
            if let (true, Some(default)) = (missing, &spec.default) {
                bag.insert(spec.name.clone(), default.clone());
            }
        }
        Ok(bag)
    }

    async fn validate(&self, bag: &Item) -> Result<(), ValidationError> {
        let mut errors = ValidationError::default();
        for spec in &self.fields {
            match bag.get(&spec.name) {
                None | Some(Value::Null) if spec.required => {
                    errors.push(&spec.name, "is required");
                }
                None | Some(Value::Null) => {}
                Some(value) => {
                    if let Err(message) = spec.check(value) {
                        errors.push(&spec.name, message);
                    }
                }
            }
        }
        if self.strict {
            for name in bag.keys().filter(|k| !self.is_declared(k)) {
                errors.push(name, "is not declared by the schema");
            }
        }
        errors.into_result()
    }
}
