//! Domain types declared from a field-to-payload mapping.
//!
//! Instances keep their data under payload (wire) keys, so serializing one
//! produces the wire format directly. Accessors are looked up by field key.

use crate::core::namespace::Namespace;
use crate::utils::error::{CarpeError, Result};
use indexmap::IndexMap;
use serde::de::{DeserializeSeed, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::rc::Rc;

/// The `parameters` table of a definition: field key to payload key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainMapping {
    pub parameters: IndexMap<String, String>,
}

impl DomainMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field_key: impl Into<String>, payload_key: impl Into<String>) -> Self {
        self.parameters.insert(field_key.into(), payload_key.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for DomainMapping
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            parameters: iter
                .into_iter()
                .map(|(field, payload)| (field.into(), payload.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub field_key: String,
    pub payload_key: String,
}

/// A generated getter: reads one payload key of an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    name: String,
    field_key: String,
    payload_key: String,
}

impl Accessor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_key(&self) -> &str {
        &self.field_key
    }

    pub fn payload_key(&self) -> &str {
        &self.payload_key
    }

    pub fn get<'a>(&self, object: &'a DomainObject) -> Option<&'a Value> {
        object.values.get(&self.payload_key)
    }

    pub fn get_or(&self, object: &DomainObject, default: Value) -> Value {
        self.get(object).cloned().unwrap_or(default)
    }
}

/// `title` => `getTitle`
pub fn getter_name(field_key: &str) -> String {
    let mut chars = field_key.chars();
    match chars.next() {
        Some(first) => format!("get{}{}", first.to_uppercase(), chars.as_str()),
        None => "get".to_string(),
    }
}

pub struct DomainType {
    name: String,
    fields: Vec<FieldDescriptor>,
    field_to_payload: IndexMap<String, String>,
    payload_to_field: IndexMap<String, String>,
    accessors: IndexMap<String, Accessor>,
}

impl DomainType {
    pub fn new(name: impl Into<String>, mapping: &DomainMapping) -> Rc<Self> {
        let name = name.into();
        let mut fields = Vec::with_capacity(mapping.parameters.len());
        let mut field_to_payload = IndexMap::new();
        let mut payload_to_field = IndexMap::new();
        let mut accessors = IndexMap::new();

        for (field_key, payload_key) in &mapping.parameters {
            if let Some(previous) = payload_to_field.insert(payload_key.clone(), field_key.clone()) {
                tracing::warn!(
                    domain = %name,
                    payload_key = %payload_key,
                    "payload key mapped by both '{}' and '{}', keeping '{}'",
                    previous,
                    field_key,
                    field_key
                );
            }
            field_to_payload.insert(field_key.clone(), payload_key.clone());
            fields.push(FieldDescriptor {
                field_key: field_key.clone(),
                payload_key: payload_key.clone(),
            });

            let accessor = Accessor {
                name: getter_name(field_key),
                field_key: field_key.clone(),
                payload_key: payload_key.clone(),
            };
            accessors.insert(accessor.name.clone(), accessor);
        }

        Rc::new(Self {
            name,
            fields,
            field_to_payload,
            payload_to_field,
            accessors,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn payload_key(&self, field_key: &str) -> Option<&str> {
        self.field_to_payload.get(field_key).map(String::as_str)
    }

    pub fn field_key(&self, payload_key: &str) -> Option<&str> {
        self.payload_to_field.get(payload_key).map(String::as_str)
    }

    pub fn accessor(&self, getter: &str) -> Option<&Accessor> {
        self.accessors.get(getter)
    }

    pub fn accessors(&self) -> impl Iterator<Item = &Accessor> {
        self.accessors.values()
    }

    /// The declared mapping, in declaration order.
    pub fn parameters(&self) -> Map<String, Value> {
        self.field_to_payload
            .iter()
            .map(|(field, payload)| (field.clone(), Value::String(payload.clone())))
            .collect()
    }

    pub fn empty(self: &Rc<Self>) -> DomainObject {
        DomainObject {
            domain: Rc::clone(self),
            values: Map::new(),
        }
    }

    /// Builds an instance from payload and/or model records. Model entries
    /// are applied last and win on collision; undeclared keys are dropped.
    pub fn construct(self: &Rc<Self>, options: ConstructOptions) -> DomainObject {
        let mut object = self.empty();

        if let Some(mut payload) = options.payload {
            for payload_key in self.payload_to_field.keys() {
                if let Some(value) = payload.remove(payload_key) {
                    object.values.insert(payload_key.clone(), value);
                }
            }
        }

        if let Some(mut model) = options.model {
            for (field_key, payload_key) in &self.field_to_payload {
                if let Some(value) = model.remove(field_key) {
                    object.values.insert(payload_key.clone(), value);
                }
            }
        }

        object
    }

    pub fn from_payload(self: &Rc<Self>, payload: &Value) -> Result<DomainObject> {
        let payload = expect_object("payload", payload)?;
        Ok(self.construct(ConstructOptions::default().with_payload(payload)))
    }

    pub fn from_model(self: &Rc<Self>, model: &Value) -> Result<DomainObject> {
        let model = expect_object("model", model)?;
        Ok(self.construct(ConstructOptions::default().with_model(model)))
    }

    /// Seed for decoding wire data straight into an instance of this type.
    pub fn payload_seed(self: &Rc<Self>) -> PayloadSeed {
        PayloadSeed(Rc::clone(self))
    }
}

impl fmt::Debug for DomainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainType")
            .field("name", &self.name)
            .field("parameters", &self.field_to_payload)
            .finish()
    }
}

fn expect_object(what: &str, value: &Value) -> Result<Map<String, Value>> {
    value
        .as_object()
        .cloned()
        .ok_or_else(|| CarpeError::invalid_argument(format!("{what} argument is not an object")))
}

#[derive(Debug, Clone, Default)]
pub struct ConstructOptions {
    pub payload: Option<Map<String, Value>>,
    pub model: Option<Map<String, Value>>,
}

impl ConstructOptions {
    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_model(mut self, model: Map<String, Value>) -> Self {
        self.model = Some(model);
        self
    }
}

pub struct PayloadSeed(Rc<DomainType>);

impl<'de> DeserializeSeed<'de> for PayloadSeed {
    type Value = DomainObject;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        let payload = Map::<String, Value>::deserialize(deserializer)?;
        Ok(self.0.construct(ConstructOptions::default().with_payload(payload)))
    }
}

#[derive(Clone)]
pub struct DomainObject {
    domain: Rc<DomainType>,
    values: Map<String, Value>,
}

impl DomainObject {
    pub fn domain_type(&self) -> &Rc<DomainType> {
        &self.domain
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The stored entries, keyed by payload key.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Value of a declared field, `None` when absent or undeclared.
    pub fn get(&self, field_key: &str) -> Option<&Value> {
        let payload_key = self.domain.payload_key(field_key)?;
        self.values.get(payload_key)
    }

    pub fn get_or(&self, field_key: &str, default: Value) -> Value {
        self.get(field_key).cloned().unwrap_or(default)
    }

    /// Calls a generated getter such as `getTitle`.
    pub fn call(&self, getter: &str, default: Option<Value>) -> Result<Option<Value>> {
        let accessor = self
            .domain
            .accessor(getter)
            .ok_or_else(|| CarpeError::UnknownGetter {
                type_name: self.domain.name.clone(),
                getter: getter.to_string(),
            })?;
        Ok(accessor.get(self).cloned().or(default))
    }

    pub fn to_payload(&self) -> Value {
        Value::Object(self.values.clone())
    }

    /// Entries renamed back to field keys.
    pub fn to_model(&self) -> Map<String, Value> {
        self.values
            .iter()
            .filter_map(|(payload_key, value)| {
                self.domain
                    .field_key(payload_key)
                    .map(|field_key| (field_key.to_string(), value.clone()))
            })
            .collect()
    }
}

impl PartialEq for DomainObject {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.domain, &other.domain) && self.values == other.values
    }
}

impl fmt::Debug for DomainObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(&self.domain.name)
            .field("payload", &self.values)
            .finish()
    }
}

impl Serialize for DomainObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

/// Declares `type_name` in `target` and returns the new type.
pub fn define(
    target: &Namespace,
    type_name: &str,
    mapping: &DomainMapping,
) -> Rc<DomainType> {
    let domain = DomainType::new(type_name, mapping);
    if target.insert(type_name, Rc::clone(&domain)).is_some() {
        tracing::debug!(domain = type_name, "replacing existing member");
    }
    tracing::debug!(
        domain = type_name,
        fields = domain.fields.len(),
        "domain type defined"
    );
    domain
}
