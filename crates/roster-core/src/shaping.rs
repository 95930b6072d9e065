//! # Data Shaping
//!
//! Runtime field selection over any serializable DTO. A DTO is serialized to
//! a JSON object once; the requested properties are then picked out by name,
//! case-insensitively, in the order the client asked for them.

use crate::dto::{CompanyDto, EmployeeDto};
use serde::Serialize;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use uuid::Uuid;

/// A shaped representation: an ordered property bag.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Entity(Map<String, Value>);

impl Entity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// A shaped entity plus the identity of its source, so links can be built
/// even when `id` was not selected.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedEntity {
    pub id: Uuid,
    pub entity: Entity,
}

/// DTOs that can be shaped expose their identity.
pub trait Identified {
    fn identity(&self) -> Uuid;
}

impl Identified for EmployeeDto {
    fn identity(&self) -> Uuid {
        self.id.0
    }
}

impl Identified for CompanyDto {
    fn identity(&self) -> Uuid {
        self.id.0
    }
}

/// Field selector for one DTO type.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataShaper<T> {
    _marker: PhantomData<fn(&T)>,
}

impl<T: Serialize + Identified> DataShaper<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    /// Shape every entity with the same field list.
    pub fn shape_all<'a, I>(
        &self,
        entities: I,
        fields: Option<&str>,
    ) -> Result<Vec<ShapedEntity>, serde_json::Error>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        entities
            .into_iter()
            .map(|entity| self.shape(entity, fields))
            .collect()
    }

    /// Shape one entity. `None` or a blank list selects every property.
    pub fn shape(&self, entity: &T, fields: Option<&str>) -> Result<ShapedEntity, serde_json::Error> {
        let id = entity.identity();
        let properties = match serde_json::to_value(entity)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let requested = requested_fields(fields);
        let mut shaped = Entity::new();
        if requested.is_empty() {
            shaped.0 = properties;
        } else {
            for wanted in requested {
                let found = properties
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(wanted));
                if let Some((name, value)) = found {
                    if shaped.get(name).is_none() {
                        shaped.insert(name.clone(), value.clone());
                    }
                }
            }
        }
        Ok(ShapedEntity { id, entity: shaped })
    }
}

fn requested_fields(fields: Option<&str>) -> Vec<&str> {
    fields
        .map(|f| {
            f.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
