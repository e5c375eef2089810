//! Metadata sections: flat property bags shared by reference.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Value;

/// A single metadata property: a value with an optional physical unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Property {
    pub fn new(value: impl Into<Value>) -> Self {
        Self { value: value.into(), unit: None }
    }

    pub fn with_unit(value: impl Into<Value>, unit: impl Into<String>) -> Self {
        Self { value: value.into(), unit: Some(unit.into()) }
    }
}

/// A metadata section.
///
/// Sections are immutable once built and always handled through
/// [`SectionRef`]. Several entities may hold the same section; whether two
/// entities share metadata is decided with [`Arc::ptr_eq`], never by
/// comparing property bags.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub type_tag: String,
    pub properties: BTreeMap<String, Property>,
}

/// Shared handle to a [`Section`].
pub type SectionRef = Arc<Section>;

impl Section {
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, property: Property) -> Self {
        self.properties.insert(key.into(), property);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.properties.get(key).map(|p| &p.value)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.properties.iter().map(|(k, p)| (k.as_str(), p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_not_value_equality() {
        let a: SectionRef = Arc::new(Section::new("sig", "neo.analogsignal.metadata"));
        let b: SectionRef = Arc::new(Section::new("sig", "neo.analogsignal.metadata"));
        assert_eq!(*a, *b);
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &Arc::clone(&a)));
    }

    #[test]
    fn test_property_lookup() {
        let s = Section::new("st", "neo.spiketrain.metadata")
            .with_property("t_stop", Property::with_unit(10.0, "s"));
        assert_eq!(s.value("t_stop").and_then(Value::as_float), Some(10.0));
        assert_eq!(s.get("t_stop").and_then(|p| p.unit.as_deref()), Some("s"));
        assert!(s.get("t_start").is_none());
        assert_eq!(s.len(), 1);
    }
}
