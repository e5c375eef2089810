//! Section manager: lazy creation and identity sharing of metadata.
//!
//! Every entity owns at most one section, created only when the source
//! object carries something worth storing. Entities that must come back as
//! one Neo object (the per-channel arrays of a signal, the channels of a
//! group) are handed the *same* `Arc`, and that pointer identity is the only
//! thing the reverse mapper uses to regroup them.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::neo::{Annotations, Quantity};
use crate::nix::{Property, Section, SectionRef, TypeTag, Value};
use crate::{Error, Result};

use super::EntityPath;

/// Property keys written by the mappers. Annotations may not use them.
pub const RESERVED_KEYS: [&str; 8] = [
    "file_origin",
    "file_datetime",
    "t_start",
    "t_stop",
    "left_sweep",
    "sampling_rate",
    "coordinates",
    "coordinates.units",
];

// ============================================================================
// Attributes (write side)
// ============================================================================

/// Candidate properties for a section. Unset inputs are skipped, so an
/// `Attributes` built from an object with nothing to say stays empty.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    entries: Vec<(String, Property)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text attribute; `None` and empty strings are skipped.
    pub fn text(mut self, key: &str, value: Option<&str>) -> Self {
        if let Some(text) = value.filter(|t| !t.is_empty()) {
            self.entries.push((key.to_owned(), Property::new(text)));
        }
        self
    }

    pub fn quantity(mut self, key: &str, value: Option<&Quantity>) -> Self {
        if let Some(q) = value {
            let property = if q.unit.is_empty() {
                Property::new(q.value)
            } else {
                Property::with_unit(q.value, q.unit.as_str())
            };
            self.entries.push((key.to_owned(), property));
        }
        self
    }

    pub fn datetime(mut self, key: &str, value: Option<NaiveDateTime>) -> Self {
        if let Some(dt) = value {
            self.entries.push((key.to_owned(), Property::new(dt)));
        }
        self
    }

    /// Per-channel positions as two parallel nested lists: `coordinates`
    /// holds the magnitudes and `coordinates.units` the unit strings.
    pub fn coordinates(mut self, coordinates: &[Vec<Quantity>]) -> Self {
        if coordinates.is_empty() {
            return self;
        }
        let values = coordinates
            .iter()
            .map(|channel| Value::List(channel.iter().map(|q| Value::Float(q.value)).collect()))
            .collect();
        let units = coordinates
            .iter()
            .map(|channel| Value::List(channel.iter().map(|q| Value::from(q.unit.as_str())).collect()))
            .collect();
        self.entries.push(("coordinates".to_owned(), Property::new(Value::List(values))));
        self.entries.push(("coordinates.units".to_owned(), Property::new(Value::List(units))));
        self
    }

    /// Every annotation becomes a property of the same name.
    pub fn annotations(mut self, annotations: &Annotations) -> Self {
        for (key, value) in annotations {
            self.entries.push((key.clone(), Property::new(value.clone())));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reject annotations that would shadow a property the mappers own.
pub fn check_annotations(path: &EntityPath, annotations: &Annotations) -> Result<()> {
    match annotations.keys().find(|k| RESERVED_KEYS.contains(&k.as_str())) {
        Some(key) => Err(Error::ReservedAnnotation { path: path.clone(), key: key.clone() }),
        None => Ok(()),
    }
}

// ============================================================================
// SectionManager
// ============================================================================

/// Creates and hands out metadata sections for one mapping run.
#[derive(Debug, Default)]
pub struct SectionManager {
    created: usize,
    shared: usize,
}

impl SectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// A section named `owner_name` holding `attrs`, or `None` when there is
    /// nothing to hold.
    pub fn get_or_create(
        &mut self,
        owner_name: &str,
        owner_tag: TypeTag,
        attrs: Attributes,
    ) -> Option<SectionRef> {
        if attrs.is_empty() {
            return None;
        }
        Some(self.ensure(owner_name, owner_tag, attrs))
    }

    /// Like [`get_or_create`](Self::get_or_create) but always returns a
    /// section, for owners whose grouping depends on having one.
    pub fn ensure(&mut self, owner_name: &str, owner_tag: TypeTag, attrs: Attributes) -> SectionRef {
        let mut section = Section::new(owner_name, owner_tag.metadata_tag());
        for (key, property) in attrs.entries {
            section.properties.insert(key, property);
        }
        self.created += 1;
        tracing::trace!(owner = owner_name, properties = section.len(), "Created metadata section");
        Arc::new(section)
    }

    /// Hand `existing` to another owner. The returned handle is the same
    /// allocation, never a copy.
    pub fn share(&mut self, existing: &SectionRef, new_owner: &str) -> SectionRef {
        self.shared += 1;
        tracing::trace!(section = %existing.name, owner = new_owner, "Sharing metadata section");
        Arc::clone(existing)
    }

    /// Number of sections created so far.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Number of extra owners handed an existing section.
    pub fn shared(&self) -> usize {
        self.shared
    }
}

// ============================================================================
// MetadataView (read side)
// ============================================================================

/// Typed read access to an optional section, reporting malformed reserved
/// properties against the owning entity's path.
pub struct MetadataView<'a> {
    section: Option<&'a Section>,
    path: &'a EntityPath,
}

impl<'a> MetadataView<'a> {
    pub fn new(section: Option<&'a SectionRef>, path: &'a EntityPath) -> Self {
        Self { section: section.map(|s| s.as_ref()), path }
    }

    fn property(&self, key: &str) -> Option<&'a Property> {
        self.section.and_then(|s| s.get(key))
    }

    fn wrong_type(&self, key: &str, expected: &str, got: &Value) -> Error {
        Error::unrecognized(
            self.path,
            format!("metadata property '{key}' should be {expected}, found {}", got.type_name()),
        )
    }

    pub fn text(&self, key: &str) -> Result<Option<String>> {
        match self.property(key) {
            None => Ok(None),
            Some(p) => match &p.value {
                Value::String(s) => Ok(Some(s.clone())),
                other => Err(self.wrong_type(key, "a string", other)),
            },
        }
    }

    pub fn datetime(&self, key: &str) -> Result<Option<NaiveDateTime>> {
        match self.property(key) {
            None => Ok(None),
            Some(p) => p
                .value
                .as_datetime()
                .map(Some)
                .ok_or_else(|| self.wrong_type(key, "a datetime", &p.value)),
        }
    }

    pub fn quantity(&self, key: &str) -> Result<Option<Quantity>> {
        match self.property(key) {
            None => Ok(None),
            Some(p) => {
                let value = p
                    .value
                    .as_float()
                    .ok_or_else(|| self.wrong_type(key, "numeric", &p.value))?;
                Ok(Some(Quantity::new(value, p.unit.clone().unwrap_or_default())))
            }
        }
    }

    /// Channel coordinates written by [`Attributes::coordinates`]. Both
    /// lists must be present and have the same nested shape.
    pub fn coordinates(&self) -> Result<Vec<Vec<Quantity>>> {
        let (values, units) = match (self.property("coordinates"), self.property("coordinates.units")) {
            (None, None) => return Ok(Vec::new()),
            (Some(values), Some(units)) => (&values.value, &units.value),
            _ => {
                return Err(Error::unrecognized(
                    self.path,
                    "'coordinates' and 'coordinates.units' must be stored together",
                ));
            }
        };
        let (Value::List(values), Value::List(units)) = (values, units) else {
            return Err(Error::unrecognized(self.path, "channel coordinates are not lists"));
        };
        if values.len() != units.len() {
            return Err(Error::unrecognized(
                self.path,
                format!("{} coordinate entries but {} unit entries", values.len(), units.len()),
            ));
        }

        values
            .iter()
            .zip(units)
            .map(|pair| match pair {
                (Value::List(values), Value::List(units)) if values.len() == units.len() => values
                    .iter()
                    .zip(units)
                    .map(|(value, unit)| match (value.as_float(), unit.as_str()) {
                        (Some(value), Some(unit)) => Ok(Quantity::new(value, unit)),
                        _ => Err(Error::unrecognized(
                            self.path,
                            format!("coordinate {value} with unit {unit} is not a quantity"),
                        )),
                    })
                    .collect::<Result<Vec<_>>>(),
                _ => Err(Error::unrecognized(self.path, "coordinate and unit lists differ in shape")),
            })
            .collect()
    }

    pub fn required_quantity(&self, key: &str) -> Result<Quantity> {
        self.quantity(key)?
            .ok_or_else(|| Error::unrecognized(self.path, format!("metadata lacks required property '{key}'")))
    }

    /// Every non-reserved property, as Neo annotations.
    pub fn annotations(&self) -> Annotations {
        self.section
            .map(|s| {
                s.iter()
                    .filter(|(k, _)| !RESERVED_KEYS.contains(k))
                    .map(|(k, p)| (k.to_owned(), p.value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::PathKind;

    #[test]
    fn test_empty_attributes_create_nothing() {
        let mut mgr = SectionManager::new();
        let attrs = Attributes::new().text("file_origin", None).text("file_origin", Some(""));
        assert!(attrs.is_empty());
        assert!(mgr.get_or_create("sig", TypeTag::AnalogSignal, attrs).is_none());
        assert_eq!(mgr.created(), 0);
    }

    #[test]
    fn test_section_named_after_owner() {
        let mut mgr = SectionManager::new();
        let attrs = Attributes::new().text("file_origin", Some("rec.abf"));
        let section = mgr.get_or_create("lfp.0", TypeTag::AnalogSignal, attrs).unwrap();
        assert_eq!(section.name, "lfp.0");
        assert_eq!(section.type_tag, "neo.analogsignal.metadata");
        assert_eq!(section.value("file_origin").and_then(Value::as_str), Some("rec.abf"));
    }

    #[test]
    fn test_share_returns_same_allocation() {
        let mut mgr = SectionManager::new();
        let section = mgr.ensure("lfp.0", TypeTag::AnalogSignal, Attributes::new());
        let shared = mgr.share(&section, "lfp.1");
        assert!(Arc::ptr_eq(&section, &shared));
        assert_eq!(mgr.created(), 1);
        assert_eq!(mgr.shared(), 1);
    }

    #[test]
    fn test_reserved_annotation_rejected() {
        let path = EntityPath::root(PathKind::Block, "b");
        let mut ann = Annotations::new();
        ann.insert("t_stop".into(), Value::Float(1.0));
        let err = check_annotations(&path, &ann).unwrap_err();
        assert!(matches!(err, Error::ReservedAnnotation { ref key, .. } if key == "t_stop"));
    }

    #[test]
    fn test_view_reads_back_quantities_and_annotations() {
        let path = EntityPath::root(PathKind::Region, "st");
        let mut ann = Annotations::new();
        ann.insert("quality".into(), Value::from("good"));
        let mut mgr = SectionManager::new();
        let section = mgr.ensure(
            "st",
            TypeTag::SpikeTrain,
            Attributes::new()
                .quantity("t_stop", Some(&Quantity::new(2.5, "s")))
                .annotations(&ann),
        );
        let view = MetadataView::new(Some(&section), &path);
        assert_eq!(view.required_quantity("t_stop").unwrap(), Quantity::new(2.5, "s"));
        assert!(view.quantity("left_sweep").unwrap().is_none());
        assert!(view.required_quantity("t_start").is_err());
        assert_eq!(view.annotations(), ann);
    }

    #[test]
    fn test_coordinates_read_back() {
        let path = EntityPath::root(PathKind::Source, "g");
        let coordinates = vec![
            vec![Quantity::new(1.0, "cm"), Quantity::new(2.0, "cm")],
            vec![Quantity::new(1.0, "cm"), Quantity::new(250.0, "um")],
        ];
        let mut mgr = SectionManager::new();
        let attrs = Attributes::new().coordinates(&coordinates);
        assert_eq!(attrs.len(), 2);
        let section = mgr.ensure("g", TypeTag::RecordingChannelGroup, attrs);

        let view = MetadataView::new(Some(&section), &path);
        assert_eq!(view.coordinates().unwrap(), coordinates);
        assert!(view.annotations().is_empty());
        assert!(Attributes::new().coordinates(&[]).is_empty());
    }

    #[test]
    fn test_coordinates_without_units_rejected() {
        let path = EntityPath::root(PathKind::Source, "g");
        let section: SectionRef = Arc::new(
            Section::new("g", "neo.recordingchannelgroup.metadata")
                .with_property("coordinates", Property::new(Value::List(vec![Value::from(vec![1.0])]))),
        );
        let view = MetadataView::new(Some(&section), &path);
        assert!(matches!(view.coordinates(), Err(Error::UnrecognizedEntity { .. })));
    }

    #[test]
    fn test_view_rejects_mistyped_reserved_property() {
        let path = EntityPath::root(PathKind::Block, "b");
        let section: SectionRef = Arc::new(
            Section::new("b", "neo.block.metadata").with_property("file_origin", Property::new(3)),
        );
        let view = MetadataView::new(Some(&section), &path);
        assert!(matches!(view.text("file_origin"), Err(Error::UnrecognizedEntity { .. })));
    }
}
