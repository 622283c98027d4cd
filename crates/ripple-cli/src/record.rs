//! JSON records as entities.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use ripple_hash::version_of_json;
use ripple_types::{Entity, EntityId, Section, Sections, Version};
use serde::Deserialize;
use serde_json::Value;

/// A JSON object keyed by its `"id"` field.
///
/// The version is the record's numeric `"version"` field when present,
/// otherwise a hash of the whole object.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    id: EntityId,
    version: Version,
    value: Value,
}

impl Record {
    pub fn from_value(value: Value) -> anyhow::Result<Self> {
        if !value.is_object() {
            bail!("expected a JSON object, found {value}");
        }
        let id = match value.get("id") {
            Some(raw) => EntityId::deserialize(raw)
                .with_context(|| format!("unsupported id {raw}"))?,
            None => bail!("record has no \"id\" field: {value}"),
        };
        let version = match value.get("version").and_then(Value::as_u64) {
            Some(explicit) => Version::new(explicit),
            None => version_of_json(&value)?,
        };
        Ok(Self { id, version, value })
    }
}

impl Entity for Record {
    type Id = EntityId;
    type Version = Version;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn version(&self) -> Version {
        self.version
    }
}

#[derive(Deserialize)]
struct RawSection {
    id: EntityId,
    #[serde(default)]
    items: Vec<Value>,
}

pub fn read_json(path: &Path) -> anyhow::Result<Value> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

/// Records from a JSON array of objects.
pub fn records_from(values: Vec<Value>) -> anyhow::Result<Vec<Record>> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| Record::from_value(value).with_context(|| format!("record {i}")))
        .collect()
}

pub fn load_records(path: &Path) -> anyhow::Result<Vec<Record>> {
    let values: Vec<Value> = serde_json::from_value(read_json(path)?)
        .with_context(|| format!("{} is not a JSON array", path.display()))?;
    records_from(values).with_context(|| format!("in {}", path.display()))
}

/// Sections from a JSON array of `{"id": ..., "items": [...]}` objects.
pub fn load_sections(path: &Path) -> anyhow::Result<Sections<EntityId, Record>> {
    let raw: Vec<RawSection> = serde_json::from_value(read_json(path)?)
        .with_context(|| format!("{} is not a JSON array of sections", path.display()))?;
    raw.into_iter()
        .map(|section| {
            let items = records_from(section.items)
                .with_context(|| format!("section {} in {}", section.id, path.display()))?;
            Ok(Section::new(section.id, items))
        })
        .collect()
}
