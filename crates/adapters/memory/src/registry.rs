//! Entity registry bookkeeping: unique ids to entity ids.

use mitmlight_app::ports::RegistryEntry;
use mitmlight_domain::id::{DeviceId, LinkId};

use crate::error::MemoryHostError;

/// One registered entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRecord {
    pub entity_id: String,
    pub domain: String,
    pub platform: String,
    pub unique_id: String,
    pub config_entry_id: Option<LinkId>,
    pub device_id: Option<DeviceId>,
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    records: Vec<RegistryRecord>,
}

impl Registry {
    /// Register `entry`, keeping the entity id of an earlier registration
    /// of the same unique id.
    ///
    /// New entity ids are `{domain}.{slug}`, suffixed `_2`, `_3`… while
    /// `is_taken` reports a clash.
    pub(crate) fn register(
        &mut self,
        entry: RegistryEntry,
        is_taken: impl Fn(&str) -> bool,
    ) -> Result<String, MemoryHostError> {
        if let Some(record) = self
            .records
            .iter_mut()
            .find(|record| record.unique_id == entry.unique_id)
        {
            record.config_entry_id = entry.config_entry_id;
            record.device_id = entry.device_id;
            return Ok(record.entity_id.clone());
        }

        let slug = slugify(&entry.suggested_name);
        if slug.is_empty() {
            return Err(MemoryHostError::EmptySlug(entry.suggested_name));
        }
        let base = format!("{}.{slug}", entry.domain);
        let clashes = |candidate: &str| {
            is_taken(candidate) || self.records.iter().any(|r| r.entity_id == candidate)
        };
        let mut entity_id = base.clone();
        let mut suffix = 2;
        while clashes(&entity_id) {
            entity_id = format!("{base}_{suffix}");
            suffix += 1;
        }

        self.records.push(RegistryRecord {
            entity_id: entity_id.clone(),
            domain: entry.domain,
            platform: entry.platform,
            unique_id: entry.unique_id,
            config_entry_id: entry.config_entry_id,
            device_id: entry.device_id,
        });
        Ok(entity_id)
    }

    /// Record an entity whose id is fixed by its integration.
    pub(crate) fn push_fixed(&mut self, record: RegistryRecord) {
        self.records.push(record);
    }

    pub(crate) fn by_unique_id(&self, unique_id: &str) -> Option<&RegistryRecord> {
        self.records.iter().find(|record| record.unique_id == unique_id)
    }

    pub(crate) fn by_entity_id(&self, entity_id: &str) -> Option<&RegistryRecord> {
        self.records.iter().find(|record| record.entity_id == entity_id)
    }

    /// Drop every record owned by `entry_id`, returning their entity ids.
    pub(crate) fn remove_config_entry(&mut self, entry_id: LinkId) -> Vec<String> {
        let (removed, kept) = std::mem::take(&mut self.records)
            .into_iter()
            .partition(|record| record.config_entry_id == Some(entry_id));
        self.records = kept;
        removed.into_iter().map(|record| record.entity_id).collect()
    }

    pub(crate) fn records(&self) -> &[RegistryRecord] {
        &self.records
    }
}

/// `Desk Lamp (2)` → `desk_lamp_2`.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}
