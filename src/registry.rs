//! Registry of loaded component descriptions
//!
//! Owned by the host application and handed to whatever needs to look
//! descriptions up; there is no process-wide instance.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::description::{ComponentConfiguration, ComponentDescription};
use crate::log::warn;

/// Descriptions indexed by id and GUID.
#[derive(Debug, Clone, Default)]
pub struct DescriptionRegistry {
    descriptions: Vec<Arc<ComponentDescription>>,
    by_id: HashMap<String, usize>,
    by_guid: HashMap<Uuid, usize>,
}

impl DescriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a description. A description whose id or GUID is already
    /// registered replaces the earlier one.
    pub fn register(&mut self, description: Arc<ComponentDescription>) {
        let existing = self
            .by_id
            .get(description.id())
            .copied()
            .or_else(|| description.metadata().guid.and_then(|g| self.by_guid.get(&g).copied()));

        let index = match existing {
            Some(index) => {
                warn!("replacing component description `{}`", description.id());
                let old = &self.descriptions[index];
                self.by_id.remove(old.id());
                if let Some(guid) = old.metadata().guid {
                    self.by_guid.remove(&guid);
                }
                self.descriptions[index] = Arc::clone(&description);
                index
            }
            None => {
                self.descriptions.push(Arc::clone(&description));
                self.descriptions.len() - 1
            }
        };

        self.by_id.insert(description.id().to_string(), index);
        if let Some(guid) = description.metadata().guid {
            self.by_guid.insert(guid, index);
        }
    }

    pub fn get(&self, id: &str) -> Option<&Arc<ComponentDescription>> {
        self.by_id.get(id).map(|&i| &self.descriptions[i])
    }

    pub fn get_by_guid(&self, guid: &Uuid) -> Option<&Arc<ComponentDescription>> {
        self.by_guid.get(guid).map(|&i| &self.descriptions[i])
    }

    /// The description and configuration implementing `item` of
    /// `implement_set`. A description that itself declares the item is
    /// returned without a configuration.
    pub fn find_implementation(
        &self,
        implement_set: &str,
        item: &str,
    ) -> Option<(&Arc<ComponentDescription>, Option<&ComponentConfiguration>)> {
        self.descriptions.iter().find_map(|description| {
            let metadata = description.metadata();
            if metadata.implement_set.as_deref() != Some(implement_set) {
                return None;
            }
            if metadata.implement_item.as_deref() == Some(item) {
                return Some((description, None));
            }
            description
                .find_implementation(implement_set, item)
                .map(|configuration| (description, Some(configuration)))
        })
    }

    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ComponentDescription>> {
        self.descriptions.iter()
    }
}

impl Extend<Arc<ComponentDescription>> for DescriptionRegistry {
    fn extend<T: IntoIterator<Item = Arc<ComponentDescription>>>(&mut self, iter: T) {
        for description in iter {
            self.register(description);
        }
    }
}

impl FromIterator<Arc<ComponentDescription>> for DescriptionRegistry {
    fn from_iter<T: IntoIterator<Item = Arc<ComponentDescription>>>(iter: T) -> Self {
        let mut registry = DescriptionRegistry::new();
        registry.extend(iter);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUID: &str = "4d8f3f7a-2d0e-4bb6-9b61-3c6a0e8e6b10";

    fn description(id: &str, guid: Option<&str>) -> ComponentDescription {
        let mut d = ComponentDescription::new(id, id);
        d.metadata.guid = guid.map(|g| Uuid::parse_str(g).unwrap());
        d
    }

    #[test]
    fn lookup_by_id_and_guid() {
        let registry: DescriptionRegistry = [
            Arc::new(description("resistor", Some(GUID))),
            Arc::new(description("capacitor", None)),
        ]
        .into_iter()
        .collect();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("capacitor").map(|d| d.id()), Some("capacitor"));
        let guid = Uuid::parse_str(GUID).unwrap();
        assert_eq!(registry.get_by_guid(&guid).map(|d| d.id()), Some("resistor"));
        assert!(registry.get("inductor").is_none());
    }

    #[test]
    fn registering_same_guid_replaces() {
        let mut registry = DescriptionRegistry::new();
        registry.register(Arc::new(description("resistor", Some(GUID))));
        registry.register(Arc::new(description("resistor2", Some(GUID))));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("resistor").is_none());
        assert!(registry.get("resistor2").is_some());
    }

    #[test]
    fn implementation_lookup() {
        let mut own = description("ground", None);
        own.metadata.implement_set = Some("std".into());
        own.metadata.implement_item = Some("ground".into());

        let mut bjt = description("bjt", None);
        bjt.metadata.implement_set = Some("std".into());
        let mut pnp = ComponentConfiguration::new("PNP");
        pnp.implements = Some("pnp".into());
        bjt.metadata.configurations.push(pnp);

        let registry: DescriptionRegistry = [Arc::new(own), Arc::new(bjt)].into_iter().collect();

        let (d, c) = registry.find_implementation("std", "ground").unwrap();
        assert_eq!((d.id(), c.is_none()), ("ground", true));
        let (d, c) = registry.find_implementation("std", "pnp").unwrap();
        assert_eq!((d.id(), c.map(|c| c.name.as_str())), ("bjt", Some("PNP")));
        assert!(registry.find_implementation("other", "pnp").is_none());
    }
}
