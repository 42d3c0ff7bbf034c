use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::definition::MessageDefinition;
use crate::error::{Result, SchemaError};

/// Closed registry of message definitions, keyed by id and by name.
///
/// Built once through [`MessageSetBuilder`] and read-only afterwards.
/// Definitions are reference-counted so messages, connections and runtimes
/// can all hold them past the life of any single `MessageSet` clone.
#[derive(Debug, Clone, Default)]
pub struct MessageSet {
    by_id: HashMap<u32, Arc<MessageDefinition>>,
    by_name: HashMap<String, Arc<MessageDefinition>>,
}

impl MessageSet {
    /// Start building a set.
    pub fn builder() -> MessageSetBuilder {
        MessageSetBuilder::default()
    }

    /// Definition for a message id.
    pub fn definition(&self, id: u32) -> Result<Arc<MessageDefinition>> {
        self.by_id
            .get(&id)
            .cloned()
            .ok_or(SchemaError::UnknownMessageId(id))
    }

    /// Definition for a message name.
    pub fn definition_by_name(&self, name: &str) -> Result<Arc<MessageDefinition>> {
        self.by_name
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownMessageName(name.to_string()))
    }

    /// Message id for a name.
    pub fn id_for_name(&self, name: &str) -> Result<u32> {
        self.definition_by_name(name).map(|def| def.id())
    }

    /// Whether the set knows this message id.
    pub fn contains_id(&self, id: u32) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Whether the set knows this message name.
    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Registered message ids, sorted.
    pub fn ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.by_id.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over all definitions (unordered).
    pub fn definitions(&self) -> impl Iterator<Item = &Arc<MessageDefinition>> {
        self.by_id.values()
    }
}

/// Accumulates definitions, then freezes them into a [`MessageSet`].
///
/// This is the seam an external definition loader drives; the core never
/// mutates a set after `build`.
#[derive(Debug, Default)]
pub struct MessageSetBuilder {
    by_id: HashMap<u32, Arc<MessageDefinition>>,
    by_name: HashMap<String, Arc<MessageDefinition>>,
}

impl MessageSetBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition. Both the id and the name must be unused.
    pub fn add(&mut self, definition: MessageDefinition) -> Result<()> {
        if let Some(existing) = self.by_id.get(&definition.id()) {
            return Err(SchemaError::DuplicateMessageId {
                id: definition.id(),
                existing: existing.name().to_string(),
                incoming: definition.name().to_string(),
            });
        }
        if self.by_name.contains_key(definition.name()) {
            return Err(SchemaError::DuplicateMessageName(
                definition.name().to_string(),
            ));
        }

        let definition = Arc::new(definition);
        self.by_id.insert(definition.id(), Arc::clone(&definition));
        self.by_name
            .insert(definition.name().to_string(), definition);
        Ok(())
    }

    /// Freeze the set.
    pub fn build(self) -> MessageSet {
        debug!(messages = self.by_id.len(), "message set frozen");
        MessageSet {
            by_id: self.by_id,
            by_name: self.by_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::MessageDefinitionBuilder;
    use crate::field::WireType;

    fn heartbeat() -> MessageDefinition {
        MessageDefinitionBuilder::new(0, "HEARTBEAT")
            .crc_extra(50)
            .field("type", WireType::U8)
            .field("autopilot", WireType::U8)
            .field("base_mode", WireType::U8)
            .field("custom_mode", WireType::U32)
            .field("system_status", WireType::U8)
            .field("mavlink_version", WireType::U8)
            .build()
            .unwrap()
    }

    fn system_time() -> MessageDefinition {
        MessageDefinitionBuilder::new(2, "SYSTEM_TIME")
            .crc_extra(137)
            .field("time_unix_usec", WireType::U64)
            .field("time_boot_ms", WireType::U32)
            .build()
            .unwrap()
    }

    #[test]
    fn lookup_by_id_and_name_reach_the_same_definition() {
        let mut builder = MessageSet::builder();
        builder.add(heartbeat()).unwrap();
        builder.add(system_time()).unwrap();
        let set = builder.build();

        let by_id = set.definition(0).unwrap();
        let by_name = set.definition_by_name("HEARTBEAT").unwrap();
        assert!(Arc::ptr_eq(&by_id, &by_name));
        assert_eq!(set.id_for_name("SYSTEM_TIME").unwrap(), 2);
        assert_eq!(set.ids(), vec![0, 2]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn unknown_lookups_fail_distinctly() {
        let set = MessageSet::default();
        assert!(matches!(
            set.definition(42),
            Err(SchemaError::UnknownMessageId(42))
        ));
        assert!(matches!(
            set.definition_by_name("NOPE"),
            Err(SchemaError::UnknownMessageName(_))
        ));
    }

    #[test]
    fn duplicate_id_rejected() {
        let mut builder = MessageSet::builder();
        builder.add(heartbeat()).unwrap();

        let clash = MessageDefinitionBuilder::new(0, "OTHER")
            .field("x", WireType::U8)
            .build()
            .unwrap();
        assert!(matches!(
            builder.add(clash),
            Err(SchemaError::DuplicateMessageId { id: 0, .. })
        ));
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut builder = MessageSet::builder();
        builder.add(heartbeat()).unwrap();

        let clash = MessageDefinitionBuilder::new(9, "HEARTBEAT")
            .field("x", WireType::U8)
            .build()
            .unwrap();
        assert!(matches!(
            builder.add(clash),
            Err(SchemaError::DuplicateMessageName(_))
        ));
    }

    #[test]
    fn clones_share_definitions() {
        let mut builder = MessageSet::builder();
        builder.add(heartbeat()).unwrap();
        let set = builder.build();
        let clone = set.clone();

        let a = set.definition(0).unwrap();
        let b = clone.definition(0).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
