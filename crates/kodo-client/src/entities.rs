//! Client-side mirror of server-owned world objects.
//!
//! The server is authoritative; this map only ever changes in response to
//! decoded update and destroy frames. External collaborators read it
//! through accessors, never mutate it.

use std::collections::HashMap;

use kodo_protocol::messages::{MovementInfo, ObjectTypeId, UpdateBlock, UpdateObject};
use kodo_protocol::Guid;
use tracing::{debug, info, warn};

/// Object-kind tag with kind-specific payload where one exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityKind {
    /// Another player. The name arrives separately, when it arrives at all.
    Player { name: Option<String> },
    Unit,
    GameObject,
    /// Anything else, carrying the raw wire tag.
    Other(u8),
}

impl EntityKind {
    fn from_wire(object_type: u8) -> Self {
        match ObjectTypeId::from_u8(object_type) {
            Some(ObjectTypeId::Player) => EntityKind::Player { name: None },
            Some(ObjectTypeId::Unit) => EntityKind::Unit,
            Some(ObjectTypeId::GameObject) => EntityKind::GameObject,
            _ => EntityKind::Other(object_type),
        }
    }

    /// True for the kinds tab-targeting cycles through.
    pub fn is_targetable(&self) -> bool {
        matches!(self, EntityKind::Player { .. } | EntityKind::Unit)
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Player { .. } => "player",
            EntityKind::Unit => "unit",
            EntityKind::GameObject => "gameobject",
            EntityKind::Other(_) => "generic",
        }
    }
}

/// One mirrored world object: sparse field table plus optional pose.
#[derive(Clone, Debug)]
pub struct Entity {
    pub guid: Guid,
    pub kind: EntityKind,
    fields: HashMap<u16, u32>,
    movement: Option<MovementInfo>,
}

impl Entity {
    fn new(guid: Guid, kind: EntityKind) -> Self {
        Self {
            guid,
            kind,
            fields: HashMap::new(),
            movement: None,
        }
    }

    pub fn field(&self, index: u16) -> Option<u32> {
        self.fields.get(&index).copied()
    }

    pub fn set_field(&mut self, index: u16, value: u32) {
        self.fields.insert(index, value);
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn movement(&self) -> Option<&MovementInfo> {
        self.movement.as_ref()
    }

    pub fn position(&self) -> Option<(f32, f32, f32)> {
        self.movement.as_ref().map(|m| (m.x, m.y, m.z))
    }

    /// Display name, known only for some players.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            EntityKind::Player { name } => name.as_deref(),
            _ => None,
        }
    }
}

/// What one update batch did to the mirror.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    /// Diffs referencing identifiers not in the mirror, logged and dropped.
    pub skipped: usize,
}

impl BatchSummary {
    /// True when the set of entities changed, not just their fields.
    pub fn membership_changed(&self) -> bool {
        self.created > 0 || self.removed > 0
    }
}

/// Identifier to entity map. One entry per identifier, always.
#[derive(Debug, Default)]
pub struct EntityManager {
    entities: HashMap<Guid, Entity>,
}

impl EntityManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, guid: Guid) -> Option<&Entity> {
        self.entities.get(&guid)
    }

    pub fn contains(&self, guid: Guid) -> bool {
        self.entities.contains_key(&guid)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Remove one entity outright, as a destroy frame does.
    pub fn remove(&mut self, guid: Guid) -> Option<Entity> {
        self.entities.remove(&guid)
    }

    /// Apply a decoded update batch. Range-exit notices clear membership
    /// before any block mutates it, so a guid leaving and re-entering in
    /// one batch ends up freshly created.
    pub fn apply_batch(&mut self, batch: &UpdateObject) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for block in &batch.blocks {
            if let UpdateBlock::OutOfRange { guids } = block {
                for &guid in guids {
                    if self.entities.remove(&guid).is_some() {
                        info!(target: "world", "Entity went out of range: {}", guid);
                        summary.removed += 1;
                    }
                }
            }
        }

        for block in &batch.blocks {
            match block {
                UpdateBlock::Create {
                    guid,
                    object_type,
                    movement,
                    fields,
                } => {
                    let kind = EntityKind::from_wire(*object_type);
                    info!(target: "world", "Created {} entity: {}", kind.label(), guid);
                    let mut entity = Entity::new(*guid, kind);
                    entity.movement = Some(*movement);
                    for &(index, value) in fields {
                        entity.set_field(index, value);
                    }
                    self.entities.insert(*guid, entity);
                    summary.created += 1;
                }
                UpdateBlock::Values { guid, fields } => {
                    match self.entities.get_mut(guid) {
                        Some(entity) => {
                            for &(index, value) in fields {
                                entity.set_field(index, value);
                            }
                            debug!(target: "world", "Updated entity fields: {}", guid);
                            summary.updated += 1;
                        }
                        None => {
                            warn!(target: "world", "VALUES update for unknown entity: {}", guid);
                            summary.skipped += 1;
                        }
                    }
                }
                UpdateBlock::Movement { guid, movement } => {
                    match self.entities.get_mut(guid) {
                        Some(entity) => {
                            entity.movement = Some(*movement);
                            debug!(target: "world", "Updated entity position: {}", guid);
                            summary.updated += 1;
                        }
                        None => {
                            warn!(target: "world", "MOVEMENT update for unknown entity: {}", guid);
                            summary.skipped += 1;
                        }
                    }
                }
                UpdateBlock::OutOfRange { .. } => {}
                UpdateBlock::Near { guids } => {
                    debug!(target: "world", "{} entities entering range", guids.len());
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kodo_protocol::update_mask::write_field_diff;
    use kodo_protocol::PacketReader;
    use kodo_protocol::PacketWriter;

    fn batch_from_bytes(buf: &[u8]) -> UpdateObject {
        let mut r = PacketReader::new(buf);
        UpdateObject::parse(&mut r).unwrap()
    }

    fn create_block(w: &mut PacketWriter, guid: u64, object_type: u8, fields: &[(u16, u32)]) {
        w.write_u8(2);
        w.write_packed_guid(Guid(guid));
        w.write_u8(object_type);
        MovementInfo::default().write(w);
        write_field_diff(w, fields).unwrap();
    }

    #[test]
    fn test_create_then_values_merges_fields() {
        let mut w = PacketWriter::new();
        w.write_u32(3);
        create_block(&mut w, 0x1001, 3, &[(0, 7), (3, 25)]);
        w.write_u8(0);
        w.write_packed_guid(Guid(0x1001));
        write_field_diff(&mut w, &[(3, 30)]).unwrap();
        w.write_u8(0);
        w.write_packed_guid(Guid(0x9999));
        write_field_diff(&mut w, &[(3, 1)]).unwrap();

        let mut manager = EntityManager::new();
        let summary = manager.apply_batch(&batch_from_bytes(&w.into_inner()));

        assert_eq!(summary.created, 1);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(manager.len(), 1);

        let entity = manager.get(Guid(0x1001)).unwrap();
        assert_eq!(entity.kind, EntityKind::Unit);
        assert_eq!(entity.field(0), Some(7));
        assert_eq!(entity.field(3), Some(30));
    }

    #[test]
    fn test_out_of_range_removes_before_blocks() {
        let mut w = PacketWriter::new();
        w.write_u32(1);
        create_block(&mut w, 0x2001, 4, &[]);
        let mut manager = EntityManager::new();
        manager.apply_batch(&batch_from_bytes(&w.into_inner()));
        assert!(manager.contains(Guid(0x2001)));

        // Removal listed after a values block still clears the entity first,
        // so the values diff lands on nothing.
        let mut w = PacketWriter::new();
        w.write_u32(2);
        w.write_u8(0);
        w.write_packed_guid(Guid(0x2001));
        write_field_diff(&mut w, &[(1, 1)]).unwrap();
        w.write_u8(4);
        w.write_u32(1);
        w.write_packed_guid(Guid(0x2001));

        let summary = manager.apply_batch(&batch_from_bytes(&w.into_inner()));
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.skipped, 1);
        assert!(!manager.contains(Guid(0x2001)));
    }

    #[test]
    fn test_unknown_out_of_range_guid_is_harmless() {
        let mut w = PacketWriter::new();
        w.write_u32(1);
        w.write_u8(4);
        w.write_u32(1);
        w.write_packed_guid(Guid(0xDEAD));

        let mut manager = EntityManager::new();
        let summary = manager.apply_batch(&batch_from_bytes(&w.into_inner()));
        assert_eq!(summary.removed, 0);
        assert!(!summary.membership_changed());
    }

    #[test]
    fn test_movement_block_sets_pose() {
        let mut w = PacketWriter::new();
        w.write_u32(1);
        create_block(&mut w, 0x3001, 3, &[]);
        let mut manager = EntityManager::new();
        manager.apply_batch(&batch_from_bytes(&w.into_inner()));

        let movement = MovementInfo {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            ..Default::default()
        };
        let mut w = PacketWriter::new();
        w.write_u32(1);
        w.write_u8(1);
        w.write_packed_guid(Guid(0x3001));
        movement.write(&mut w);

        manager.apply_batch(&batch_from_bytes(&w.into_inner()));
        let entity = manager.get(Guid(0x3001)).unwrap();
        assert_eq!(entity.position(), Some((1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_unusual_object_type_keeps_raw_tag() {
        let mut w = PacketWriter::new();
        w.write_u32(1);
        create_block(&mut w, 0x4001, 0x42, &[]);
        let mut manager = EntityManager::new();
        manager.apply_batch(&batch_from_bytes(&w.into_inner()));

        let entity = manager.get(Guid(0x4001)).unwrap();
        assert_eq!(entity.kind, EntityKind::Other(0x42));
        assert!(!entity.kind.is_targetable());
    }
}
