use crate::error::{ProtocolError, Result};
use crate::guid::Guid;
use crate::messages::movement::MovementInfo;
use crate::reader::PacketReader;
use crate::update_mask::read_field_diff;

const TYPE_VALUES: u8 = 0;
const TYPE_MOVEMENT: u8 = 1;
const TYPE_CREATE_OBJECT: u8 = 2;
const TYPE_CREATE_OBJECT2: u8 = 3;
const TYPE_OUT_OF_RANGE: u8 = 4;
const TYPE_NEAR: u8 = 5;

/// Kinds an entity can be created as. The wire byte is kept raw in
/// [`UpdateBlock::Create`] since servers occasionally send values outside
/// this set; this enum names the ones that matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectTypeId {
    Object,
    Item,
    Container,
    Unit,
    Player,
    GameObject,
    DynamicObject,
    Corpse,
}

impl ObjectTypeId {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ObjectTypeId::Object),
            1 => Some(ObjectTypeId::Item),
            2 => Some(ObjectTypeId::Container),
            3 => Some(ObjectTypeId::Unit),
            4 => Some(ObjectTypeId::Player),
            5 => Some(ObjectTypeId::GameObject),
            6 => Some(ObjectTypeId::DynamicObject),
            7 => Some(ObjectTypeId::Corpse),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            ObjectTypeId::Object => 0,
            ObjectTypeId::Item => 1,
            ObjectTypeId::Container => 2,
            ObjectTypeId::Unit => 3,
            ObjectTypeId::Player => 4,
            ObjectTypeId::GameObject => 5,
            ObjectTypeId::DynamicObject => 6,
            ObjectTypeId::Corpse => 7,
        }
    }
}

/// One block of an update batch. The two create types on the wire carry
/// identical client-visible payloads and collapse into [`UpdateBlock::Create`].
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateBlock {
    Values {
        guid: Guid,
        fields: Vec<(u16, u32)>,
    },
    Movement {
        guid: Guid,
        movement: MovementInfo,
    },
    Create {
        guid: Guid,
        object_type: u8,
        movement: MovementInfo,
        fields: Vec<(u16, u32)>,
    },
    OutOfRange {
        guids: Vec<Guid>,
    },
    Near {
        guids: Vec<Guid>,
    },
}

/// A full update batch. Any block failing to decode fails the whole batch,
/// so a caller never sees a partially parsed message.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateObject {
    pub blocks: Vec<UpdateBlock>,
}

impl UpdateObject {
    pub fn parse(r: &mut PacketReader<'_>) -> Result<Self> {
        let count = r.read_u32()?;
        // Count is server-controlled; truncation surfaces on the reads, so
        // no pre-allocation from it.
        let mut blocks = Vec::new();
        for _ in 0..count {
            blocks.push(parse_block(r)?);
        }
        Ok(UpdateObject { blocks })
    }
}

fn parse_block(r: &mut PacketReader<'_>) -> Result<UpdateBlock> {
    let kind = r.read_u8()?;
    match kind {
        TYPE_VALUES => {
            let guid = r.read_packed_guid()?;
            let fields = read_field_diff(r)?;
            Ok(UpdateBlock::Values { guid, fields })
        }
        TYPE_MOVEMENT => {
            let guid = r.read_packed_guid()?;
            let movement = MovementInfo::parse(r)?;
            Ok(UpdateBlock::Movement { guid, movement })
        }
        TYPE_CREATE_OBJECT | TYPE_CREATE_OBJECT2 => {
            let guid = r.read_packed_guid()?;
            let object_type = r.read_u8()?;
            let movement = MovementInfo::parse(r)?;
            let fields = read_field_diff(r)?;
            Ok(UpdateBlock::Create {
                guid,
                object_type,
                movement,
                fields,
            })
        }
        TYPE_OUT_OF_RANGE => Ok(UpdateBlock::OutOfRange {
            guids: parse_guid_list(r)?,
        }),
        TYPE_NEAR => Ok(UpdateBlock::Near {
            guids: parse_guid_list(r)?,
        }),
        other => Err(ProtocolError::UnknownUpdateType(other)),
    }
}

fn parse_guid_list(r: &mut PacketReader<'_>) -> Result<Vec<Guid>> {
    let count = r.read_u32()?;
    let mut guids = Vec::new();
    for _ in 0..count {
        guids.push(r.read_packed_guid()?);
    }
    Ok(guids)
}

/// An entity leaving the world outright. `is_death` distinguishes a corpse
/// from a plain despawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestroyObject {
    pub guid: Guid,
    pub is_death: bool,
}

impl DestroyObject {
    pub fn parse(r: &mut PacketReader<'_>) -> Result<Self> {
        let guid = Guid(r.read_u64()?);
        let is_death = r.read_u8()? != 0;
        Ok(DestroyObject { guid, is_death })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update_mask::write_field_diff;
    use crate::writer::PacketWriter;

    fn write_minimal_movement(w: &mut PacketWriter) {
        MovementInfo::default().write(w);
    }

    #[test]
    fn test_parses_create_then_values_batch() {
        let mut w = PacketWriter::new();
        w.write_u32(3);

        w.write_u8(TYPE_CREATE_OBJECT);
        w.write_packed_guid(Guid(0x1001));
        w.write_u8(ObjectTypeId::Unit.as_u8());
        write_minimal_movement(&mut w);
        write_field_diff(&mut w, &[(0, 0x1001), (3, 25)]).unwrap();

        w.write_u8(TYPE_VALUES);
        w.write_packed_guid(Guid(0x1001));
        write_field_diff(&mut w, &[(3, 30)]).unwrap();

        w.write_u8(TYPE_VALUES);
        w.write_packed_guid(Guid(0x9999));
        write_field_diff(&mut w, &[(3, 1)]).unwrap();

        let buf = w.into_inner();
        let mut r = PacketReader::new(&buf);
        let update = UpdateObject::parse(&mut r).unwrap();

        assert_eq!(update.blocks.len(), 3);
        match &update.blocks[0] {
            UpdateBlock::Create {
                guid,
                object_type,
                fields,
                ..
            } => {
                assert_eq!(*guid, Guid(0x1001));
                assert_eq!(ObjectTypeId::from_u8(*object_type), Some(ObjectTypeId::Unit));
                assert_eq!(fields, &vec![(0, 0x1001), (3, 25)]);
            }
            other => panic!("expected create, got {:?}", other),
        }
        match &update.blocks[2] {
            UpdateBlock::Values { guid, .. } => assert_eq!(*guid, Guid(0x9999)),
            other => panic!("expected values, got {:?}", other),
        }
        assert!(r.is_empty());
    }

    #[test]
    fn test_parses_out_of_range_block() {
        let mut w = PacketWriter::new();
        w.write_u32(1);
        w.write_u8(TYPE_OUT_OF_RANGE);
        w.write_u32(2);
        w.write_packed_guid(Guid(0x2001));
        w.write_packed_guid(Guid(0x2002));

        let buf = w.into_inner();
        let mut r = PacketReader::new(&buf);
        let update = UpdateObject::parse(&mut r).unwrap();
        assert_eq!(
            update.blocks,
            vec![UpdateBlock::OutOfRange {
                guids: vec![Guid(0x2001), Guid(0x2002)],
            }]
        );
    }

    #[test]
    fn test_movement_block_carries_pose() {
        let movement = MovementInfo {
            time: 99,
            x: 10.0,
            y: 20.0,
            z: 30.0,
            orientation: 1.5,
            ..Default::default()
        };
        let mut w = PacketWriter::new();
        w.write_u32(1);
        w.write_u8(TYPE_MOVEMENT);
        w.write_packed_guid(Guid(0x1001));
        movement.write(&mut w);

        let buf = w.into_inner();
        let mut r = PacketReader::new(&buf);
        let update = UpdateObject::parse(&mut r).unwrap();
        assert_eq!(
            update.blocks,
            vec![UpdateBlock::Movement {
                guid: Guid(0x1001),
                movement,
            }]
        );
    }

    #[test]
    fn test_unknown_block_type_fails_the_batch() {
        let mut w = PacketWriter::new();
        w.write_u32(2);
        w.write_u8(TYPE_VALUES);
        w.write_packed_guid(Guid(0x1001));
        write_field_diff(&mut w, &[]).unwrap();
        w.write_u8(0x77);

        let buf = w.into_inner();
        let mut r = PacketReader::new(&buf);
        match UpdateObject::parse(&mut r) {
            Err(ProtocolError::UnknownUpdateType(0x77)) => {}
            other => panic!("expected unknown update type, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_batch_fails() {
        let mut w = PacketWriter::new();
        w.write_u32(2);
        w.write_u8(TYPE_VALUES);
        w.write_packed_guid(Guid(0x1001));
        write_field_diff(&mut w, &[]).unwrap();
        // second block promised but absent

        let buf = w.into_inner();
        let mut r = PacketReader::new(&buf);
        assert!(UpdateObject::parse(&mut r).is_err());
    }

    #[test]
    fn test_destroy_object_reads_raw_guid_and_death_flag() {
        let mut w = PacketWriter::new();
        w.write_u64(0x1001);
        w.write_u8(1);

        let buf = w.into_inner();
        let mut r = PacketReader::new(&buf);
        let destroy = DestroyObject::parse(&mut r).unwrap();
        assert_eq!(destroy.guid, Guid(0x1001));
        assert!(destroy.is_death);
    }

    #[test]
    fn test_destroy_object_too_small_fails() {
        let buf = [0u8; 8];
        let mut r = PacketReader::new(&buf);
        assert!(DestroyObject::parse(&mut r).is_err());
    }
}
