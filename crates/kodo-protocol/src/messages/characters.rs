use crate::error::Result;
use crate::guid::Guid;
use crate::reader::PacketReader;
use crate::writer::PacketWriter;

/// One entry from the character list. Equipment display data is skipped
/// during parsing; everything a login-and-play client needs is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub guid: Guid,
    pub name: String,
    pub race: u8,
    pub class: u8,
    pub gender: u8,
    pub appearance: u32,
    pub facial_features: u8,
    pub level: u8,
    pub zone: u32,
    pub map: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub guild_id: u32,
    pub flags: u32,
    pub pet_display: u32,
    pub pet_level: u32,
    pub pet_family: u32,
}

impl Character {
    fn parse(r: &mut PacketReader<'_>) -> Result<Self> {
        let guid = Guid(r.read_u64()?);
        let name = r.read_cstring()?;
        let race = r.read_u8()?;
        let class = r.read_u8()?;
        let gender = r.read_u8()?;
        let appearance = r.read_u32()?;
        let facial_features = r.read_u8()?;
        let level = r.read_u8()?;
        let zone = r.read_u32()?;
        let map = r.read_u32()?;
        let x = r.read_f32()?;
        let y = r.read_f32()?;
        let z = r.read_f32()?;
        let guild_id = r.read_u32()?;
        let flags = r.read_u32()?;
        r.skip(4)?; // customization flags
        r.skip(1)?; // first-login marker
        let pet_display = r.read_u32()?;
        let pet_level = r.read_u32()?;
        let pet_family = r.read_u32()?;
        // 19 equipment slots plus 4 bags: display u32, slot u8, enchant u32
        r.skip(23 * 9)?;

        Ok(Character {
            guid,
            name,
            race,
            class,
            gender,
            appearance,
            facial_features,
            level,
            zone,
            map,
            x,
            y,
            z,
            guild_id,
            flags,
            pet_display,
            pet_level,
            pet_family,
        })
    }

    pub fn has_guild(&self) -> bool {
        self.guild_id != 0
    }

    pub fn has_pet(&self) -> bool {
        self.pet_display != 0
    }

    pub fn race_name(&self) -> &'static str {
        match self.race {
            1 => "Human",
            2 => "Orc",
            3 => "Dwarf",
            4 => "Night Elf",
            5 => "Undead",
            6 => "Tauren",
            7 => "Gnome",
            8 => "Troll",
            10 => "Blood Elf",
            11 => "Draenei",
            _ => "Unknown",
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self.class {
            1 => "Warrior",
            2 => "Paladin",
            3 => "Hunter",
            4 => "Rogue",
            5 => "Priest",
            6 => "Death Knight",
            7 => "Shaman",
            8 => "Mage",
            9 => "Warlock",
            11 => "Druid",
            _ => "Unknown",
        }
    }

    pub fn gender_name(&self) -> &'static str {
        match self.gender {
            0 => "Male",
            1 => "Female",
            _ => "Unknown",
        }
    }
}

/// The full character list response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharEnum {
    pub characters: Vec<Character>,
}

impl CharEnum {
    pub fn parse(r: &mut PacketReader<'_>) -> Result<Self> {
        let count = r.read_u8()?;
        let mut characters = Vec::with_capacity(count as usize);
        for _ in 0..count {
            characters.push(Character::parse(r)?);
        }
        Ok(CharEnum { characters })
    }
}

/// Outbound world-entry request. The guid travels raw, not packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerLogin {
    pub guid: Guid,
}

impl PlayerLogin {
    pub fn write(&self, w: &mut PacketWriter) {
        w.write_u64(self.guid.raw());
    }
}

/// Confirms world entry and tells the client where it is standing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoginVerifyWorld {
    pub map: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub orientation: f32,
}

impl LoginVerifyWorld {
    pub fn parse(r: &mut PacketReader<'_>) -> Result<Self> {
        Ok(LoginVerifyWorld {
            map: r.read_u32()?,
            x: r.read_f32()?,
            y: r.read_f32()?,
            z: r.read_f32()?,
            orientation: r.read_f32()?,
        })
    }
}
