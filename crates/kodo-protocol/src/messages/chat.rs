use crate::error::{ProtocolError, Result};
use crate::guid::Guid;
use crate::reader::PacketReader;
use crate::writer::PacketWriter;

/// Bound on the length prefix of an embedded speaker name.
const MAX_NAME_LEN: u32 = 256;
/// Bound on the message length prefix. Anything larger is a corrupt frame.
const MAX_MESSAGE_LEN: u32 = 8192;

/// Chat channel classification byte. Values the parser branches on get
/// their own variant; everything else rides along as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatType {
    System,
    Say,
    Party,
    Raid,
    Guild,
    Officer,
    Yell,
    Whisper,
    WhisperInform,
    Emote,
    TextEmote,
    MonsterSay,
    MonsterYell,
    MonsterEmote,
    Channel,
    ChannelJoin,
    ChannelLeave,
    ChannelList,
    ChannelNotice,
    ChannelNoticeUser,
    Afk,
    Dnd,
    Ignored,
    Skill,
    Loot,
    RaidLeader,
    RaidWarning,
    Battleground,
    BattlegroundLeader,
    Achievement,
    GuildAchievement,
    Other(u8),
}

impl ChatType {
    pub fn from_wire(value: u8) -> Self {
        match value {
            0x00 => ChatType::System,
            0x01 => ChatType::Say,
            0x02 => ChatType::Party,
            0x03 => ChatType::Raid,
            0x04 => ChatType::Guild,
            0x05 => ChatType::Officer,
            0x06 => ChatType::Yell,
            0x07 => ChatType::Whisper,
            0x09 => ChatType::WhisperInform,
            0x0A => ChatType::Emote,
            0x0B => ChatType::TextEmote,
            0x0C => ChatType::MonsterSay,
            0x0E => ChatType::MonsterYell,
            0x10 => ChatType::MonsterEmote,
            0x11 => ChatType::Channel,
            0x12 => ChatType::ChannelJoin,
            0x13 => ChatType::ChannelLeave,
            0x14 => ChatType::ChannelList,
            0x15 => ChatType::ChannelNotice,
            0x16 => ChatType::ChannelNoticeUser,
            0x17 => ChatType::Afk,
            0x18 => ChatType::Dnd,
            0x19 => ChatType::Ignored,
            0x1A => ChatType::Skill,
            0x1B => ChatType::Loot,
            0x27 => ChatType::RaidLeader,
            0x28 => ChatType::RaidWarning,
            0x2C => ChatType::Battleground,
            0x2D => ChatType::BattlegroundLeader,
            0x30 => ChatType::Achievement,
            0x31 => ChatType::GuildAchievement,
            other => ChatType::Other(other),
        }
    }

    pub fn to_wire(self) -> u8 {
        match self {
            ChatType::System => 0x00,
            ChatType::Say => 0x01,
            ChatType::Party => 0x02,
            ChatType::Raid => 0x03,
            ChatType::Guild => 0x04,
            ChatType::Officer => 0x05,
            ChatType::Yell => 0x06,
            ChatType::Whisper => 0x07,
            ChatType::WhisperInform => 0x09,
            ChatType::Emote => 0x0A,
            ChatType::TextEmote => 0x0B,
            ChatType::MonsterSay => 0x0C,
            ChatType::MonsterYell => 0x0E,
            ChatType::MonsterEmote => 0x10,
            ChatType::Channel => 0x11,
            ChatType::ChannelJoin => 0x12,
            ChatType::ChannelLeave => 0x13,
            ChatType::ChannelList => 0x14,
            ChatType::ChannelNotice => 0x15,
            ChatType::ChannelNoticeUser => 0x16,
            ChatType::Afk => 0x17,
            ChatType::Dnd => 0x18,
            ChatType::Ignored => 0x19,
            ChatType::Skill => 0x1A,
            ChatType::Loot => 0x1B,
            ChatType::RaidLeader => 0x27,
            ChatType::RaidWarning => 0x28,
            ChatType::Battleground => 0x2C,
            ChatType::BattlegroundLeader => 0x2D,
            ChatType::Achievement => 0x30,
            ChatType::GuildAchievement => 0x31,
            ChatType::Other(value) => value,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChatType::System => "SYSTEM",
            ChatType::Say => "SAY",
            ChatType::Party => "PARTY",
            ChatType::Raid => "RAID",
            ChatType::Guild => "GUILD",
            ChatType::Officer => "OFFICER",
            ChatType::Yell => "YELL",
            ChatType::Whisper => "WHISPER",
            ChatType::WhisperInform => "WHISPER_INFORM",
            ChatType::Emote => "EMOTE",
            ChatType::TextEmote => "TEXT_EMOTE",
            ChatType::MonsterSay => "MONSTER_SAY",
            ChatType::MonsterYell => "MONSTER_YELL",
            ChatType::MonsterEmote => "MONSTER_EMOTE",
            ChatType::Channel => "CHANNEL",
            ChatType::ChannelJoin => "CHANNEL_JOIN",
            ChatType::ChannelLeave => "CHANNEL_LEAVE",
            ChatType::ChannelList => "CHANNEL_LIST",
            ChatType::ChannelNotice => "CHANNEL_NOTICE",
            ChatType::ChannelNoticeUser => "CHANNEL_NOTICE_USER",
            ChatType::Afk => "AFK",
            ChatType::Dnd => "DND",
            ChatType::Ignored => "IGNORED",
            ChatType::Skill => "SKILL",
            ChatType::Loot => "LOOT",
            ChatType::RaidLeader => "RAID_LEADER",
            ChatType::RaidWarning => "RAID_WARNING",
            ChatType::Battleground => "BATTLEGROUND",
            ChatType::BattlegroundLeader => "BATTLEGROUND_LEADER",
            ChatType::Achievement => "ACHIEVEMENT",
            ChatType::GuildAchievement => "GUILD_ACHIEVEMENT",
            ChatType::Other(_) => "UNKNOWN",
        }
    }
}

/// Language field of outbound chat. Servers echo it back to listeners who
/// share the language and garble for those who do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Universal,
    Orcish,
    Common,
}

impl Language {
    pub fn to_wire(self) -> u32 {
        match self {
            Language::Universal => 0,
            Language::Orcish => 1,
            Language::Common => 7,
        }
    }
}

/// Outbound chat payload. The target field only travels for whispers and
/// channel messages.
#[derive(Debug)]
pub struct ChatMessageOut<'a> {
    pub chat_type: ChatType,
    pub language: Language,
    pub message: &'a str,
    pub target: Option<&'a str>,
}

impl ChatMessageOut<'_> {
    pub fn write(&self, w: &mut PacketWriter) {
        w.write_u32(self.chat_type.to_wire() as u32);
        w.write_u32(self.language.to_wire());
        if matches!(self.chat_type, ChatType::Whisper | ChatType::Channel) {
            w.write_cstring(self.target.unwrap_or(""));
        }
        w.write_cstring(self.message);
    }
}

/// A decoded incoming chat line. Which of the optional names is present
/// depends on the chat type; absent ones stay `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessageIn {
    pub chat_type: ChatType,
    pub language: u32,
    pub sender_guid: Guid,
    pub receiver_guid: Guid,
    pub sender_name: Option<String>,
    pub receiver_name: Option<String>,
    pub channel_name: Option<String>,
    pub message: String,
    pub chat_tag: u8,
}

impl ChatMessageIn {
    pub fn parse(r: &mut PacketReader<'_>) -> Result<Self> {
        let chat_type = ChatType::from_wire(r.read_u8()?);
        let language = r.read_u32()?;
        let sender_guid = Guid(r.read_u64()?);
        let _flags = r.read_u32()?;

        let mut receiver_guid = Guid::ZERO;
        let mut sender_name = None;
        let mut receiver_name = None;
        let mut channel_name = None;

        match chat_type {
            ChatType::MonsterSay | ChatType::MonsterYell | ChatType::MonsterEmote => {
                let name_len = r.read_u32()?;
                if name_len >= MAX_NAME_LEN {
                    return Err(ProtocolError::BadStringLength(name_len));
                }
                if name_len > 0 {
                    sender_name = Some(read_counted_string(r, name_len as usize)?);
                }
                receiver_guid = Guid(r.read_u64()?);
            }
            ChatType::WhisperInform => {
                receiver_name = Some(r.read_cstring()?);
            }
            ChatType::Channel => {
                channel_name = Some(r.read_cstring()?);
            }
            ChatType::Achievement | ChatType::GuildAchievement => {
                let _achievement_id = r.read_u32()?;
            }
            _ => {}
        }

        let message_len = r.read_u32()?;
        if message_len >= MAX_MESSAGE_LEN {
            return Err(ProtocolError::BadStringLength(message_len));
        }
        let message = if message_len > 0 {
            read_counted_string(r, message_len as usize)?
        } else {
            String::new()
        };
        let chat_tag = r.read_u8()?;

        Ok(ChatMessageIn {
            chat_type,
            language,
            sender_guid,
            receiver_guid,
            sender_name,
            receiver_name,
            channel_name,
            message,
            chat_tag,
        })
    }
}

/// Length prefixes count the trailing NUL; strip it if present.
fn read_counted_string(r: &mut PacketReader<'_>, len: usize) -> Result<String> {
    let mut bytes = r.read_bytes(len)?;
    if bytes.last() == Some(&0) {
        bytes.pop();
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
