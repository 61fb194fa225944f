use bitflags::bitflags;

use crate::error::Result;
use crate::reader::PacketReader;
use crate::writer::PacketWriter;

bitflags! {
    /// Movement state bits. Set bits decide which optional fields travel
    /// with a [`MovementInfo`], so reader and writer must consult the same
    /// flags.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct MovementFlags: u32 {
        const FORWARD = 0x0000_0001;
        const BACKWARD = 0x0000_0002;
        const STRAFE_LEFT = 0x0000_0004;
        const STRAFE_RIGHT = 0x0000_0008;
        const TURN_LEFT = 0x0000_0010;
        const TURN_RIGHT = 0x0000_0020;
        const WALKING = 0x0000_0100;
        const FALLING = 0x0000_1000;
        const FALLING_FAR = 0x0000_4000;
        const SWIMMING = 0x0020_0000;
        const FLYING = 0x0200_0000;
    }
}

/// Pose and motion state shared by outbound movement frames and the
/// movement section of update blocks.
///
/// Conditional fields are plain values gated by flags: `pitch` only
/// travels while swimming or flying, the fall fields only while falling,
/// and the jump trig fields only when the far-fall bit is also set.
/// Ungated fields keep their defaults on parse.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementInfo {
    pub flags: MovementFlags,
    pub extra_flags: u16,
    pub time: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub orientation: f32,
    pub pitch: f32,
    pub fall_time: u32,
    pub jump_velocity: f32,
    pub jump_sin: f32,
    pub jump_cos: f32,
    pub jump_xy_speed: f32,
}

impl MovementInfo {
    pub fn parse(r: &mut PacketReader<'_>) -> Result<Self> {
        let mut info = MovementInfo {
            flags: MovementFlags::from_bits_retain(r.read_u32()?),
            extra_flags: r.read_u16()?,
            time: r.read_u32()?,
            x: r.read_f32()?,
            y: r.read_f32()?,
            z: r.read_f32()?,
            orientation: r.read_f32()?,
            ..Default::default()
        };
        if info
            .flags
            .intersects(MovementFlags::SWIMMING | MovementFlags::FLYING)
        {
            info.pitch = r.read_f32()?;
        }
        if info.flags.contains(MovementFlags::FALLING) {
            info.fall_time = r.read_u32()?;
            info.jump_velocity = r.read_f32()?;
            if info.flags.contains(MovementFlags::FALLING_FAR) {
                info.jump_sin = r.read_f32()?;
                info.jump_cos = r.read_f32()?;
                info.jump_xy_speed = r.read_f32()?;
            }
        }
        Ok(info)
    }

    pub fn write(&self, w: &mut PacketWriter) {
        w.write_u32(self.flags.bits());
        w.write_u16(self.extra_flags);
        w.write_u32(self.time);
        w.write_f32(self.x);
        w.write_f32(self.y);
        w.write_f32(self.z);
        w.write_f32(self.orientation);
        if self
            .flags
            .intersects(MovementFlags::SWIMMING | MovementFlags::FLYING)
        {
            w.write_f32(self.pitch);
        }
        if self.flags.contains(MovementFlags::FALLING) {
            w.write_u32(self.fall_time);
            w.write_f32(self.jump_velocity);
            if self.flags.contains(MovementFlags::FALLING_FAR) {
                w.write_f32(self.jump_sin);
                w.write_f32(self.jump_cos);
                w.write_f32(self.jump_xy_speed);
            }
        }
    }
}
