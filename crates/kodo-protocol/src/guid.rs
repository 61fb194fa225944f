use std::fmt;

/// 64-bit entity identifier.
///
/// Zero is reserved: it means "no entity" everywhere a guid appears
/// (empty target, system chat sender, absent mirror entry).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Guid(pub u64);

impl Guid {
    pub const ZERO: Guid = Guid(0);

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

impl From<u64> for Guid {
    fn from(raw: u64) -> Self {
        Guid(raw)
    }
}
