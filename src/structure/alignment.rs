// Fri Jan 16 2026 - Alex

use std::fmt;

/// A byte boundary members are placed on. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Alignment {
    value: u32,
}

impl Alignment {
    pub const BYTE: Alignment = Alignment { value: 1 };

    pub fn new(value: u32) -> Self {
        Self {
            value: value.max(1),
        }
    }

    /// The boundary actually enforced for a member: the container's pack
    /// caps the member's natural alignment.
    pub fn effective(pack: u32, natural: u32) -> Self {
        Self::new(pack.min(natural))
    }

    pub fn as_u32(&self) -> u32 {
        self.value
    }

    /// Rounds `offset` up to the next multiple of this alignment; aligned
    /// offsets are returned unchanged. `None` past the end of the address
    /// space.
    pub fn align(&self, offset: u32) -> Option<u32> {
        offset.checked_add((self.value - (offset % self.value)) % self.value)
    }

    pub fn is_aligned(&self, offset: u32) -> bool {
        offset % self.value == 0
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self::BYTE
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
