// Fri Jan 16 2026 - Alex

use crate::structure::{LayoutError, LayoutResult};
use crate::syntax::{LayoutAttr, LayoutKind};
use serde::{Deserialize, Serialize};

/// 8 is the size of the largest primitive (double, 64-bit pointer).
pub const DEFAULT_PACK: u32 = 8;
const MAX_PACK: u32 = 128;

/// The structural layout a struct is laid out under, with host defaults
/// filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructLayoutSpec {
    pub kind: LayoutKind,
    pub pack: u32,
    /// 0 means "compute from members".
    pub size: u32,
}

impl StructLayoutSpec {
    pub fn from_attr(attr: Option<&LayoutAttr>, structure: &str) -> LayoutResult<Self> {
        let Some(attr) = attr else {
            return Ok(Self::default());
        };

        let pack = match attr.pack {
            None | Some(0) => DEFAULT_PACK,
            Some(pack) if pack.is_power_of_two() && pack <= MAX_PACK => pack,
            Some(pack) => {
                return Err(LayoutError::InvalidLayout {
                    structure: structure.to_string(),
                    parameter: "Pack",
                    value: pack,
                })
            }
        };

        Ok(Self {
            kind: attr.kind,
            pack,
            size: attr.size.unwrap_or(0),
        })
    }

    pub fn is_explicit(&self) -> bool {
        self.kind == LayoutKind::Explicit
    }

    /// The attribute every flattened struct is emitted with: absolute
    /// offsets that need no alignment at read time.
    pub fn flattened_attr(size: u32) -> LayoutAttr {
        LayoutAttr::explicit().with_pack(1).with_size(size)
    }
}

impl Default for StructLayoutSpec {
    fn default() -> Self {
        Self {
            kind: LayoutKind::Sequential,
            pack: DEFAULT_PACK,
            size: 0,
        }
    }
}

/// The published result of flattening one type. Immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlattenedLayout {
    /// Total footprint, trailing padding included.
    pub size: u32,
    /// Drives how this struct aligns when embedded elsewhere.
    pub largest_member_alignment: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_attribute() {
        let layout = StructLayoutSpec::from_attr(None, "POINT").unwrap();
        assert_eq!(layout.kind, LayoutKind::Sequential);
        assert_eq!(layout.pack, 8);
        assert_eq!(layout.size, 0);
    }

    #[test]
    fn test_zero_pack_means_default() {
        let attr = LayoutAttr::sequential().with_pack(0).with_size(24);
        let layout = StructLayoutSpec::from_attr(Some(&attr), "S").unwrap();
        assert_eq!(layout.pack, DEFAULT_PACK);
        assert_eq!(layout.size, 24);
    }

    #[test]
    fn test_rejects_odd_pack() {
        let attr = LayoutAttr::sequential().with_pack(3);
        let err = StructLayoutSpec::from_attr(Some(&attr), "S").unwrap_err();
        assert!(matches!(err, LayoutError::InvalidLayout { parameter: "Pack", value: 3, .. }));
    }

    #[test]
    fn test_flattened_attr() {
        let attr = StructLayoutSpec::flattened_attr(56);
        assert_eq!(attr.kind, LayoutKind::Explicit);
        assert_eq!(attr.pack, Some(1));
        assert_eq!(attr.size, Some(56));
    }
}
