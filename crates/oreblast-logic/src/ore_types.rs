//! Ore type names, colors, and values.
//!
//! A flat lookup with an explicit fallback branch. Renderers use the colors,
//! session scoring uses the values; the engine itself only needs
//! [`normalize_ore_type`] and the destroyed sentinel.

use serde::{Deserialize, Serialize};

/// Sentinel ore type written into cells consumed by a blast.
pub const DESTROYED_ORE_TYPE: &str = "destroyed";

pub const GOLD: &str = "gold";
pub const SILVER: &str = "silver";
pub const COPPER: &str = "copper";
pub const IRON: &str = "iron";
pub const COAL: &str = "coal";
pub const WASTE: &str = "waste";

/// Display and economic properties of an ore type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OreTypeInfo {
    pub color: [u8; 3],
    pub value: u32,
}

/// Returned for any ore type not in the table.
pub const UNKNOWN_ORE: OreTypeInfo = OreTypeInfo {
    color: [128, 128, 128],
    value: 0,
};

/// Canonical form of an ore type name: trimmed and lowercased.
pub fn normalize_ore_type(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Look up color and value for an ore type. Unknown names fall back to
/// [`UNKNOWN_ORE`].
pub fn ore_type_info(ore_type: &str) -> OreTypeInfo {
    match normalize_ore_type(ore_type).as_str() {
        GOLD => OreTypeInfo {
            color: [255, 215, 0],
            value: 100,
        },
        SILVER => OreTypeInfo {
            color: [192, 192, 192],
            value: 50,
        },
        COPPER => OreTypeInfo {
            color: [184, 115, 51],
            value: 30,
        },
        IRON => OreTypeInfo {
            color: [139, 69, 19],
            value: 20,
        },
        COAL => OreTypeInfo {
            color: [54, 54, 54],
            value: 10,
        },
        WASTE => OreTypeInfo {
            color: [160, 140, 120],
            value: 0,
        },
        DESTROYED_ORE_TYPE => OreTypeInfo {
            color: [20, 20, 20],
            value: 0,
        },
        _ => UNKNOWN_ORE,
    }
}

/// Whether the name has its own entry rather than the fallback.
pub fn is_known_ore_type(ore_type: &str) -> bool {
    matches!(
        normalize_ore_type(ore_type).as_str(),
        GOLD | SILVER | COPPER | IRON | COAL | WASTE | DESTROYED_ORE_TYPE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_lowercases() {
        assert_eq!(normalize_ore_type("  Gold "), "gold");
        assert_eq!(normalize_ore_type("IRON"), "iron");
    }

    #[test]
    fn test_known_types() {
        assert_eq!(ore_type_info("gold").value, 100);
        assert_eq!(ore_type_info(" Copper").color, [184, 115, 51]);
        assert!(is_known_ore_type("Silver"));
    }

    #[test]
    fn test_unknown_falls_back() {
        assert_eq!(ore_type_info("unobtainium"), UNKNOWN_ORE);
        assert!(!is_known_ore_type("unobtainium"));
    }

    #[test]
    fn test_destroyed_has_no_value() {
        assert_eq!(ore_type_info(DESTROYED_ORE_TYPE).value, 0);
    }
}
