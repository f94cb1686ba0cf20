//! Canonical object type names and their historical alias spellings.
//!
//! Map files from older editor versions carry two or three spellings for
//! the same building or vehicle type. The parser resolves every spelling to
//! one canonical id before records reach the validator, so canonical-type
//! rules apply uniformly.

use crate::objects::ObjectKind;

/// One canonical type with its accepted alias spellings.
struct TypeEntry {
    kind: ObjectKind,
    canonical: &'static str,
    aliases: &'static [&'static str],
}

const TYPES: &[TypeEntry] = &[
    // Buildings
    TypeEntry {
        kind: ObjectKind::Building,
        canonical: "BuildingToolStore_C",
        aliases: &["toolstore", "tool_store", "BuildingToolStore"],
    },
    TypeEntry {
        kind: ObjectKind::Building,
        canonical: "BuildingTeleportPad_C",
        aliases: &["teleportpad", "teleport_pad", "BuildingTeleportPad"],
    },
    TypeEntry {
        kind: ObjectKind::Building,
        canonical: "BuildingPowerStation_C",
        aliases: &["powerstation", "power_station", "BuildingPowerStation"],
    },
    TypeEntry {
        kind: ObjectKind::Building,
        canonical: "BuildingSupportStation_C",
        aliases: &["supportstation", "support_station"],
    },
    TypeEntry {
        kind: ObjectKind::Building,
        canonical: "BuildingUpgradeStation_C",
        aliases: &["upgradestation", "upgrade_station"],
    },
    TypeEntry {
        kind: ObjectKind::Building,
        canonical: "BuildingGeologicalCenter_C",
        aliases: &["geologicalcenter", "geodome"],
    },
    TypeEntry {
        kind: ObjectKind::Building,
        canonical: "BuildingOreRefinery_C",
        aliases: &["orerefinery", "ore_refinery"],
    },
    TypeEntry {
        kind: ObjectKind::Building,
        canonical: "BuildingCanteen_C",
        aliases: &["canteen"],
    },
    TypeEntry {
        kind: ObjectKind::Building,
        canonical: "BuildingMiningLaser_C",
        aliases: &["mininglaser", "mining_laser"],
    },
    TypeEntry {
        kind: ObjectKind::Building,
        canonical: "BuildingSuperTeleport_C",
        aliases: &["superteleport", "super_teleport"],
    },
    TypeEntry {
        kind: ObjectKind::Building,
        canonical: "BuildingDocks_C",
        aliases: &["docks"],
    },
    TypeEntry {
        kind: ObjectKind::Building,
        canonical: "BuildingElectricFence_C",
        aliases: &["electricfence", "electric_fence"],
    },
    // Vehicles
    TypeEntry {
        kind: ObjectKind::Vehicle,
        canonical: "VehicleHoverScout_C",
        aliases: &["hoverscout", "hover_scout"],
    },
    TypeEntry {
        kind: ObjectKind::Vehicle,
        canonical: "VehicleSmallDigger_C",
        aliases: &["smalldigger", "small_digger"],
    },
    TypeEntry {
        kind: ObjectKind::Vehicle,
        canonical: "VehicleSmallTransportTruck_C",
        aliases: &["smalltransporttruck", "transporttruck"],
    },
    TypeEntry {
        kind: ObjectKind::Vehicle,
        canonical: "VehicleRapidRider_C",
        aliases: &["rapidrider", "rapid_rider"],
    },
    TypeEntry {
        kind: ObjectKind::Vehicle,
        canonical: "VehicleTunnelScout_C",
        aliases: &["tunnelscout", "tunnel_scout"],
    },
    TypeEntry {
        kind: ObjectKind::Vehicle,
        canonical: "VehicleLoaderDozer_C",
        aliases: &["loaderdozer", "loader_dozer"],
    },
    TypeEntry {
        kind: ObjectKind::Vehicle,
        canonical: "VehicleGraniteGrinder_C",
        aliases: &["granitegrinder", "granite_grinder"],
    },
    TypeEntry {
        kind: ObjectKind::Vehicle,
        canonical: "VehicleChromeCrusher_C",
        aliases: &["chromecrusher", "chrome_crusher"],
    },
    TypeEntry {
        kind: ObjectKind::Vehicle,
        canonical: "VehicleLMLC_C",
        aliases: &["lmlc", "largemobilelaser"],
    },
    TypeEntry {
        kind: ObjectKind::Vehicle,
        canonical: "VehicleCargoCarrier_C",
        aliases: &["cargocarrier", "cargo_carrier"],
    },
    // Creatures
    TypeEntry {
        kind: ObjectKind::Creature,
        canonical: "CreatureRockMonster_C",
        aliases: &["rockmonster", "rock_monster"],
    },
    TypeEntry {
        kind: ObjectKind::Creature,
        canonical: "CreatureLavaMonster_C",
        aliases: &["lavamonster", "lava_monster"],
    },
    TypeEntry {
        kind: ObjectKind::Creature,
        canonical: "CreatureIceMonster_C",
        aliases: &["icemonster", "ice_monster"],
    },
    TypeEntry {
        kind: ObjectKind::Creature,
        canonical: "CreatureSlimySlug_C",
        aliases: &["slimyslug", "slimy_slug", "slug"],
    },
    TypeEntry {
        kind: ObjectKind::Creature,
        canonical: "CreatureSmallSpider_C",
        aliases: &["smallspider", "small_spider"],
    },
    TypeEntry {
        kind: ObjectKind::Creature,
        canonical: "CreatureBat_C",
        aliases: &["bat"],
    },
    // Miners
    TypeEntry {
        kind: ObjectKind::Miner,
        canonical: "Pilot_C",
        aliases: &["pilot", "miner"],
    },
];

/// Resolve a type spelling for `kind` to its canonical name.
///
/// Matching is case-insensitive for aliases and exact for canonical names.
/// Returns `None` for unknown spellings.
pub fn resolve_type(kind: ObjectKind, spelling: &str) -> Option<&'static str> {
    let lowered = spelling.to_ascii_lowercase();
    TYPES
        .iter()
        .filter(|entry| entry.kind == kind)
        .find(|entry| {
            entry.canonical == spelling
                || entry.canonical.to_ascii_lowercase() == lowered
                || entry.aliases.iter().any(|a| a.to_ascii_lowercase() == lowered)
        })
        .map(|entry| entry.canonical)
}

/// All canonical names for a kind, used for collection references in the
/// script (`buildings.BuildingToolStore_C`).
pub fn canonical_names(kind: ObjectKind) -> impl Iterator<Item = &'static str> {
    TYPES
        .iter()
        .filter(move |entry| entry.kind == kind)
        .map(|entry| entry.canonical)
}

/// Whether `name` is a canonical type name of any kind.
pub fn is_canonical(name: &str) -> bool {
    TYPES.iter().any(|entry| entry.canonical == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_spelling_resolves_to_itself() {
        assert_eq!(
            resolve_type(ObjectKind::Building, "BuildingToolStore_C"),
            Some("BuildingToolStore_C")
        );
    }

    #[test]
    fn historical_aliases_resolve() {
        assert_eq!(
            resolve_type(ObjectKind::Building, "toolstore"),
            Some("BuildingToolStore_C")
        );
        assert_eq!(
            resolve_type(ObjectKind::Building, "Tool_Store"),
            Some("BuildingToolStore_C")
        );
        assert_eq!(
            resolve_type(ObjectKind::Creature, "SLUG"),
            Some("CreatureSlimySlug_C")
        );
    }

    #[test]
    fn kind_mismatch_is_unknown() {
        assert_eq!(resolve_type(ObjectKind::Vehicle, "toolstore"), None);
    }

    #[test]
    fn unknown_spelling_is_none() {
        assert_eq!(resolve_type(ObjectKind::Building, "nosuchthing"), None);
    }

    #[test]
    fn canonical_names_enumerate_per_kind() {
        let buildings: Vec<_> = canonical_names(ObjectKind::Building).collect();
        assert!(buildings.contains(&"BuildingToolStore_C"));
        assert!(buildings.iter().all(|name| is_canonical(name)));
        assert!(!buildings.contains(&"VehicleHoverScout_C"));
    }
}
