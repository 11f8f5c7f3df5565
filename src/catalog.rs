//! Equipped-item catalog
//!
//! Swords carry the stats the simulation reads (length, width, damage
//! multiplier); skins are colours only and pass straight through to rendering.
//! The shop/inventory side owns cost and rarity, they ride along here so one
//! JSON table can feed both.

use serde::{Deserialize, Serialize};

use crate::consts::{SWORD_BASE_LENGTH, SWORD_BASE_WIDTH};

/// Item rarity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
}

/// Sword stat block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwordStats {
    pub id: String,
    pub name: String,
    pub cost: u32,
    /// Blade length from the wielder's center (pixels)
    pub length: f32,
    /// Blade width (rendering and AI reach padding)
    pub width: f32,
    /// Scales the ball speed boost on a sword deflection
    pub damage_multiplier: f32,
    pub color: String,
    #[serde(default)]
    pub rarity: Rarity,
}

impl Default for SwordStats {
    fn default() -> Self {
        Self {
            id: "wooden_sword".into(),
            name: "Wooden Sword".into(),
            cost: 0,
            length: SWORD_BASE_LENGTH,
            width: SWORD_BASE_WIDTH,
            damage_multiplier: 1.0,
            color: "#8B4513".into(),
            rarity: Rarity::Common,
        }
    }
}

/// Skin colour triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkinColors {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
}

/// Cosmetic skin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkinItem {
    pub id: String,
    pub name: String,
    pub cost: u32,
    pub colors: SkinColors,
    #[serde(default)]
    pub rarity: Rarity,
}

/// Read-only item tables, immutable for the duration of a round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCatalog {
    pub swords: Vec<SwordStats>,
    pub skins: Vec<SkinItem>,
}

impl Default for ItemCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ItemCatalog {
    /// The stock item tables
    pub fn builtin() -> Self {
        let swords = [
            ("wooden_sword", "Wooden Sword", 0, 60.0, 10.0, 1.0, "#8B4513", Rarity::Common),
            ("iron_blade", "Iron Blade", 100, 70.0, 12.0, 1.1, "#7f8c8d", Rarity::Common),
            ("bronze_saber", "Bronze Saber", 150, 65.0, 11.0, 1.15, "#cd7f32", Rarity::Common),
            ("steel_katana", "Steel Katana", 250, 80.0, 8.0, 1.2, "#95a5a6", Rarity::Rare),
            ("silver_rapier", "Silver Rapier", 300, 85.0, 6.0, 1.25, "#c0c0c0", Rarity::Rare),
            ("emerald_blade", "Emerald Blade", 400, 75.0, 13.0, 1.3, "#2ecc71", Rarity::Rare),
            ("flame_sword", "Flame Sword", 500, 75.0, 15.0, 1.4, "#e74c3c", Rarity::Epic),
            ("ice_blade", "Ice Blade", 500, 85.0, 10.0, 1.3, "#3498db", Rarity::Epic),
            ("thunder_strike", "Thunder Strike", 600, 78.0, 14.0, 1.45, "#f1c40f", Rarity::Epic),
            ("crystal_edge", "Crystal Edge", 700, 82.0, 9.0, 1.5, "#9b59b6", Rarity::Epic),
            ("shadow_reaper", "Shadow Reaper", 1000, 90.0, 14.0, 1.6, "#2c3e50", Rarity::Legendary),
            ("dragon_fang", "Dragon Fang", 1500, 100.0, 18.0, 1.8, "#e67e22", Rarity::Legendary),
            ("celestial_blade", "Celestial Blade", 1200, 95.0, 12.0, 1.7, "#00f5ff", Rarity::Legendary),
            ("void_destroyer", "Void Destroyer", 2000, 105.0, 20.0, 2.0, "#8b00ff", Rarity::Legendary),
        ]
        .into_iter()
        .map(
            |(id, name, cost, length, width, damage_multiplier, color, rarity)| SwordStats {
                id: id.into(),
                name: name.into(),
                cost,
                length,
                width,
                damage_multiplier,
                color: color.into(),
                rarity,
            },
        )
        .collect();

        let skins = [
            ("default_hero", "Default Hero", 0, ["#00ff88", "#00cc6a", "#ffffff"], Rarity::Common),
            ("red_warrior", "Red Warrior", 150, ["#e74c3c", "#c0392b", "#ecf0f1"], Rarity::Common),
            ("blue_knight", "Blue Knight", 150, ["#3498db", "#2980b9", "#ecf0f1"], Rarity::Common),
            ("shadow_ninja", "Shadow Ninja", 200, ["#2c3e50", "#34495e", "#e74c3c"], Rarity::Rare),
            ("forest_ranger", "Forest Ranger", 250, ["#27ae60", "#229954", "#f39c12"], Rarity::Rare),
            ("golden_knight", "Golden Knight", 400, ["#f39c12", "#f1c40f", "#e67e22"], Rarity::Epic),
            ("ice_guardian", "Ice Guardian", 450, ["#00d2d3", "#3498db", "#ffffff"], Rarity::Epic),
            ("neon_samurai", "Neon Samurai", 800, ["#ff006e", "#8338ec", "#00f5ff"], Rarity::Legendary),
            ("cosmic_champion", "Cosmic Champion", 900, ["#9b59b6", "#5f27cd", "#ffd93d"], Rarity::Legendary),
            ("inferno_demon", "Inferno Demon", 750, ["#ff4757", "#ee5a6f", "#000000"], Rarity::Legendary),
            ("royal_paladin", "Royal Paladin", 500, ["#ffffff", "#ecf0f1", "#f39c12"], Rarity::Epic),
            ("void_walker", "Void Walker", 850, ["#1e1e1e", "#2c2c54", "#9b59b6"], Rarity::Legendary),
        ]
        .into_iter()
        .map(|(id, name, cost, [primary, secondary, accent], rarity)| SkinItem {
            id: id.into(),
            name: name.into(),
            cost,
            colors: SkinColors {
                primary: primary.into(),
                secondary: secondary.into(),
                accent: accent.into(),
            },
            rarity,
        })
        .collect();

        Self { swords, skins }
    }

    /// Parse a catalog from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Look up a sword by id, if present
    pub fn find_sword(&self, id: &str) -> Option<&SwordStats> {
        self.swords.iter().find(|s| s.id == id)
    }

    /// Look up a sword by id, falling back to the first entry (then the
    /// built-in default) for unknown ids
    pub fn sword(&self, id: &str) -> SwordStats {
        if let Some(sword) = self.find_sword(id) {
            return sword.clone();
        }
        log::warn!("Unknown sword id {id:?}, using fallback");
        self.swords.first().cloned().unwrap_or_default()
    }

    /// Look up a skin by id, falling back to the first entry
    pub fn skin(&self, id: &str) -> Option<&SkinItem> {
        self.skins
            .iter()
            .find(|s| s.id == id)
            .or_else(|| self.skins.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables() {
        let catalog = ItemCatalog::builtin();
        assert_eq!(catalog.swords.len(), 14);
        assert_eq!(catalog.skins.len(), 12);

        let katana = catalog.sword("steel_katana");
        assert_eq!(katana.length, 80.0);
        assert_eq!(katana.damage_multiplier, 1.2);
    }

    #[test]
    fn test_unknown_ids_fall_back() {
        let catalog = ItemCatalog::builtin();
        assert_eq!(catalog.sword("no_such_blade").id, "wooden_sword");
        assert_eq!(catalog.skin("no_such_skin").map(|s| s.id.as_str()), Some("default_hero"));

        let empty = ItemCatalog { swords: Vec::new(), skins: Vec::new() };
        assert_eq!(empty.sword("iron_blade"), SwordStats::default());
        assert!(empty.skin("default_hero").is_none());
    }

    #[test]
    fn test_catalog_json_round_trip_shape() {
        let json = r##"{
            "swords": [{
                "id": "test_blade", "name": "Test", "cost": 5,
                "length": 42.0, "width": 3.0, "damageMultiplier": 1.5,
                "color": "#fff", "rarity": "epic"
            }],
            "skins": []
        }"##;
        let catalog = ItemCatalog::from_json(json).expect("valid catalog");
        let blade = catalog.sword("test_blade");
        assert_eq!(blade.damage_multiplier, 1.5);
        assert_eq!(blade.rarity, Rarity::Epic);

        assert!(ItemCatalog::from_json("{ not json").is_err());
    }
}
