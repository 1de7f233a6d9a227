use crate::{AlbumLayout, Roster};
use serde::{Deserialize, Serialize};

pub const DEFAULT_COINS: u64 = 80;
pub const DEFAULT_CLICK_POWER: u32 = 1;

/// Share of the chest price refunded for a duplicate normal pull.
pub const DUPLICATE_NORMAL_REFUND: f64 = 0.14;
/// Share of the chest price refunded for a duplicate shiny pull.
pub const DUPLICATE_SHINY_REFUND: f64 = 0.45;

pub const DUPLICATE_DECAY: f64 = 1.22;
pub const MIN_SELECTION_WEIGHT: f64 = 0.10;
pub const CREST_WEIGHT_MULTIPLIER: f64 = 0.28;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChestKind {
    Common,
    Rare,
    Epic,
}

impl ChestKind {
    pub const ALL: [ChestKind; 3] = [ChestKind::Common, ChestKind::Rare, ChestKind::Epic];

    pub fn key(self) -> &'static str {
        match self {
            ChestKind::Common => "common",
            ChestKind::Rare => "rare",
            ChestKind::Epic => "epic",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(key.trim()))
    }

    fn index(self) -> usize {
        match self {
            ChestKind::Common => 0,
            ChestKind::Rare => 1,
            ChestKind::Epic => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChestDefinition {
    pub kind: ChestKind,
    pub title: String,
    pub cards_per_open: u8,
    pub base_price: u64,
    pub shiny_base_chance: f64,
    pub shiny_chance_if_owns_normal_only: f64,
}

impl ChestDefinition {
    pub fn standard(kind: ChestKind) -> Self {
        let (title, cards_per_open, base_price, shiny_base_chance, shiny_boost) = match kind {
            ChestKind::Common => ("Sports Bag", 2, 250, 0.015, 0.10),
            ChestKind::Rare => ("Duffel Bag", 3, 1000, 0.02, 0.13),
            ChestKind::Epic => ("Suitcase", 5, 5000, 0.028, 0.16),
        };
        Self {
            kind,
            title: title.to_string(),
            cards_per_open,
            base_price,
            shiny_base_chance,
            shiny_chance_if_owns_normal_only: shiny_boost,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeKind {
    Click,
    Idle,
    Discount,
    Scout,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 4] = [
        UpgradeKind::Click,
        UpgradeKind::Idle,
        UpgradeKind::Discount,
        UpgradeKind::Scout,
    ];

    pub fn key(self) -> &'static str {
        match self {
            UpgradeKind::Click => "click",
            UpgradeKind::Idle => "idle",
            UpgradeKind::Discount => "discount",
            UpgradeKind::Scout => "scout",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(key.trim()))
    }
}

/// Static game configuration: the roster, its album layout and the three
/// chests.
#[derive(Debug, Clone, PartialEq)]
pub struct LootConfig {
    pub roster: Roster,
    pub album: AlbumLayout,
    pub chests: [ChestDefinition; 3],
}

impl LootConfig {
    /// Swaps in a custom roster, laid out in roster order in the album.
    pub fn with_roster(roster: Roster) -> Self {
        Self {
            album: AlbumLayout::from_roster(&roster),
            roster,
            ..Self::default()
        }
    }

    pub fn chest(&self, kind: ChestKind) -> &ChestDefinition {
        &self.chests[kind.index()]
    }
}

impl Default for LootConfig {
    fn default() -> Self {
        Self {
            roster: Roster::standard(),
            album: AlbumLayout::standard(),
            chests: ChestKind::ALL.map(ChestDefinition::standard),
        }
    }
}
