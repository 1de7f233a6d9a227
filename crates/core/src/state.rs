use crate::{CardId, Variant, VariantKey, DEFAULT_CLICK_POWER, DEFAULT_COINS};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Per-card collection record, created on the first pull of that card.
///
/// The flags are never cleared; the copy counters only feed the selection
/// weight. `*_copies > 0` holds exactly when the matching flag is set.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipRecord {
    #[serde(default, alias = "n")]
    pub has_normal: bool,
    #[serde(default, alias = "s")]
    pub has_shiny: bool,
    #[serde(default, alias = "cn")]
    pub normal_copies: u32,
    #[serde(default, alias = "cs")]
    pub shiny_copies: u32,
}

impl OwnershipRecord {
    pub fn owns_any(&self) -> bool {
        self.has_normal || self.has_shiny
    }

    pub fn owns(&self, variant: Variant) -> bool {
        match variant {
            Variant::Normal => self.has_normal,
            Variant::Shiny => self.has_shiny,
        }
    }

    pub fn total_copies(&self) -> u32 {
        self.normal_copies.saturating_add(self.shiny_copies)
    }

    /// Marks `variant` owned and counts one more copy. Returns whether the
    /// variant was new.
    pub fn add_copy(&mut self, variant: Variant) -> bool {
        let (flag, copies) = match variant {
            Variant::Normal => (&mut self.has_normal, &mut self.normal_copies),
            Variant::Shiny => (&mut self.has_shiny, &mut self.shiny_copies),
        };
        let was_owned = *flag;
        *flag = true;
        *copies = copies.saturating_add(1);
        !was_owned
    }

    /// Restores `copies > 0 <=> flag` for records from outside the engine.
    pub fn reconcile(&mut self) {
        reconcile_pair(&mut self.has_normal, &mut self.normal_copies);
        reconcile_pair(&mut self.has_shiny, &mut self.shiny_copies);
    }
}

fn reconcile_pair(flag: &mut bool, copies: &mut u32) {
    if *copies > 0 {
        *flag = true;
    } else if *flag {
        *copies = 1;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub coins: u64,
    pub click_power: u32,
    pub idle_per_sec: u32,
    pub discount_level: u32,
    pub scout_level: u32,
    pub owned: BTreeMap<CardId, OwnershipRecord>,
    /// Variants acquired but not yet looked at.
    pub pending_new: BTreeSet<VariantKey>,
    /// New variants from the most recent chest, in pull order.
    pub last_acquired: Vec<VariantKey>,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            coins: DEFAULT_COINS,
            click_power: DEFAULT_CLICK_POWER,
            idle_per_sec: 0,
            discount_level: 0,
            scout_level: 0,
            owned: BTreeMap::new(),
            pending_new: BTreeSet::new(),
            last_acquired: Vec::new(),
        }
    }

    pub fn credit(&mut self, amount: u64) {
        self.coins = self.coins.saturating_add(amount);
    }

    /// Subtracts `amount`, flooring at zero. Does not check affordability;
    /// callers gate purchases on [`GameState::can_afford`] first.
    pub fn debit(&mut self, amount: u64) {
        self.coins = self.coins.saturating_sub(amount);
    }

    pub fn can_afford(&self, cost: u64) -> bool {
        self.coins >= cost
    }

    pub fn record(&self, card: &CardId) -> Option<&OwnershipRecord> {
        self.owned.get(card)
    }

    pub fn owns_any(&self, card: &CardId) -> bool {
        self.record(card).is_some_and(OwnershipRecord::owns_any)
    }

    pub fn owns(&self, card: &CardId, variant: Variant) -> bool {
        self.record(card).is_some_and(|record| record.owns(variant))
    }

    pub fn is_pending(&self, card: &CardId, variant: Variant) -> bool {
        self.pending_new
            .contains(&VariantKey::new(card.clone(), variant))
    }

    /// Clears the "new" marker for a variant. Returns whether one was set.
    pub fn acknowledge(&mut self, card: &CardId, variant: Variant) -> bool {
        self.pending_new
            .remove(&VariantKey::new(card.clone(), variant))
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
