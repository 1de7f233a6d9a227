//! Pull engine: card identity selection, the shiny roll, and applying a pull
//! to the collection (including duplicate refunds).
//!
//! Every draw goes through a [`RandomSource`], one `next_f64` per decision,
//! so a seeded or scripted source reproduces a chest exactly.

use crate::curves::scout_bias_fraction;
use crate::{
    CardId, ChestDefinition, GameState, OwnershipRecord, RandomSource, Roster, Variant,
    VariantKey, CREST_WEIGHT_MULTIPLIER, DUPLICATE_DECAY, DUPLICATE_NORMAL_REFUND,
    DUPLICATE_SHINY_REFUND, MIN_SELECTION_WEIGHT,
};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullResult {
    pub card: CardId,
    pub is_shiny: bool,
    pub is_new_variant: bool,
    pub refund_granted: u64,
}

impl PullResult {
    pub fn variant(&self) -> Variant {
        Variant::from_shiny(self.is_shiny)
    }

    pub fn key(&self) -> VariantKey {
        VariantKey::new(self.card.clone(), self.variant())
    }
}

/// A selected card identity and whether the scout bias picked it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardPick {
    pub card: CardId,
    pub scouted: bool,
}

/// Relative chance of `card` being selected on an unbiased draw.
///
/// Unowned cards weigh 1.0. Owned cards decay with the number of copies held
/// but never drop below [`MIN_SELECTION_WEIGHT`]. The crest card is scaled
/// down on top of that.
pub fn selection_weight(record: Option<&OwnershipRecord>, is_crest: bool) -> f64 {
    let mut weight = match record {
        Some(record) if record.owns_any() => {
            let copies = record.total_copies() as f64;
            (1.0 / (1.0 + copies).powf(DUPLICATE_DECAY)).max(MIN_SELECTION_WEIGHT)
        }
        _ => 1.0,
    };
    if is_crest {
        weight *= CREST_WEIGHT_MULTIPLIER;
    }
    weight
}

pub fn pick_card(
    state: &GameState,
    roster: &Roster,
    rng: &mut dyn RandomSource,
) -> Option<CardPick> {
    let mut all = Vec::with_capacity(roster.len());
    let mut missing = Vec::new();
    for card in roster.cards() {
        let weight = selection_weight(state.record(card), roster.is_crest(card));
        all.push((card, weight));
        if !state.owns_any(card) {
            missing.push((card, weight));
        }
    }

    let bias = scout_bias_fraction(state.scout_level);
    if !missing.is_empty() && bias > 0.0 && rng.next_f64() < bias {
        return pick_weighted(&missing, rng).map(|card| CardPick {
            card: card.clone(),
            scouted: true,
        });
    }
    pick_weighted(&all, rng).map(|card| CardPick {
        card: card.clone(),
        scouted: false,
    })
}

/// Draws from `[0, total)` and walks the list subtracting weights until the
/// remainder is no longer positive.
pub fn pick_weighted<T: Copy>(items: &[(T, f64)], rng: &mut dyn RandomSource) -> Option<T> {
    let (last, _) = items.last()?;
    let total: f64 = items.iter().map(|(_, weight)| weight).sum();
    let mut roll = rng.next_f64() * total;
    for (item, weight) in items {
        roll -= weight;
        if roll <= 0.0 {
            return Some(*item);
        }
    }
    // Float drift can leave a sliver of remainder.
    Some(*last)
}

/// Chests boost the shiny odds for cards held only as normal.
pub fn shiny_chance(record: Option<&OwnershipRecord>, chest: &ChestDefinition) -> f64 {
    match record {
        Some(record) if record.has_normal && !record.has_shiny => {
            chest.shiny_chance_if_owns_normal_only
        }
        _ => chest.shiny_base_chance,
    }
}

pub fn roll_variant(
    state: &GameState,
    card: &CardId,
    chest: &ChestDefinition,
    rng: &mut dyn RandomSource,
) -> Variant {
    let chance = shiny_chance(state.record(card), chest);
    Variant::from_shiny(rng.next_f64() < chance)
}

pub fn refund_for_duplicate(variant: Variant, price_paid: u64) -> u64 {
    let share = match variant {
        Variant::Normal => DUPLICATE_NORMAL_REFUND,
        Variant::Shiny => DUPLICATE_SHINY_REFUND,
    };
    (price_paid as f64 * share).floor() as u64
}

/// Records one pull in the collection. Duplicates are refunded straight into
/// the coin balance; new variants are queued for acknowledgement.
pub fn apply_pull(
    state: &mut GameState,
    card: &CardId,
    variant: Variant,
    price_paid: u64,
) -> PullResult {
    let is_new = state.owned.entry(card.clone()).or_default().add_copy(variant);
    let mut refund = 0;
    if is_new {
        let key = VariantKey::new(card.clone(), variant);
        state.pending_new.insert(key.clone());
        state.last_acquired.push(key);
    } else {
        refund = refund_for_duplicate(variant, price_paid);
        state.credit(refund);
    }
    debug!("pulled {card} ({variant:?}) new={is_new} refund={refund}");
    PullResult {
        card: card.clone(),
        is_shiny: variant == Variant::Shiny,
        is_new_variant: is_new,
        refund_granted: refund,
    }
}

/// Generates and applies every pull of one chest, in order. Later slots see
/// the ownership changes of earlier ones.
pub fn generate_pulls(
    state: &mut GameState,
    roster: &Roster,
    chest: &ChestDefinition,
    price_paid: u64,
    rng: &mut dyn RandomSource,
) -> Vec<PullResult> {
    state.last_acquired.clear();
    let mut pulls = Vec::with_capacity(chest.cards_per_open as usize);
    for _ in 0..chest.cards_per_open {
        let Some(pick) = pick_card(state, roster, rng) else {
            break;
        };
        let variant = roll_variant(state, &pick.card, chest, rng);
        pulls.push(apply_pull(state, &pick.card, variant, price_paid));
    }
    pulls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChestKind, RngState};
    use std::collections::VecDeque;

    struct Scripted(VecDeque<f64>);

    impl Scripted {
        fn new(values: &[f64]) -> Self {
            Self(values.iter().copied().collect())
        }
    }

    impl RandomSource for Scripted {
        fn next_f64(&mut self) -> f64 {
            self.0.pop_front().unwrap_or(0.5)
        }
    }

    fn owned_normal(state: &mut GameState, card: &CardId, copies: u32) {
        state.owned.insert(
            card.clone(),
            OwnershipRecord {
                has_normal: true,
                normal_copies: copies,
                ..OwnershipRecord::default()
            },
        );
    }

    #[test]
    fn weights_decay_with_copies_down_to_the_floor() {
        assert_eq!(selection_weight(None, false), 1.0);
        assert_eq!(selection_weight(None, true), 0.28);
        let one = OwnershipRecord {
            has_normal: true,
            normal_copies: 1,
            ..OwnershipRecord::default()
        };
        let expected = 1.0 / 2f64.powf(1.22);
        assert!((selection_weight(Some(&one), false) - expected).abs() < 1e-12);
        let many = OwnershipRecord {
            has_normal: true,
            has_shiny: true,
            normal_copies: 40,
            shiny_copies: 3,
        };
        assert_eq!(selection_weight(Some(&many), false), 0.10);
        assert!((selection_weight(Some(&many), true) - 0.028).abs() < 1e-12);
    }

    #[test]
    fn weighted_walk_includes_the_boundary() {
        let items = [('a', 1.0), ('b', 3.0)];
        assert_eq!(pick_weighted(&items, &mut Scripted::new(&[0.2])), Some('a'));
        assert_eq!(pick_weighted(&items, &mut Scripted::new(&[0.25])), Some('a'));
        assert_eq!(pick_weighted(&items, &mut Scripted::new(&[0.3])), Some('b'));
        let empty: [(char, f64); 0] = [];
        assert_eq!(pick_weighted(&empty, &mut Scripted::new(&[0.3])), None);
    }

    #[test]
    fn crest_frequency_tracks_its_multiplier() {
        let state = GameState::new();
        let roster = Roster::standard();
        let crest = CardId::new("p25");
        let mut rng = RngState::from_seed(0x5EED);
        let samples = 100_000;
        let mut hits = 0;
        for _ in 0..samples {
            let pick = pick_card(&state, &roster, &mut rng).expect("pick");
            if pick.card == crest {
                hits += 1;
            }
        }
        let expected = 0.28 / (24.0 + 0.28);
        let observed = hits as f64 / samples as f64;
        assert!(
            (observed - expected).abs() < 0.002,
            "observed {observed}, expected {expected}"
        );
    }

    #[test]
    fn full_scout_bias_restricts_a_quarter_of_draws_to_missing_cards() {
        let mut state = GameState::new();
        state.scout_level = 20;
        let roster = Roster::standard();
        for number in 1..=20 {
            owned_normal(&mut state, &CardId::player(number), 1);
        }
        let mut rng = RngState::from_seed(99);
        let samples = 100_000;
        let mut scouted = 0;
        for _ in 0..samples {
            let pick = pick_card(&state, &roster, &mut rng).expect("pick");
            if pick.scouted {
                scouted += 1;
                assert!(!state.owns_any(&pick.card), "scouted {}", pick.card);
            }
        }
        let observed = scouted as f64 / samples as f64;
        assert!((observed - 0.25).abs() < 0.01, "observed {observed}");
    }

    #[test]
    fn scout_roll_is_skipped_when_nothing_is_missing() {
        let mut state = GameState::new();
        state.scout_level = 20;
        let roster = Roster::new(vec![CardId::player(1), CardId::player(2)], None);
        owned_normal(&mut state, &CardId::player(1), 1);
        owned_normal(&mut state, &CardId::player(2), 1);
        // Only the identity draw is consumed: 0.9 lands on the second card.
        let mut rng = Scripted::new(&[0.9, 0.0]);
        let pick = pick_card(&state, &roster, &mut rng).expect("pick");
        assert_eq!(pick.card, CardId::player(2));
        assert!(!pick.scouted);
        assert_eq!(rng.next_f64(), 0.0);
    }

    #[test]
    fn shiny_chance_depends_on_normal_only_ownership() {
        let chest = ChestDefinition::standard(ChestKind::Rare);
        assert_eq!(shiny_chance(None, &chest), 0.02);
        let normal_only = OwnershipRecord {
            has_normal: true,
            normal_copies: 1,
            ..OwnershipRecord::default()
        };
        assert_eq!(shiny_chance(Some(&normal_only), &chest), 0.13);
        let both = OwnershipRecord {
            has_shiny: true,
            shiny_copies: 1,
            ..normal_only
        };
        assert_eq!(shiny_chance(Some(&both), &chest), 0.02);
    }

    #[test]
    fn duplicate_refunds_use_the_chest_price() {
        let mut state = GameState::new();
        state.coins = 0;
        let card = CardId::player(5);

        let first = apply_pull(&mut state, &card, Variant::Normal, 1000);
        assert!(first.is_new_variant);
        assert_eq!(first.refund_granted, 0);
        assert_eq!(state.pending_new.len(), 1);

        let dup = apply_pull(&mut state, &card, Variant::Normal, 1000);
        assert!(!dup.is_new_variant);
        assert_eq!(dup.refund_granted, 140);
        assert_eq!(state.coins, 140);

        apply_pull(&mut state, &card, Variant::Shiny, 1000);
        assert_eq!(state.pending_new.len(), 2);
        let shiny_dup = apply_pull(&mut state, &card, Variant::Shiny, 1000);
        assert_eq!(shiny_dup.refund_granted, 450);
        assert_eq!(state.coins, 590);
        assert_eq!(state.pending_new.len(), 2);
    }

    #[test]
    fn later_slots_see_earlier_pulls() {
        let mut state = GameState::new();
        let roster = Roster::new(vec![CardId::player(1)], None);
        let chest = ChestDefinition::standard(ChestKind::Rare);
        state
            .last_acquired
            .push(VariantKey::new(CardId::player(9), Variant::Shiny));
        let coins = state.coins;

        let pulls = generate_pulls(&mut state, &roster, &chest, 1000, &mut Scripted::new(&[]));

        assert_eq!(pulls.len(), 3);
        assert!(pulls[0].is_new_variant);
        assert!(!pulls[1].is_new_variant);
        assert!(!pulls[2].is_new_variant);
        assert_eq!(state.coins, coins + 280);
        assert_eq!(
            state.last_acquired,
            vec![VariantKey::new(CardId::player(1), Variant::Normal)]
        );
        assert_eq!(state.record(&CardId::player(1)).map(|r| r.normal_copies), Some(3));
    }

    #[test]
    fn empty_roster_yields_no_pulls() {
        let mut state = GameState::new();
        let roster = Roster::new(Vec::new(), None);
        let chest = ChestDefinition::standard(ChestKind::Common);
        let mut rng = RngState::from_seed(1);
        assert!(generate_pulls(&mut state, &roster, &chest, 250, &mut rng).is_empty());
    }
}
