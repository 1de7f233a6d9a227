use crate::curves::{
    chest_price, cost_for_click_level, cost_for_discount_level, cost_for_next_idle_level,
    cost_for_scout_level, idle_level_for, IDLE_MAX_LEVEL, IDLE_TABLE, MAX_DISCOUNT_LEVEL,
    MAX_SCOUT_LEVEL,
};
use crate::{
    album_page, album_progress, load, save, AlbumProgress, AlbumSlot, BlobStore, CardId,
    ChestKind, ChestOpener, ChestSession, Event, EventBus, GameState, LootConfig, PullResult,
    RandomSource, RngState, SessionError, SessionPhase, UpgradeKind, Variant,
};
use log::{debug, info, warn};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("not enough coins: have {have}, need {need}")]
    NotEnoughCoins { have: u64, need: u64 },
    #[error("{0:?} upgrade is already maxed")]
    Maxed(UpgradeKind),
    #[error("roster has no cards")]
    EmptyRoster,
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeOutcome {
    pub kind: UpgradeKind,
    pub level: u32,
    pub cost: u64,
    /// `None` once the upgrade is maxed.
    pub next_cost: Option<u64>,
    pub coins: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeOffer {
    pub kind: UpgradeKind,
    pub level: u32,
    pub next_cost: Option<u64>,
    pub affordable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChestOffer {
    pub kind: ChestKind,
    pub cards: u8,
    pub price: u64,
    pub shiny_base_chance: f64,
    pub affordable: bool,
}

/// Owns the game state and serialises every operation on it.
///
/// Rejected operations return an error and leave the state untouched.
#[derive(Debug)]
pub struct Game<R: RandomSource = RngState> {
    pub config: LootConfig,
    pub state: GameState,
    rng: R,
    opener: ChestOpener,
    idle_carry: f64,
}

impl Game<RngState> {
    pub fn new_seeded(config: LootConfig, seed: u64) -> Self {
        Self::new(config, GameState::new(), RngState::from_seed(seed))
    }
}

impl<R: RandomSource> Game<R> {
    pub fn new(config: LootConfig, state: GameState, rng: R) -> Self {
        Self {
            config,
            state,
            rng,
            opener: ChestOpener::new(),
            idle_carry: 0.0,
        }
    }

    pub fn load_from(store: &dyn BlobStore, config: LootConfig, rng: R) -> Self {
        let state = load(store.read_blob().as_deref());
        Self::new(config, state, rng)
    }

    /// Writes the current state. Failures are logged and reported as `false`;
    /// the in-memory state stays authoritative either way.
    pub fn persist(&self, store: &mut dyn BlobStore) -> bool {
        let bytes = match save(&self.state) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("could not serialise game state: {err}");
                return false;
            }
        };
        match store.write_blob(&bytes) {
            Ok(()) => true,
            Err(err) => {
                warn!("{err}");
                false
            }
        }
    }

    pub fn click(&mut self, events: &mut EventBus) -> u64 {
        self.clicks(1, events)
    }

    /// Credits `times` manual clicks at once with a single event.
    pub fn clicks(&mut self, times: u32, events: &mut EventBus) -> u64 {
        if times == 0 {
            return 0;
        }
        let gained = u64::from(self.state.click_power).saturating_mul(u64::from(times));
        self.state.credit(gained);
        events.push(Event::Clicked {
            gained,
            coins: self.state.coins,
        });
        gained
    }

    /// Accrues idle income for `elapsed`. Fractions of a coin carry over to
    /// the next tick.
    pub fn tick_idle(&mut self, elapsed: Duration, events: &mut EventBus) -> u64 {
        if self.state.idle_per_sec == 0 {
            return 0;
        }
        self.idle_carry += f64::from(self.state.idle_per_sec) * elapsed.as_secs_f64();
        let whole = self.idle_carry.floor();
        if whole < 1.0 {
            return 0;
        }
        self.idle_carry -= whole;
        let gained = whole as u64;
        self.state.credit(gained);
        events.push(Event::IdleIncome {
            gained,
            coins: self.state.coins,
        });
        gained
    }

    pub fn upgrade_level(&self, kind: UpgradeKind) -> u32 {
        match kind {
            UpgradeKind::Click => self.state.click_power,
            UpgradeKind::Idle => idle_level_for(self.state.idle_per_sec) as u32,
            UpgradeKind::Discount => self.state.discount_level,
            UpgradeKind::Scout => self.state.scout_level,
        }
    }

    /// Price of the next level, or `None` when maxed.
    pub fn upgrade_cost(&self, kind: UpgradeKind) -> Option<u64> {
        match kind {
            UpgradeKind::Click => Some(cost_for_click_level(self.state.click_power)),
            UpgradeKind::Idle => {
                cost_for_next_idle_level(self.state.idle_per_sec, self.state.click_power)
            }
            UpgradeKind::Discount => (self.state.discount_level < MAX_DISCOUNT_LEVEL)
                .then(|| cost_for_discount_level(self.state.discount_level)),
            UpgradeKind::Scout => (self.state.scout_level < MAX_SCOUT_LEVEL)
                .then(|| cost_for_scout_level(self.state.scout_level)),
        }
    }

    pub fn upgrade_offers(&self) -> Vec<UpgradeOffer> {
        UpgradeKind::ALL
            .into_iter()
            .map(|kind| {
                let next_cost = self.upgrade_cost(kind);
                UpgradeOffer {
                    kind,
                    level: self.upgrade_level(kind),
                    next_cost,
                    affordable: next_cost.is_some_and(|cost| self.state.can_afford(cost)),
                }
            })
            .collect()
    }

    pub fn buy_upgrade(
        &mut self,
        kind: UpgradeKind,
        events: &mut EventBus,
    ) -> Result<UpgradeOutcome, GameError> {
        let cost = self.upgrade_cost(kind).ok_or(GameError::Maxed(kind))?;
        self.ensure_affordable(cost)?;
        self.state.debit(cost);
        match kind {
            UpgradeKind::Click => {
                self.state.click_power = self.state.click_power.saturating_add(1);
            }
            UpgradeKind::Idle => {
                let next = (idle_level_for(self.state.idle_per_sec) + 1).min(IDLE_MAX_LEVEL);
                self.state.idle_per_sec = IDLE_TABLE[next];
            }
            UpgradeKind::Discount => {
                self.state.discount_level = (self.state.discount_level + 1).min(MAX_DISCOUNT_LEVEL);
            }
            UpgradeKind::Scout => {
                self.state.scout_level = (self.state.scout_level + 1).min(MAX_SCOUT_LEVEL);
            }
        }
        let level = self.upgrade_level(kind);
        debug!("bought {kind:?} upgrade for {cost}, now level {level}");
        events.push(Event::UpgradeBought {
            kind,
            level,
            cost,
            coins: self.state.coins,
        });
        Ok(UpgradeOutcome {
            kind,
            level,
            cost,
            next_cost: self.upgrade_cost(kind),
            coins: self.state.coins,
        })
    }

    pub fn chest_price(&self, kind: ChestKind) -> u64 {
        chest_price(self.config.chest(kind).base_price, self.state.discount_level)
    }

    pub fn chest_offers(&self) -> Vec<ChestOffer> {
        ChestKind::ALL
            .into_iter()
            .map(|kind| {
                let chest = self.config.chest(kind);
                let price = self.chest_price(kind);
                ChestOffer {
                    kind,
                    cards: chest.cards_per_open,
                    price,
                    shiny_base_chance: chest.shiny_base_chance,
                    affordable: self.state.can_afford(price),
                }
            })
            .collect()
    }

    /// Pays for a chest and generates all of its pulls at once.
    pub fn buy_chest(
        &mut self,
        kind: ChestKind,
        events: &mut EventBus,
    ) -> Result<&ChestSession, GameError> {
        if self.opener.phase() != SessionPhase::Empty {
            return Err(SessionError::AlreadyOpen.into());
        }
        if self.config.roster.is_empty() {
            return Err(GameError::EmptyRoster);
        }
        let price = self.chest_price(kind);
        self.ensure_affordable(price)?;
        self.state.debit(price);

        let session = self.opener.begin(
            &mut self.state,
            &self.config.roster,
            self.config.chest(kind),
            price,
            &mut self.rng,
        )?;
        info!(
            "opened {} chest for {price}: {} pulls",
            kind.key(),
            session.pulls().len()
        );
        for pull in session.pulls().iter().filter(|pull| !pull.is_new_variant) {
            events.push(Event::DuplicateRefunded {
                card: pull.card.clone(),
                variant: pull.variant(),
                refund: pull.refund_granted,
            });
        }
        events.push(Event::ChestBought {
            chest: kind,
            price,
            pulls: session.pulls().len(),
            coins: self.state.coins,
        });
        Ok(session)
    }

    pub fn session(&self) -> Option<&ChestSession> {
        self.opener.session()
    }

    pub fn session_phase(&self) -> SessionPhase {
        self.opener.phase()
    }

    pub fn reveal_next(&mut self, events: &mut EventBus) -> Result<PullResult, GameError> {
        let pull = self.opener.reveal_next()?.clone();
        let (index, total) = self
            .opener
            .session()
            .map(|session| (session.revealed_count() - 1, session.pulls().len()))
            .unwrap_or_default();
        events.push(Event::CardRevealed {
            card: pull.card.clone(),
            variant: pull.variant(),
            is_new: pull.is_new_variant,
            refund: pull.refund_granted,
            index,
            total,
        });
        Ok(pull)
    }

    pub fn end_session(&mut self, events: &mut EventBus) -> Result<ChestSession, GameError> {
        let session = self.opener.end()?;
        events.push(Event::SessionClosed {
            chest: session.chest().kind,
            new_variants: session
                .pulls()
                .iter()
                .filter(|pull| pull.is_new_variant)
                .count(),
            refunded: session.total_refund(),
        });
        Ok(session)
    }

    pub fn acknowledge(&mut self, card: &CardId, variant: Variant, events: &mut EventBus) -> bool {
        let removed = self.state.acknowledge(card, variant);
        if removed {
            events.push(Event::VariantAcknowledged {
                card: card.clone(),
                variant,
            });
        }
        removed
    }

    pub fn album_progress(&self) -> AlbumProgress {
        album_progress(&self.state, &self.config.roster)
    }

    pub fn album_page_count(&self) -> usize {
        self.config.album.page_count()
    }

    pub fn album_page(&self, page: usize) -> Vec<Option<AlbumSlot>> {
        album_page(&self.state, &self.config.album, page)
    }

    fn ensure_affordable(&self, cost: u64) -> Result<(), GameError> {
        if self.state.can_afford(cost) {
            Ok(())
        } else {
            Err(GameError::NotEnoughCoins {
                have: self.state.coins,
                need: cost,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, StoreError};

    fn game() -> Game {
        Game::new_seeded(LootConfig::default(), 11)
    }

    #[test]
    fn click_credits_click_power() {
        let mut game = game();
        let mut events = EventBus::default();
        game.state.click_power = 4;
        assert_eq!(game.click(&mut events), 4);
        assert_eq!(game.state.coins, 84);
        assert_eq!(
            events.drain().collect::<Vec<_>>(),
            vec![Event::Clicked {
                gained: 4,
                coins: 84
            }]
        );
    }

    #[test]
    fn batched_clicks_emit_one_event() {
        let mut game = game();
        let mut events = EventBus::default();
        game.state.click_power = 2;
        assert_eq!(game.clicks(0, &mut events), 0);
        assert!(events.is_empty());
        assert_eq!(game.clicks(u32::MAX, &mut events), 2 * u64::from(u32::MAX));
        assert_eq!(events.drain().count(), 1);
        assert_eq!(game.state.coins, 80 + 2 * u64::from(u32::MAX));
    }

    #[test]
    fn idle_income_carries_fractions() {
        let mut game = game();
        let mut events = EventBus::default();
        game.state.idle_per_sec = 1;
        assert_eq!(game.tick_idle(Duration::from_millis(700), &mut events), 0);
        assert!(events.is_empty());
        assert_eq!(game.tick_idle(Duration::from_millis(700), &mut events), 1);
        assert_eq!(game.tick_idle(Duration::from_millis(700), &mut events), 1);
        assert_eq!(game.tick_idle(Duration::from_millis(700), &mut events), 0);
        assert_eq!(game.state.coins, 82);
    }

    #[test]
    fn upgrades_step_along_their_curves() {
        let mut game = game();
        let mut events = EventBus::default();
        game.state.coins = 1_000_000;

        let click = game.buy_upgrade(UpgradeKind::Click, &mut events).expect("click");
        assert_eq!((click.level, click.cost), (2, 60));
        assert_eq!(click.next_cost, Some(87));

        let idle = game.buy_upgrade(UpgradeKind::Idle, &mut events).expect("idle");
        assert_eq!(game.state.idle_per_sec, 1);
        assert_eq!(idle.level, 1);

        let discount = game
            .buy_upgrade(UpgradeKind::Discount, &mut events)
            .expect("discount");
        assert_eq!((discount.level, discount.cost), (1, 220));
        assert_eq!(game.chest_price(ChestKind::Common), 242);

        let scout = game.buy_upgrade(UpgradeKind::Scout, &mut events).expect("scout");
        assert_eq!((scout.level, scout.cost), (1, 260));
        assert_eq!(game.state.coins, 1_000_000 - 60 - 150 - 220 - 260);
    }

    #[test]
    fn maxed_upgrades_are_rejected_without_charge() {
        let mut game = game();
        let mut events = EventBus::default();
        game.state.coins = u64::MAX / 2;
        game.state.idle_per_sec = 1000;
        game.state.discount_level = 12;
        game.state.scout_level = 20;
        let coins = game.state.coins;
        for kind in [UpgradeKind::Idle, UpgradeKind::Discount, UpgradeKind::Scout] {
            assert_eq!(game.upgrade_cost(kind), None);
            assert_eq!(
                game.buy_upgrade(kind, &mut events),
                Err(GameError::Maxed(kind))
            );
        }
        assert_eq!(game.state.coins, coins);
        assert!(events.is_empty());
    }

    #[test]
    fn unaffordable_upgrade_reports_shortfall() {
        let mut game = game();
        let mut events = EventBus::default();
        game.state.coins = 10;
        assert_eq!(
            game.buy_upgrade(UpgradeKind::Click, &mut events),
            Err(GameError::NotEnoughCoins { have: 10, need: 60 })
        );
        assert_eq!(game.state.click_power, 1);
    }

    #[test]
    fn offers_flag_affordability() {
        let mut game = game();
        game.state.coins = 300;
        let offers = game.chest_offers();
        assert_eq!(offers.len(), 3);
        assert!(offers[0].affordable);
        assert!(!offers[1].affordable);
        let upgrades = game.upgrade_offers();
        assert!(upgrades.iter().all(|offer| offer.next_cost.is_some()));
        assert!(upgrades
            .iter()
            .find(|offer| offer.kind == UpgradeKind::Click)
            .is_some_and(|offer| offer.affordable));
    }

    #[test]
    fn second_chest_waits_for_the_first_to_close() {
        let mut game = game();
        let mut events = EventBus::default();
        game.state.coins = 10_000;
        game.buy_chest(ChestKind::Common, &mut events).expect("first");
        let coins = game.state.coins;
        assert_eq!(
            game.buy_chest(ChestKind::Common, &mut events).err(),
            Some(GameError::Session(SessionError::AlreadyOpen))
        );
        assert_eq!(game.state.coins, coins);
    }

    #[test]
    fn empty_roster_rejects_before_charging() {
        let config = LootConfig::with_roster(crate::Roster::new(Vec::new(), None));
        let mut game = Game::new_seeded(config, 1);
        let mut events = EventBus::default();
        game.state.coins = 1_000;
        assert_eq!(
            game.buy_chest(ChestKind::Common, &mut events).err(),
            Some(GameError::EmptyRoster)
        );
        assert_eq!(game.state.coins, 1_000);
    }

    struct FailingStore;

    impl BlobStore for FailingStore {
        fn read_blob(&self) -> Option<Vec<u8>> {
            None
        }

        fn write_blob(&mut self, _bytes: &[u8]) -> Result<(), StoreError> {
            Err(StoreError::Write("disk full".to_string()))
        }
    }

    #[test]
    fn store_failures_do_not_disturb_the_game() {
        let mut game = game();
        let mut events = EventBus::default();
        game.click(&mut events);
        assert!(!game.persist(&mut FailingStore));
        assert_eq!(game.state.coins, 81);

        let mut store = MemoryStore::new();
        assert!(game.persist(&mut store));
        assert_eq!(store.writes(), 1);
        let reloaded = Game::load_from(&store, LootConfig::default(), RngState::from_seed(2));
        assert_eq!(reloaded.state, game.state);
    }
}
