use crate::{CardId, ChestKind, UpgradeKind, Variant};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    Clicked {
        gained: u64,
        coins: u64,
    },
    IdleIncome {
        gained: u64,
        coins: u64,
    },
    UpgradeBought {
        kind: UpgradeKind,
        level: u32,
        cost: u64,
        coins: u64,
    },
    ChestBought {
        chest: ChestKind,
        price: u64,
        pulls: usize,
        coins: u64,
    },
    CardRevealed {
        card: CardId,
        variant: Variant,
        is_new: bool,
        refund: u64,
        index: usize,
        total: usize,
    },
    DuplicateRefunded {
        card: CardId,
        variant: Variant,
        refund: u64,
    },
    SessionClosed {
        chest: ChestKind,
        new_variants: usize,
        refunded: u64,
    },
    VariantAcknowledged {
        card: CardId,
        variant: Variant,
    },
}

#[derive(Debug, Default)]
pub struct EventBus {
    queue: Vec<Event>,
}

impl EventBus {
    pub fn push(&mut self, event: Event) {
        self.queue.push(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.queue.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
