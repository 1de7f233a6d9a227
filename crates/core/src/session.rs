//! Sequential chest reveal.
//!
//! A purchase generates every pull up front; the session then only walks a
//! cursor over that fixed list, one reveal per call. Revealing never touches
//! the game state.

use crate::{generate_pulls, ChestDefinition, GameState, PullResult, RandomSource, Roster};
use log::debug;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Empty,
    Opening,
    Complete,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a chest is already being opened")]
    AlreadyOpen,
    #[error("no chest is being opened")]
    NotOpening,
    #[error("chest still has cards to reveal")]
    NotComplete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChestSession {
    chest: ChestDefinition,
    price_paid: u64,
    pulls: Vec<PullResult>,
    revealed_count: usize,
}

impl ChestSession {
    pub fn new(chest: ChestDefinition, price_paid: u64, pulls: Vec<PullResult>) -> Self {
        Self {
            chest,
            price_paid,
            pulls,
            revealed_count: 0,
        }
    }

    pub fn chest(&self) -> &ChestDefinition {
        &self.chest
    }

    pub fn price_paid(&self) -> u64 {
        self.price_paid
    }

    pub fn pulls(&self) -> &[PullResult] {
        &self.pulls
    }

    pub fn revealed(&self) -> &[PullResult] {
        &self.pulls[..self.revealed_count]
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed_count
    }

    pub fn remaining(&self) -> usize {
        self.pulls.len() - self.revealed_count
    }

    pub fn is_complete(&self) -> bool {
        self.revealed_count == self.pulls.len()
    }

    /// Total coins refunded for duplicates across the whole chest.
    pub fn total_refund(&self) -> u64 {
        self.pulls.iter().map(|pull| pull.refund_granted).sum()
    }

    fn advance(&mut self) -> Option<&PullResult> {
        let pull = self.pulls.get(self.revealed_count)?;
        self.revealed_count += 1;
        Some(pull)
    }
}

/// Holds at most one [`ChestSession`] and enforces the
/// `Empty -> Opening -> Complete -> Empty` order.
#[derive(Debug, Default)]
pub struct ChestOpener {
    active: Option<ChestSession>,
}

impl ChestOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        match &self.active {
            None => SessionPhase::Empty,
            Some(session) if session.is_complete() => SessionPhase::Complete,
            Some(_) => SessionPhase::Opening,
        }
    }

    pub fn session(&self) -> Option<&ChestSession> {
        self.active.as_ref()
    }

    /// Materialises every pull for `chest` against `state`. The caller has
    /// already checked affordability and debited `price_paid`.
    pub fn begin(
        &mut self,
        state: &mut GameState,
        roster: &Roster,
        chest: &ChestDefinition,
        price_paid: u64,
        rng: &mut dyn RandomSource,
    ) -> Result<&ChestSession, SessionError> {
        if self.active.is_some() {
            return Err(SessionError::AlreadyOpen);
        }
        let pulls = generate_pulls(state, roster, chest, price_paid, rng);
        debug!("opening {:?} chest with {} pulls", chest.kind, pulls.len());
        let session = self
            .active
            .insert(ChestSession::new(chest.clone(), price_paid, pulls));
        Ok(&*session)
    }

    pub fn reveal_next(&mut self) -> Result<&PullResult, SessionError> {
        match self.active.as_mut() {
            Some(session) if !session.is_complete() => {
                session.advance().ok_or(SessionError::NotOpening)
            }
            _ => Err(SessionError::NotOpening),
        }
    }

    /// Discards a fully revealed session.
    pub fn end(&mut self) -> Result<ChestSession, SessionError> {
        match self.phase() {
            SessionPhase::Complete => self.active.take().ok_or(SessionError::NotOpening),
            SessionPhase::Opening => Err(SessionError::NotComplete),
            SessionPhase::Empty => Err(SessionError::NotOpening),
        }
    }
}
