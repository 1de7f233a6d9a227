//! Progression and loot-pull engine. Keep this crate free of IO and platform concerns.

pub mod album;
pub mod cards;
pub mod config;
pub mod curves;
pub mod events;
pub mod game;
pub mod pull;
pub mod rng;
pub mod save;
pub mod session;
pub mod state;
pub mod store;

pub use album::*;
pub use cards::*;
pub use config::*;
pub use events::*;
pub use game::*;
pub use pull::*;
pub use rng::*;
pub use save::{load, save};
pub use session::*;
pub use state::*;
pub use store::*;
