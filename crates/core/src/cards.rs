use serde::{Deserialize, Serialize};
use std::fmt;

pub const ROSTER_SIZE: u8 = 25;
pub const CREST_CARD: &str = "p25";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Roster ids are `p01`..`p25`.
    pub fn player(number: u8) -> Self {
        Self(format!("p{number:02}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Normal,
    Shiny,
}

impl Variant {
    pub fn from_shiny(is_shiny: bool) -> Self {
        if is_shiny {
            Variant::Shiny
        } else {
            Variant::Normal
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Variant::Normal => "n",
            Variant::Shiny => "s",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "normal" | "n" => Some(Variant::Normal),
            "shiny" | "s" => Some(Variant::Shiny),
            _ => None,
        }
    }
}

/// One collectible variant of one card.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VariantKey {
    pub card: CardId,
    pub variant: Variant,
}

impl VariantKey {
    pub fn new(card: CardId, variant: Variant) -> Self {
        Self { card, variant }
    }

    /// Parses the compact `p01_n` / `p01_s` form used by older saves.
    pub fn parse_compact(raw: &str) -> Option<Self> {
        let (card, suffix) = raw.rsplit_once('_')?;
        if card.is_empty() {
            return None;
        }
        let variant = match suffix {
            "n" => Variant::Normal,
            "s" => Variant::Shiny,
            _ => return None,
        };
        Some(Self::new(CardId::new(card), variant))
    }

    pub fn compact(&self) -> String {
        format!("{}_{}", self.card, self.variant.suffix())
    }
}

/// The fixed set of cards a chest can yield.
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    cards: Vec<CardId>,
    crest: Option<CardId>,
}

impl Roster {
    pub fn new(cards: Vec<CardId>, crest: Option<CardId>) -> Self {
        Self { cards, crest }
    }

    pub fn standard() -> Self {
        let cards = (1..=ROSTER_SIZE).map(CardId::player).collect();
        Self::new(cards, Some(CardId::new(CREST_CARD)))
    }

    pub fn cards(&self) -> &[CardId] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn contains(&self, card: &CardId) -> bool {
        self.cards.contains(card)
    }

    pub fn is_crest(&self, card: &CardId) -> bool {
        self.crest.as_ref() == Some(card)
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_roster_ids() {
        let roster = Roster::standard();
        assert_eq!(roster.len(), 25);
        assert_eq!(roster.cards()[0].as_str(), "p01");
        assert_eq!(roster.cards()[24].as_str(), "p25");
        assert!(roster.is_crest(&CardId::new("p25")));
        assert!(!roster.is_crest(&CardId::new("p24")));
    }

    #[test]
    fn compact_keys_parse_both_variants() {
        let key = VariantKey::parse_compact("p07_s").expect("parse");
        assert_eq!(key.card.as_str(), "p07");
        assert_eq!(key.variant, Variant::Shiny);
        assert_eq!(key.compact(), "p07_s");
        assert!(VariantKey::parse_compact("p07_x").is_none());
        assert!(VariantKey::parse_compact("p07").is_none());
        assert!(VariantKey::parse_compact("_n").is_none());
    }
}
