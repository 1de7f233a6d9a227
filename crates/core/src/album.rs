use crate::{CardId, GameState, Roster, Variant};
use serde::{Deserialize, Serialize};

pub const ALBUM_PAGE_SLOTS: usize = 9;

/// Fixed album layout, three pages of a 3x3 grid.
pub const ALBUM_PAGES: [[Option<&str>; ALBUM_PAGE_SLOTS]; 3] = [
    [
        Some("p25"),
        Some("p23"),
        Some("p24"),
        Some("p13"),
        Some("p14"),
        Some("p19"),
        Some("p22"),
        Some("p20"),
        Some("p16"),
    ],
    [
        Some("p09"),
        Some("p04"),
        Some("p11"),
        Some("p08"),
        Some("p07"),
        Some("p15"),
        Some("p18"),
        Some("p12"),
        Some("p21"),
    ],
    [
        Some("p02"),
        Some("p01"),
        Some("p17"),
        Some("p03"),
        Some("p10"),
        Some("p06"),
        Some("p05"),
        None,
        None,
    ],
];

/// Page layout of the album. Each page holds [`ALBUM_PAGE_SLOTS`] slots and
/// `None` marks an empty filler slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumLayout {
    pages: Vec<Vec<Option<CardId>>>,
}

impl AlbumLayout {
    /// The production layout for the standard roster.
    pub fn standard() -> Self {
        Self {
            pages: ALBUM_PAGES
                .iter()
                .map(|page| page.iter().map(|slot| slot.map(CardId::new)).collect())
                .collect(),
        }
    }

    /// Lays `roster` out in roster order, padding the last page.
    pub fn from_roster(roster: &Roster) -> Self {
        let pages = roster
            .cards()
            .chunks(ALBUM_PAGE_SLOTS)
            .map(|chunk| {
                let mut page: Vec<Option<CardId>> = chunk.iter().cloned().map(Some).collect();
                page.resize(ALBUM_PAGE_SLOTS, None);
                page
            })
            .collect();
        Self { pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Option<&[Option<CardId>]> {
        self.pages.get(index).map(Vec::as_slice)
    }
}

impl Default for AlbumLayout {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlbumProgress {
    pub normal: usize,
    pub shiny: usize,
    pub roster: usize,
}

impl AlbumProgress {
    pub fn owned(&self) -> usize {
        self.normal + self.shiny
    }

    pub fn total(&self) -> usize {
        self.roster * 2
    }

    pub fn normal_complete(&self) -> bool {
        self.normal >= self.roster
    }

    pub fn shiny_complete(&self) -> bool {
        self.shiny >= self.roster
    }

    pub fn complete(&self) -> bool {
        self.owned() >= self.total()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumSlot {
    pub card: CardId,
    pub has_normal: bool,
    pub has_shiny: bool,
    /// Variant to show: shiny over normal; `None` is a locked slot.
    pub display: Option<Variant>,
    pub is_new: bool,
}

pub fn album_progress(state: &GameState, roster: &Roster) -> AlbumProgress {
    let mut progress = AlbumProgress {
        normal: 0,
        shiny: 0,
        roster: roster.len(),
    };
    for card in roster.cards() {
        if state.owns(card, Variant::Normal) {
            progress.normal += 1;
        }
        if state.owns(card, Variant::Shiny) {
            progress.shiny += 1;
        }
    }
    progress
}

/// Slots of one page, `None` for the empty filler slots. Out-of-range pages
/// clamp to the last one; a layout without pages yields no slots.
pub fn album_page(
    state: &GameState,
    layout: &AlbumLayout,
    page: usize,
) -> Vec<Option<AlbumSlot>> {
    let Some(last) = layout.page_count().checked_sub(1) else {
        return Vec::new();
    };
    layout
        .page(page.min(last))
        .unwrap_or_default()
        .iter()
        .map(|slot| slot.clone().map(|card| album_slot(state, card)))
        .collect()
}

fn album_slot(state: &GameState, card: CardId) -> AlbumSlot {
    let has_normal = state.owns(&card, Variant::Normal);
    let has_shiny = state.owns(&card, Variant::Shiny);
    let display = if has_shiny {
        Some(Variant::Shiny)
    } else if has_normal {
        Some(Variant::Normal)
    } else {
        None
    };
    let is_new = display.is_some_and(|variant| state.is_pending(&card, variant));
    AlbumSlot {
        card,
        has_normal,
        has_shiny,
        display,
        is_new,
    }
}
