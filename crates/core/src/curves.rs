//! Level curves: effect magnitudes and purchase costs for every upgrade.
//!
//! All functions here are pure. The idle table is the only source of truth
//! for legal idle rates; everything else is a closed formula.

/// Highest idle level (index into [`IDLE_TABLE`]).
pub const IDLE_MAX_LEVEL: usize = 25;
pub const IDLE_MAX_PER_SEC: u32 = 1000;

/// Legal idle rates, index = idle level. Hand tuned, strictly increasing.
pub const IDLE_TABLE: [u32; IDLE_MAX_LEVEL + 1] = [
    0, //
    1, 2, 4, 6, 8, //
    11, 14, 19, 25, 32, //
    40, 51, 65, 82, 104, //
    131, 165, 207, 259, 325, //
    407, 510, 639, 799, 1000,
];

pub const DISCOUNT_STEP: f64 = 0.03;
pub const DISCOUNT_MAX: f64 = 0.35;
pub const MAX_DISCOUNT_LEVEL: u32 = 12;

pub const SCOUT_MAX_BONUS: f64 = 0.25;
pub const MAX_SCOUT_LEVEL: u32 = 20;

/// Chests never get cheaper than this, whatever the discount.
pub const MIN_CHEST_PRICE: u64 = 10;

pub fn idle_table() -> &'static [u32; IDLE_MAX_LEVEL + 1] {
    &IDLE_TABLE
}

/// Index of `per_sec` in the idle table, or of the closest entry when it is
/// not a member. Ties resolve to the lower index.
pub fn idle_level_for(per_sec: u32) -> usize {
    if let Some(exact) = IDLE_TABLE.iter().position(|&value| value == per_sec) {
        return exact;
    }
    let mut best = 0;
    let mut best_diff = u32::MAX;
    for (level, &value) in IDLE_TABLE.iter().enumerate() {
        let diff = value.abs_diff(per_sec);
        if diff < best_diff {
            best_diff = diff;
            best = level;
        }
    }
    best
}

pub fn is_idle_table_value(per_sec: u32) -> bool {
    IDLE_TABLE.contains(&per_sec)
}

/// Snap an arbitrary rate onto the table, capping at the top entry first.
pub fn snap_idle_rate(per_sec: u32) -> u32 {
    let capped = per_sec.min(IDLE_MAX_PER_SEC);
    IDLE_TABLE[idle_level_for(capped)]
}

/// Cost of buying click level `level + 1` while at `level`.
pub fn cost_for_click_level(level: u32) -> u64 {
    floor_cost(60.0 * 1.45f64.powf(level as f64 - 1.0))
}

/// Cost of the next idle step, or `None` once the table is exhausted.
///
/// Never cheaper than 1.6x the current click upgrade, so idle income always
/// trails click investment.
pub fn cost_for_next_idle_level(current_per_sec: u32, click_level: u32) -> Option<u64> {
    let level = idle_level_for(current_per_sec);
    if level >= IDLE_MAX_LEVEL {
        return None;
    }
    let target = IDLE_TABLE[level + 1] as f64;
    let base = 150.0 * target.powf(1.30);
    let floor_vs_click = cost_for_click_level(click_level) as f64 * 1.6;
    Some(floor_cost(base.max(floor_vs_click)))
}

pub fn cost_for_discount_level(level: u32) -> u64 {
    floor_cost(220.0 * 1.7f64.powf(level as f64))
}

pub fn cost_for_scout_level(level: u32) -> u64 {
    floor_cost(260.0 * 1.65f64.powf(level as f64))
}

pub fn discount_fraction(level: u32) -> f64 {
    (level as f64 * DISCOUNT_STEP).min(DISCOUNT_MAX)
}

pub fn scout_bias_fraction(level: u32) -> f64 {
    SCOUT_MAX_BONUS * (level.min(MAX_SCOUT_LEVEL) as f64 / MAX_SCOUT_LEVEL as f64)
}

pub fn chest_price(base_price: u64, discount_level: u32) -> u64 {
    let discounted = floor_cost(base_price as f64 * (1.0 - discount_fraction(discount_level)));
    discounted.max(MIN_CHEST_PRICE)
}

fn floor_cost(value: f64) -> u64 {
    // `as` saturates, so runaway levels clamp to u64::MAX instead of wrapping.
    value.floor() as u64
}
