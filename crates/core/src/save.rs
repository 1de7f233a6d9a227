//! Persisted form of [`GameState`].
//!
//! The record is versionless. Loading merges whatever fields parse over the
//! defaults and clamps each one into range, so saves written under older
//! curves (or by older builds using the short field names) keep working.
//! A field that is missing or malformed falls back to its default on its
//! own; it never takes the rest of the save down with it.

use crate::curves::{is_idle_table_value, snap_idle_rate, MAX_DISCOUNT_LEVEL, MAX_SCOUT_LEVEL};
use crate::{CardId, GameState, OwnershipRecord, VariantKey};
use log::{debug, warn};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

pub fn save(state: &GameState) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(state)
}

/// Rebuilds a state from stored bytes. Never fails.
pub fn load(bytes: Option<&[u8]>) -> GameState {
    let Some(bytes) = bytes else {
        return GameState::new();
    };
    let fields = match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => {
            warn!("save is not a record; starting fresh");
            return GameState::new();
        }
        Err(err) => {
            warn!("unreadable save ({err}); starting fresh");
            return GameState::new();
        }
    };

    let defaults = GameState::new();
    let mut state = GameState::new();

    state.coins = count(&fields, &["coins"]).unwrap_or(defaults.coins);
    state.click_power = count(&fields, &["clickPower"])
        .map(|value| saturate_u32(value).max(1))
        .unwrap_or(defaults.click_power);
    state.discount_level = count(&fields, &["discountLevel", "discountLv"])
        .map(|value| clamp_level(value, MAX_DISCOUNT_LEVEL))
        .unwrap_or(defaults.discount_level);
    state.scout_level = count(&fields, &["scoutLevel", "scoutLv"])
        .map(|value| clamp_level(value, MAX_SCOUT_LEVEL))
        .unwrap_or(defaults.scout_level);

    let raw_idle = count(&fields, &["idlePerSec"])
        .map(saturate_u32)
        .unwrap_or(defaults.idle_per_sec);
    state.idle_per_sec = snap_idle_rate(raw_idle);
    if !is_idle_table_value(raw_idle) {
        debug!(
            "migrated idle rate {raw_idle}/s to {}/s",
            state.idle_per_sec
        );
    }

    if let Some(owned) = fields.get("owned") {
        state.owned = ownership(owned);
    }
    state.pending_new = pending(&fields);
    state.last_acquired = last_acquired(&fields);
    state
}

/// First usable number among `keys` as a non-negative whole count.
/// Integers are taken exactly; other finite numbers are floored, with
/// negatives clamping to zero.
fn count(fields: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    for key in keys {
        let Some(value) = fields.get(*key) else {
            continue;
        };
        if let Some(whole) = value.as_u64() {
            return Some(whole);
        }
        match value.as_f64() {
            // `as` saturates at the u64 bounds.
            Some(number) if number.is_finite() => return Some(number.max(0.0).floor() as u64),
            _ => warn!("ignoring malformed `{key}` in save"),
        }
    }
    None
}

fn saturate_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn clamp_level(value: u64, max: u32) -> u32 {
    saturate_u32(value).min(max)
}

fn ownership(value: &Value) -> BTreeMap<CardId, OwnershipRecord> {
    let mut owned = BTreeMap::new();
    let Some(entries) = value.as_object() else {
        warn!("ignoring malformed `owned` in save");
        return owned;
    };
    for (id, raw) in entries {
        match serde_json::from_value::<OwnershipRecord>(raw.clone()) {
            Ok(mut record) => {
                record.reconcile();
                owned.insert(CardId::new(id.as_str()), record);
            }
            Err(err) => warn!("dropping ownership record for {id}: {err}"),
        }
    }
    owned
}

fn pending(fields: &Map<String, Value>) -> BTreeSet<VariantKey> {
    if let Some(value) = fields.get("pendingNew") {
        return variant_keys(value, "pendingNew").into_iter().collect();
    }
    // Older saves keep a `{"p01_n": true}` map instead.
    let Some(Value::Object(seen)) = fields.get("seenNew") else {
        return BTreeSet::new();
    };
    seen.iter()
        .filter(|(_, flag)| flag.as_bool().unwrap_or(false))
        .filter_map(|(key, _)| VariantKey::parse_compact(key))
        .collect()
}

fn last_acquired(fields: &Map<String, Value>) -> Vec<VariantKey> {
    if let Some(value) = fields.get("lastAcquired") {
        return variant_keys(value, "lastAcquired");
    }
    fields
        .get("lastNew")
        .map(|value| variant_keys(value, "lastNew"))
        .unwrap_or_default()
}

/// Accepts both `{"card": .., "variant": ..}` objects and `p01_n` strings.
fn variant_keys(value: &Value, field: &str) -> Vec<VariantKey> {
    let Some(items) = value.as_array() else {
        warn!("ignoring malformed `{field}` in save");
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(compact) => VariantKey::parse_compact(compact),
            other => serde_json::from_value(other.clone()).ok(),
        })
        .collect()
}
