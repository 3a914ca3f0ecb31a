//! Initial variant selection by shape sniffing.
//!
//! Pre-existing data is not tagged with the variant it was written under, so
//! the first visit to a polymorphic location guesses: each object-shaped
//! alternative scores the number of its declared property names present in
//! the data, and the best score wins (lowest index on ties).
//!
//! Array and scalar alternatives always score zero, so a union such as
//! `number | object` never auto-selects the number from data alone. This is
//! kept as the selection policy; the user's explicit choice takes over from
//! the first switch on.

use serde_json::{Map, Value};

use crate::resolver::Resolved;

/// Index of the alternative `data` most likely represents.
///
/// Absent or `null` data and an empty candidate list both yield `0`.
pub fn select_variant(data: Option<&Value>, alternatives: &[Resolved<'_>]) -> usize {
    let Some(Value::Object(data)) = data else {
        return 0;
    };

    let mut best = (0, 0);
    for (index, alternative) in alternatives.iter().enumerate() {
        let score = score(data, alternative);
        if score > best.1 {
            best = (index, score);
        }
    }
    best.0
}

/// Count of `alternative`'s declared properties present as keys in `data`.
pub fn score(data: &Map<String, Value>, alternative: &Resolved<'_>) -> usize {
    alternative
        .properties()
        .map_or(0, |properties| {
            properties.keys().filter(|name| data.contains_key(*name)).count()
        })
}
