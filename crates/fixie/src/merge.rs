//! Structural merge of field values observed across records.
//!
//! Merging folds the field maps of many records into one representative
//! map. The left operand is the accumulated value and wins unless it is
//! null or a whitespace-only string, so the fold is order dependent and
//! must run in load order.
//!
//! Two objects merge recursively: the result holds the union of their keys,
//! left keys first. Every other pairing, including arrays and object versus
//! non-object, is treated as a scalar.

use serde_json::{Map, Value};

/// Merge two values seen for the same logical field.
///
/// # Example
///
/// ```
/// use fixie::merge;
/// use serde_json::json;
///
/// assert_eq!(merge(&json!(null), &json!(3)), json!(3));
/// assert_eq!(merge(&json!("  "), &json!("text")), json!("text"));
/// assert_eq!(merge(&json!("first"), &json!("second")), json!("first"));
/// ```
pub fn merge(a: &Value, b: &Value) -> Value {
    let mut acc = a.clone();
    absorb(&mut acc, b);
    acc
}

/// Merge two field maps key by key.
pub fn merge_maps(a: &Map<String, Value>, b: &Map<String, Value>) -> Map<String, Value> {
    let mut acc = a.clone();
    absorb_map(&mut acc, b);
    acc
}

/// Fold [`merge_maps`] over a sequence of field maps, seeded with the first.
///
/// An empty sequence yields an empty map.
pub fn merge_all<'a, I>(maps: I) -> Map<String, Value>
where
    I: IntoIterator<Item = &'a Map<String, Value>>,
{
    let mut maps = maps.into_iter();
    let Some(first) = maps.next() else {
        return Map::new();
    };

    let mut acc = first.clone();
    for next in maps {
        absorb_map(&mut acc, next);
    }
    acc
}

/// Merge `next` into `acc` in place.
fn absorb(acc: &mut Value, next: &Value) {
    if let (Value::Object(left), Value::Object(right)) = (&mut *acc, next) {
        absorb_map(left, right);
        return;
    }

    if yields_to(acc, next) {
        *acc = next.clone();
    }
}

fn absorb_map(acc: &mut Map<String, Value>, next: &Map<String, Value>) {
    for (key, value) in next {
        match acc.get_mut(key) {
            Some(existing) => absorb(existing, value),
            // merge(null, v) is always v
            None => {
                acc.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Whether the accumulated value gives way to a newly observed one.
fn yields_to(current: &Value, observed: &Value) -> bool {
    if observed.is_null() {
        return false;
    }

    match current {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
