use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declarative options tree handed to the engine untouched in shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionsTree(IndexMap<String, Value>);

impl OptionsTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Brings `self` structurally in line with `next`, touching only the
    /// subtrees that differ. Returns `true` when anything was written.
    pub fn reconcile_from(&mut self, next: &Self) -> bool {
        reconcile_map(&mut self.0, &next.0)
    }
}

impl From<IndexMap<String, Value>> for OptionsTree {
    fn from(value: IndexMap<String, Value>) -> Self {
        Self(value)
    }
}

impl FromIterator<(String, Value)> for OptionsTree {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Structural in-place reconcile of an ordered map of JSON values.
///
/// Keys missing from `next` are dropped, new keys are inserted, and existing
/// values are recursed into so unchanged nested objects keep their storage.
pub(crate) fn reconcile_map(live: &mut IndexMap<String, Value>, next: &IndexMap<String, Value>) -> bool {
    let before = live.len();
    live.retain(|key, _| next.contains_key(key));
    let mut changed = live.len() != before;

    for (key, next_value) in next {
        match live.get_mut(key) {
            Some(live_value) => changed |= reconcile_value(live_value, next_value),
            None => {
                live.insert(key.clone(), next_value.clone());
                changed = true;
            }
        }
    }
    changed
}

fn reconcile_value(live: &mut Value, next: &Value) -> bool {
    match (live, next) {
        (Value::Object(live_object), Value::Object(next_object)) => {
            let before = live_object.len();
            live_object.retain(|key, _| next_object.contains_key(key));
            let mut changed = live_object.len() != before;
            for (key, next_value) in next_object {
                match live_object.get_mut(key) {
                    Some(live_value) => changed |= reconcile_value(live_value, next_value),
                    None => {
                        live_object.insert(key.clone(), next_value.clone());
                        changed = true;
                    }
                }
            }
            changed
        }
        (live, next) if *live == *next => false,
        (live, next) => {
            *live = next.clone();
            true
        }
    }
}
