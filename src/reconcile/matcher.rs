use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;

use crate::core::{ChartKind, DatasetEntry, LiveDataset};

/// Field used to recognise "the same dataset" across render passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "by", content = "name", rename_all = "snake_case")]
pub enum DatasetIdKey {
    #[default]
    Label,
    /// String form of a declarative property, e.g. `"id"`.
    Property(String),
}

/// Identity rule applied by the matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetIdentity {
    #[serde(default)]
    pub key: DatasetIdKey,
    /// Also require the per-dataset chart kind to agree (mixed charts).
    #[serde(default = "default_match_kind")]
    pub match_kind: bool,
}

fn default_match_kind() -> bool {
    true
}

impl Default for DatasetIdentity {
    fn default() -> Self {
        Self {
            key: DatasetIdKey::Label,
            match_kind: default_match_kind(),
        }
    }
}

impl DatasetIdentity {
    #[must_use]
    pub fn by_property(name: impl Into<String>) -> Self {
        Self {
            key: DatasetIdKey::Property(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_match_kind(mut self, match_kind: bool) -> Self {
        self.match_kind = match_kind;
        self
    }

    fn key_of<'a>(
        &self,
        label: Option<&'a str>,
        kind: Option<&'a ChartKind>,
        properties: &'a indexmap::IndexMap<String, Value>,
    ) -> DatasetKey<'a> {
        let id = match &self.key {
            DatasetIdKey::Label => label.map(DatasetId::Text),
            DatasetIdKey::Property(name) => properties.get(name).map(|value| match value {
                Value::String(text) => DatasetId::Text(text.as_str()),
                other => DatasetId::Json(other.to_string()),
            }),
        };
        DatasetKey {
            id,
            kind: if self.match_kind { kind } else { None },
        }
    }

    #[must_use]
    pub fn key_of_live<'a>(&self, dataset: &'a LiveDataset) -> DatasetKey<'a> {
        self.key_of(
            dataset.label.as_deref(),
            dataset.kind.as_ref(),
            &dataset.properties,
        )
    }

    #[must_use]
    pub fn key_of_entry<'a>(&self, entry: &'a DatasetEntry) -> DatasetKey<'a> {
        self.key_of(entry.label.as_deref(), entry.kind.as_ref(), &entry.properties)
    }
}

/// Identifier part of a [`DatasetKey`].
///
/// Non-string property values are keyed by their JSON text in a separate
/// variant, so the number `7` and the string `"7"` stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DatasetId<'a> {
    Text(&'a str),
    Json(String),
}

/// Identity of one dataset under a [`DatasetIdentity`] rule.
///
/// Entries without an id still match each other, the same way an unlabeled
/// dataset keeps its series across passes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetKey<'a> {
    pub id: Option<DatasetId<'a>>,
    pub kind: Option<&'a ChartKind>,
}

/// Per new entry, the index of the previous dataset it pairs with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchPlan {
    pairs: SmallVec<[Option<usize>; 8]>,
}

impl MatchPlan {
    #[must_use]
    pub fn get(&self, next_index: usize) -> Option<usize> {
        self.pairs.get(next_index).copied().flatten()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    #[must_use]
    pub fn matched(&self) -> usize {
        self.pairs.iter().filter(|pair| pair.is_some()).count()
    }

    #[must_use]
    pub fn unmatched(&self) -> usize {
        self.len() - self.matched()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<usize>> + '_ {
        self.pairs.iter().copied()
    }
}

/// Pairs every new entry with the previous dataset of the same identity.
///
/// The plan follows the order of `next`, so reordering datasets keeps each
/// series attached to its own state. When `previous` holds the same key more
/// than once the last occurrence wins.
#[must_use]
pub fn match_datasets(
    previous: &[LiveDataset],
    next: &[DatasetEntry],
    identity: &DatasetIdentity,
) -> MatchPlan {
    let lookup: HashMap<DatasetKey<'_>, usize> = previous
        .iter()
        .enumerate()
        .map(|(index, dataset)| (identity.key_of_live(dataset), index))
        .collect();

    MatchPlan {
        pairs: next
            .iter()
            .map(|entry| lookup.get(&identity.key_of_entry(entry)).copied())
            .collect(),
    }
}
