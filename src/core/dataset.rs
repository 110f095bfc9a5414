use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::internal_state::InternalState;
use super::options::{OptionsTree, reconcile_map};
use super::types::{ChartKind, Label};

/// Declarative chart data: category labels plus ordered datasets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetGroup {
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub datasets: Vec<DatasetEntry>,
}

impl DatasetGroup {
    #[must_use]
    pub fn new(labels: Vec<Label>, datasets: Vec<DatasetEntry>) -> Self {
        Self { labels, datasets }
    }

    #[must_use]
    pub fn with_labels<I, L>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_dataset(mut self, dataset: DatasetEntry) -> Self {
        self.datasets.push(dataset);
        self
    }
}

/// One declarative dataset as supplied by the host.
///
/// Every field the binding does not interpret (colors, borders, axis ids)
/// travels in `properties`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ChartKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<f64>>,
    #[serde(flatten)]
    pub properties: IndexMap<String, Value>,
}

impl DatasetEntry {
    #[must_use]
    pub fn new(label: impl Into<Label>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: impl Into<Vec<f64>>) -> Self {
        self.data = Some(data.into());
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<ChartKind>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Dataset as held in the engine's live configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveDataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ChartKind>,
    #[serde(default)]
    pub data: Vec<f64>,
    #[serde(flatten)]
    pub properties: IndexMap<String, Value>,
    #[serde(skip)]
    pub internal_state: Option<InternalState>,
}

impl LiveDataset {
    /// Builds a live dataset from a declarative entry, normalizing absent data.
    #[must_use]
    pub fn from_entry(entry: DatasetEntry, internal_state: Option<InternalState>) -> Self {
        Self {
            label: entry.label,
            kind: entry.kind,
            data: entry.data.unwrap_or_default(),
            properties: entry.properties,
            internal_state,
        }
    }

    /// Writes declarative fields onto an existing live dataset.
    ///
    /// The data buffer is refilled rather than replaced and properties are
    /// reconciled structurally. `internal_state` is left alone.
    pub(crate) fn apply_entry(&mut self, entry: &DatasetEntry) {
        if self.label != entry.label {
            self.label.clone_from(&entry.label);
        }
        if self.kind != entry.kind {
            self.kind.clone_from(&entry.kind);
        }
        self.data.clear();
        if let Some(data) = &entry.data {
            self.data.extend_from_slice(data);
        }
        reconcile_map(&mut self.properties, &entry.properties);
    }

    /// Reads the dataset back in its declarative shape.
    #[must_use]
    pub fn to_entry(&self) -> DatasetEntry {
        DatasetEntry {
            label: self.label.clone(),
            kind: self.kind.clone(),
            data: Some(self.data.clone()),
            properties: self.properties.clone(),
        }
    }
}

/// Data subtree of the live configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveData {
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub datasets: Vec<LiveDataset>,
}

impl LiveData {
    /// Reads the data subtree back in its declarative shape.
    #[must_use]
    pub fn to_group(&self) -> DatasetGroup {
        DatasetGroup {
            labels: self.labels.clone(),
            datasets: self.datasets.iter().map(LiveDataset::to_entry).collect(),
        }
    }
}

/// Live configuration tree owned by a chart instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveConfig {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub data: LiveData,
    #[serde(default)]
    pub options: OptionsTree,
    /// Per-chart engine cache. Reconciliation never writes here.
    #[serde(skip)]
    pub engine_cache: Option<InternalState>,
}

impl LiveConfig {
    /// Builds the initial live configuration of a fresh instance.
    ///
    /// Datasets start without internal state.
    #[must_use]
    pub fn from_declarative(kind: ChartKind, data: DatasetGroup, options: OptionsTree) -> Self {
        Self {
            kind,
            data: LiveData {
                labels: data.labels,
                datasets: data
                    .datasets
                    .into_iter()
                    .map(|entry| LiveDataset::from_entry(entry, None))
                    .collect(),
            },
            options,
            engine_cache: None,
        }
    }
}
