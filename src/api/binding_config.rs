use serde::{Deserialize, Serialize};

use crate::error::{BindingError, BindingResult};
use crate::reconcile::{DatasetIdKey, DatasetIdentity};

/// What happens when the declarative chart kind changes between passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KindChangePolicy {
    /// Write the new kind into the live tree and update in place.
    #[default]
    MergeInPlace,
    /// Destroy the instance and build a new one.
    Recreate,
}

/// Binding setup. Serializable so hosts can keep it next to their chart
/// definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BindingConfig {
    #[serde(default)]
    pub dataset_identity: DatasetIdentity,
    #[serde(default)]
    pub kind_change_policy: KindChangePolicy,
}

impl BindingConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rule used to pair datasets across passes.
    #[must_use]
    pub fn with_dataset_identity(mut self, identity: DatasetIdentity) -> Self {
        self.dataset_identity = identity;
        self
    }

    /// Sets how a chart kind change is applied.
    #[must_use]
    pub fn with_kind_change_policy(mut self, policy: KindChangePolicy) -> Self {
        self.kind_change_policy = policy;
        self
    }

    pub fn validate(&self) -> BindingResult<()> {
        if let DatasetIdKey::Property(name) = &self.dataset_identity.key {
            if name.trim().is_empty() {
                return Err(BindingError::InvalidConfig(
                    "dataset identity property name must not be empty".to_owned(),
                ));
            }
        }
        Ok(())
    }

    pub fn from_json_str(input: &str) -> BindingResult<Self> {
        let config: Self = serde_json::from_str(input).map_err(|e| {
            BindingError::InvalidConfig(format!("failed to parse binding config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> BindingResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            BindingError::InvalidConfig(format!("failed to serialize binding config: {e}"))
        })
    }
}
