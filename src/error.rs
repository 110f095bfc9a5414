use thiserror::Error;

use crate::core::InstanceId;

pub type BindingResult<T> = Result<T, BindingError>;

#[derive(Debug, Error)]
pub enum BindingError {
    #[error("data source evaluation failed: {0}")]
    DataSource(#[from] DataSourceError),

    #[error("engine failure: {0}")]
    Engine(#[from] EngineError),

    #[error("failed to destroy chart instance {instance}: {source}")]
    Destroy {
        instance: InstanceId,
        #[source]
        source: EngineError,
    },

    #[error("`{callback}` is not valid while the binding is {phase}")]
    InvalidTransition {
        phase: &'static str,
        callback: &'static str,
    },

    #[error("`{callback}` re-entered while the chart instance is borrowed")]
    Reentrant { callback: &'static str },

    #[error("invalid binding config: {0}")]
    InvalidConfig(String),
}

/// Failure raised by a lazy data source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DataSourceError {
    message: String,
}

impl DataSourceError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure reported by a rendering engine while creating or destroying an instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    message: String,
}

impl EngineError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
