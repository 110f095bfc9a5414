use std::fmt;
use std::rc::Rc;

use crate::core::{ChartKind, DatasetGroup, OptionsTree};
use crate::error::DataSourceError;
use crate::reconcile::DeclarativeConfig;

type LazyData<S> = dyn Fn(Option<&S>) -> Result<DatasetGroup, DataSourceError>;

/// Chart data as supplied by the host: a value, or a function of the surface.
pub enum DataSource<S> {
    Static(DatasetGroup),
    /// Evaluated on every pass against the surface, or `None` while the
    /// surface is not attached yet.
    Lazy(Rc<LazyData<S>>),
}

impl<S> DataSource<S> {
    pub fn lazy<F>(f: F) -> Self
    where
        F: Fn(Option<&S>) -> Result<DatasetGroup, DataSourceError> + 'static,
    {
        Self::Lazy(Rc::new(f))
    }

    #[must_use]
    pub fn is_lazy(&self) -> bool {
        matches!(self, Self::Lazy(_))
    }

    /// Produces an owned group; static data is cloned.
    pub fn resolve(&self, surface: Option<&S>) -> Result<DatasetGroup, DataSourceError> {
        match self {
            Self::Static(group) => Ok(group.clone()),
            Self::Lazy(f) => f(surface),
        }
    }
}

impl<S> Clone for DataSource<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Static(group) => Self::Static(group.clone()),
            Self::Lazy(f) => Self::Lazy(Rc::clone(f)),
        }
    }
}

impl<S> fmt::Debug for DataSource<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(group) => f.debug_tuple("Static").field(group).finish(),
            Self::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

impl<S> From<DatasetGroup> for DataSource<S> {
    fn from(value: DatasetGroup) -> Self {
        Self::Static(value)
    }
}

/// Declarative configuration delivered by the host on every render pass.
#[derive(Debug)]
pub struct ChartProps<S> {
    pub kind: ChartKind,
    pub data: DataSource<S>,
    pub options: OptionsTree,
    /// Rebuild the instance on every change instead of updating in place.
    pub redraw: bool,
    /// Identity of the mount point; a different key forces a rebuild.
    pub mount_key: Option<String>,
}

impl<S> ChartProps<S> {
    #[must_use]
    pub fn new(kind: impl Into<ChartKind>, data: impl Into<DataSource<S>>) -> Self {
        Self {
            kind: kind.into(),
            data: data.into(),
            options: OptionsTree::default(),
            redraw: false,
            mount_key: None,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: OptionsTree) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_redraw(mut self, redraw: bool) -> Self {
        self.redraw = redraw;
        self
    }

    #[must_use]
    pub fn with_mount_key(mut self, key: impl Into<String>) -> Self {
        self.mount_key = Some(key.into());
        self
    }

    /// Evaluates `data` against `surface` into an owned configuration.
    pub fn resolve(&self, surface: Option<&S>) -> Result<DeclarativeConfig, DataSourceError> {
        Ok(DeclarativeConfig {
            kind: self.kind.clone(),
            data: self.data.resolve(surface)?,
            options: self.options.clone(),
        })
    }
}

impl<S> Clone for ChartProps<S> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            data: self.data.clone(),
            options: self.options.clone(),
            redraw: self.redraw,
            mount_key: self.mount_key.clone(),
        }
    }
}
