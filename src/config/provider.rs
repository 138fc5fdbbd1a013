//! Process-wide configuration provider.

use std::fmt;
use std::sync::Arc;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::AppConfig;
use crate::config::source::EnvSource;
use crate::singleton::{LazySingleton, SlotState};

/// Loads the configuration once and shares it thereafter.
pub struct ConfigProvider {
    source: Box<dyn EnvSource>,
    slot: LazySingleton<Arc<AppConfig>, ConfigError>,
}

impl ConfigProvider {
    pub fn new(source: impl EnvSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            slot: LazySingleton::new("config"),
        }
    }

    /// The validated configuration, read from the source on first call.
    ///
    /// Every caller, concurrent or later, gets the same record or the same
    /// error. The source is read at most once.
    pub async fn load(&self) -> Result<Arc<AppConfig>, ConfigError> {
        let source = self.source.as_ref();
        self.slot
            .get_or_try_init(|| async move { load_config(source).map(Arc::new) })
            .await
    }

    /// The configuration if it has already been loaded.
    pub fn get(&self) -> Option<Arc<AppConfig>> {
        self.slot.get()
    }

    pub fn state(&self) -> SlotState {
        self.slot.state()
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }
}

impl fmt::Debug for ConfigProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigProvider")
            .field("resource", &self.slot.name())
            .field("source", &self.source.describe())
            .field("state", &self.slot.state())
            .finish()
    }
}
