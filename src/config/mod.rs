//! Store settings loaded from TOML.

mod settings;

pub use settings::{SettingsError, StoreSettings};
