//! # foresight-settings
//!
//! Configuration management with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`ForesightSettings::default()`]
//! 2. **JSON file**: deep-merged over defaults
//! 3. **Environment variables**: `FORESIGHT_*` overrides (highest priority)
//!
//! There is no global singleton: the binary loads settings once and
//! injects them into the components that need them.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_or_default};
pub use types::*;
