//! # locus-settings
//!
//! Configuration with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`LocusSettings::default()`]
//! 2. **Settings file**: `$LOCUS_SETTINGS` or `./locus.json` (deep-merged)
//! 3. **Environment variables**: `PORT`, `CLIENT_URL`, `OPENROUTE_API_KEY`,
//!    `NODE_ENV` and the `LOCUS_*` tuning knobs (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
