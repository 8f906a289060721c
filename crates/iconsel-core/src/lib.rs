//! Core of the iconsel icon theme picker.
//!
//! Everything here is toolkit independent. Front-ends supply a
//! [`Scheduler`] (an idle callback on their event loop) and implement
//! [`ThemeListView`] and [`PreviewPanel`]; [`IconThemeDialog`] does the rest.

pub mod catalog;
pub mod config;
pub mod dialog;
pub mod error;
pub mod logging;
pub mod population;
pub mod preview;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod xdg;

pub use catalog::{CatalogSnapshot, MemoryCatalog, Theme, ThemeCatalog};
pub use config::{Config, ConfigLoadResult, PickerConfig};
pub use dialog::{DialogViews, IconThemeDialog};
pub use error::{Error, Result};
pub use population::{
    Phase, PopulationContext, PopulationRun, PreviewPanel, RunStatus, ThemeListView,
};
pub use preview::{IconCandidates, PreviewResolver, PreviewSet, PreviewSlot};
pub use scheduler::{IdleQueue, Scheduler, StepFn, TaskHandle};
pub use session::{CommitResult, ConfigBus, SelectionSession};
pub use settings::{IconThemeSettings, SettingsStore};
pub use xdg::XdgIconCatalog;
