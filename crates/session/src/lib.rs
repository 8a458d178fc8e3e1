//! Browse session plumbing: one-shot dataset load, debounced filter control,
//! and the coordinator that turns committed filters into rendered pages.
//!
//! ```text
//! keystrokes ──> FilterControl ──(debounce)──> watch<FilterSpec>
//!                    │ echo                          │ latest only
//!                    v                               v
//!                  View  <──── render ────  Browser (Catalog + Window)
//!                                                    ^
//! viewport ──> ScrollSubscription ── NearEnd ────────┘
//! ```
//!
//! The coordinator always drains pending input before recomputing, so a
//! commit that was superseded while input was queued is never evaluated.

pub mod config;
pub mod control;
pub mod coordinator;
pub mod error;
pub mod loader;
pub mod scroll;

pub use config::BrowserConfig;
pub use control::FilterControl;
pub use coordinator::{Browser, Coordinator, Flow, LoadState, Page, UiEvent, View};
pub use error::{LoadError, Result, SessionError};
pub use loader::{DataSource, Loader};
pub use scroll::{ScrollSubscription, ViewportSignal};
