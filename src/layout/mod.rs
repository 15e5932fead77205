//! Window layout persistence.
//!
//! The [`LayoutCoordinator`] restores the placement of top-level windows when they load, tracks
//! it while they move, and saves it when they close. Records are kept as XML markup through a
//! [`LayoutStore`], normally the layouts section of the settings file.

mod coordinator;
mod data;
mod geometry;

pub use coordinator::{
    AdditionalLayoutDataProvider, DefaultLayoutProvider, LayoutCoordinator, LayoutStore,
    LayoutWindow, SettingsLayoutStore, SuspendGuard,
};
pub use data::{read_layouts, write_layouts, FormLayoutData, LayoutTable, WindowState};
pub use geometry::{primary_screen, screen_of, Rect, Screen};
