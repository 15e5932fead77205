//! Target navigation.
//!
//! [`Navigator`] is the state machine behind the target picker: every selected window is pushed
//! onto a [`History`], and each change of the current entry either hands the session over to the
//! target's process or rebuilds the property view for it.

mod history;
mod navigator;

pub use history::History;
pub use navigator::{NavigationAction, NavigationContext, NavigationOutcome, Navigator};
