// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(clippy::too_many_arguments)]

//! # hawkscope
//!
//! A live GUI inspector core. Given a top-level window, `hawkscope` decides whether it has to
//! re-launch itself inside the process owning that window, and once there it turns arbitrary
//! live objects of unknown types into browsable, editable and filterable property rows.
//!
//! ## Features
//!
//! - **Widening member resolution** - fields, properties and methods are found through ordered
//!   binding-flag search plans and up the base type chain
//! - **Uniform property descriptors** - instance, static, event and type rows share one contract
//!   with sticky first-failure error capture
//! - **Attach/injection decisions** - CLR and bitness detection, bootstrap selection and the
//!   teardown-before-launch handoff protocol
//! - **Navigation history** and **layout persistence** for the inspector's own windows
//!
//! ## Quick Start
//!
//! ```rust
//! use hawkscope::prelude::*;
//!
//! let widget = TypeBuilder::new("Demo", "Widget")
//!     .property(PropertyDef::auto("Text", "System.String"))
//!     .build();
//! let instance = Object::new(&widget);
//!
//! let text = MemberAccessor::property(&widget, "Text");
//! assert!(text.is_valid());
//!
//! let target = Value::Object(instance);
//! text.set(Some(&target), Value::from("hello"))?;
//! assert_eq!(text.get(Some(&target))?, Value::from("hello"));
//! # Ok::<(), hawkscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`reflection`] - the dynamic runtime type model, binding flags, accessors and the inspector
//! - [`descriptor`] - property descriptors, property collection and the descriptor registry
//! - [`process`] - window information, runtime detection, injection controller and bootstrap
//! - [`navigation`] - history and the navigator driving re-population of the property view
//! - [`layout`] - window layout persistence and restore
//! - [`config`] - the XML backed settings store
//! - [`host`] - plugin discovery, loading and the host capability surface
//! - [`session`] - owns every component for the lifetime of one inspector session

#[macro_use]
pub(crate) mod error;

#[cfg(test)]
pub(crate) mod test;

/// Commonly used types, for glob imports.
///
/// ```rust
/// use hawkscope::prelude::*;
///
/// let mut history: History<u32> = History::new();
/// history.push(1);
/// assert_eq!(history.current()?, Some(&1));
/// # Ok::<(), hawkscope::Error>(())
/// ```
pub mod prelude;

/// Dynamic runtime type model and member resolution.
///
/// # Key Components
///
/// - [`reflection::RuntimeType`] - a type with members, a base type and static storage
/// - [`reflection::Object`] - a live instance of a runtime type
/// - [`reflection::BindingFlags`] - member binding criteria
/// - [`reflection::MemberAccessor`] - a resolved field, property or method handle
/// - [`reflection::inspect`] - a point-in-time member listing of an object
pub mod reflection;

/// Property descriptors over resolved members.
///
/// # Key Components
///
/// - [`descriptor::PropertyDescriptor`] - the uniform descriptor contract
/// - [`descriptor::PropertyCollector`] - builds the descriptor rows for a component
/// - [`descriptor::TypeDescriptorRegistry`] - per-type member cache owned by a session
pub mod descriptor;

/// Target windows, runtime detection and the attach/injection protocol.
///
/// # Key Components
///
/// - [`process::WindowInfo`] - everything known about a candidate target window
/// - [`process::InjectionController`] - `can_inject`, `inject` and `attach`
/// - [`process::platform::WindowSystem`] - the native window system seam
/// - [`process::bootstrap`] - the bootstrap side of the injection handshake
pub mod process;

/// Navigation history and the navigator.
pub mod navigation;

/// Layout persistence for the inspector's windows.
pub mod layout;

/// Settings stores and the settings file.
pub mod config;

/// Plugins, session logging and the host capability surface.
pub mod host;

/// Session lifecycle.
pub mod session;

/// `hawkscope` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always
/// [`crate::Error`].
///
/// # Examples
///
/// ```rust
/// use hawkscope::{Result, process::WindowHandle};
///
/// fn parse(text: &str) -> Result<WindowHandle> {
///     text.parse()
/// }
/// assert_eq!(parse("0x10")?, WindowHandle::new(16));
/// # Ok::<(), hawkscope::Error>(())
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `hawkscope` Error type
///
/// The main error type for all operations in this crate.
///
/// # Examples
///
/// ```rust
/// use hawkscope::{Error, prelude::*};
///
/// let widget = TypeBuilder::new("Demo", "Widget").build();
/// let missing = MemberAccessor::field(&widget, "Nope");
/// match missing.get(None) {
///     Err(Error::InvalidAccessor { member, .. }) => assert_eq!(member, "Nope"),
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub use error::Error;

/// Session owning every inspector component.
pub use session::{Session, SessionConfig};
