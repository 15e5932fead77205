//! The target selection state machine.

use std::{fs, path::Path, sync::Arc};

use log::{debug, error};
use strum::{Display, EnumIter};

use crate::{
    descriptor::{CollectorOptions, DescriptorRc, PropertyCollector, TypeDescriptorRegistry},
    navigation::History,
    process::{InjectionController, LaunchCommand, Teardown, WindowHandle, WindowInfo},
    reflection::{MemberAccessor, ObjectRef, Value},
    Error, Result,
};

/// Toolbar actions of the managed property view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum NavigationAction {
    /// Back in the history
    Previous,
    /// Forward in the history
    Next,
    /// Select the parent control's window
    Parent,
    /// Flash the current window
    Highlight,
}

/// What the navigator did after the current target changed.
#[derive(Debug)]
pub enum NavigationOutcome {
    /// There is no current target
    Cleared,
    /// The session handed over to another process through this command
    Injected(LaunchCommand),
    /// The target is not a control of this process; only native information is available
    Native,
    /// The managed view was populated
    Inspected {
        /// Number of property rows
        properties: usize,
        /// Number of event rows
        events: usize,
    },
    /// The window was highlighted
    Highlighted,
    /// The action was not applicable
    Unchanged,
}

/// Collaborators a navigation step needs.
pub struct NavigationContext<'a> {
    /// Decides on and performs injection
    pub controller: &'a mut InjectionController,
    /// Runs before a handoff
    pub teardown: &'a mut dyn Teardown,
    /// Descriptor cache for the property view
    pub registry: &'a TypeDescriptorRegistry,
    /// Property view options
    pub options: CollectorOptions,
}

/// Tracks the selected window and the property view built for it.
#[derive(Debug, Default)]
pub struct Navigator {
    history: History<Option<Arc<WindowInfo>>>,
    properties: Vec<DescriptorRc>,
    events: Vec<DescriptorRc>,
}

impl Navigator {
    /// A navigator with an empty history
    #[must_use]
    pub fn new() -> Self {
        Navigator::default()
    }

    /// The visited targets
    #[must_use]
    pub fn history(&self) -> &History<Option<Arc<WindowInfo>>> {
        &self.history
    }

    /// The current target, if any
    #[must_use]
    pub fn current(&self) -> Option<&Arc<WindowInfo>> {
        self.history.current().ok().flatten().and_then(Option::as_ref)
    }

    /// Handle of the current target, null when there is none
    #[must_use]
    pub fn target(&self) -> WindowHandle {
        self.current().map_or(WindowHandle::NULL, |info| info.handle())
    }

    /// Property rows of the current target
    #[must_use]
    pub fn properties(&self) -> &[DescriptorRc] {
        &self.properties
    }

    /// Event rows of the current target
    #[must_use]
    pub fn events(&self) -> &[DescriptorRc] {
        &self.events
    }

    /// Selects `window`.
    ///
    /// Building the window info can fail; the failure is logged and an empty entry is pushed,
    /// just like picking no window at all.
    ///
    /// # Errors
    /// Returns the errors of [`Navigator::on_current_changed`].
    pub fn set_target(
        &mut self,
        window: WindowHandle,
        context: &mut NavigationContext<'_>,
    ) -> Result<NavigationOutcome> {
        let info = context.controller.build_window_info(window);
        self.show(info, context)
    }

    /// Pushes `info` and reacts to the change.
    ///
    /// # Errors
    /// Returns the errors of [`Navigator::on_current_changed`].
    pub fn show(
        &mut self,
        info: Option<Arc<WindowInfo>>,
        context: &mut NavigationContext<'_>,
    ) -> Result<NavigationOutcome> {
        self.history.push(info);
        self.on_current_changed(context)
    }

    /// Reacts to a change of the current target.
    ///
    /// Injects when the controller says so, and otherwise rebuilds the property view from the
    /// current control, if there is one.
    ///
    /// # Errors
    /// Returns [`Error::Launch`] if an injection was attempted and the launch failed.
    pub fn on_current_changed(
        &mut self,
        context: &mut NavigationContext<'_>,
    ) -> Result<NavigationOutcome> {
        self.properties.clear();
        self.events.clear();

        let Some(info) = self.current().cloned() else {
            return Ok(NavigationOutcome::Cleared);
        };

        if context.controller.can_inject(Some(&info)) {
            let command = context.controller.inject(&info, context.teardown)?;
            return Ok(NavigationOutcome::Injected(command));
        }

        let Some(control) = info.control() else {
            debug!("Window {} has no managed control", info.handle());
            return Ok(NavigationOutcome::Native);
        };

        let collector = PropertyCollector::new(context.registry, context.options);
        let component = Value::Proxy(control.clone());
        self.properties = collector.properties(&component);
        self.events = collector.events(&component);

        Ok(NavigationOutcome::Inspected {
            properties: self.properties.len(),
            events: self.events.len(),
        })
    }

    fn current_object(&self) -> Option<ObjectRef> {
        self.current()?.control()?.object()
    }

    fn parent_object(&self) -> Option<ObjectRef> {
        let object = self.current_object()?;
        match MemberAccessor::property_of(&object, "Parent").get(None) {
            Ok(Value::Object(parent)) => Some(parent),
            _ => None,
        }
    }

    /// Whether `action` applies to the current state
    #[must_use]
    pub fn can_execute(&self, action: NavigationAction) -> bool {
        match action {
            NavigationAction::Previous => self.history.has_previous(),
            NavigationAction::Next => self.history.has_next(),
            NavigationAction::Parent => self.parent_object().is_some(),
            NavigationAction::Highlight => !self.target().is_null(),
        }
    }

    /// Runs `action`.
    ///
    /// History moves rebuild the view even when there was nowhere to go, so the view always reflects
    /// the current entry.
    ///
    /// # Errors
    /// Returns the errors of [`Navigator::on_current_changed`], and [`Error::WindowNotFound`] when
    /// highlighting a window that is gone.
    pub fn execute(
        &mut self,
        action: NavigationAction,
        context: &mut NavigationContext<'_>,
    ) -> Result<NavigationOutcome> {
        match action {
            NavigationAction::Previous => {
                if self.history.has_previous() {
                    self.history.move_to_previous()?;
                }
                self.on_current_changed(context)
            }
            NavigationAction::Next => {
                if self.history.has_next() {
                    self.history.move_to_next()?;
                }
                self.on_current_changed(context)
            }
            NavigationAction::Parent => {
                let Some(parent) = self.parent_object() else {
                    return Ok(NavigationOutcome::Unchanged);
                };
                match parent_handle(&parent, context.controller) {
                    Some(handle) => self.set_target(handle, context),
                    None => {
                        error!("The parent control has no window handle");
                        Ok(NavigationOutcome::Unchanged)
                    }
                }
            }
            NavigationAction::Highlight => {
                if !self.can_execute(action) {
                    return Ok(NavigationOutcome::Unchanged);
                }
                context.controller.system().highlight(self.target())?;
                Ok(NavigationOutcome::Highlighted)
            }
        }
    }

    /// Dump text of the current target
    #[must_use]
    pub fn dump(&self) -> Option<String> {
        self.current().map(|info| info.dump())
    }

    /// Writes the dump of the current target to `path`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] without a current target and [`Error::FileError`] if the
    /// file cannot be written.
    pub fn dump_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let Some(text) = self.dump() else {
            return Err(Error::InvalidState(
                "Can't dump if no window selected.".to_string(),
            ));
        };

        fs::write(path, text)?;
        Ok(())
    }
}

fn parent_handle(parent: &ObjectRef, controller: &InjectionController) -> Option<WindowHandle> {
    if let Some(handle) = controller.directory().handle_of(parent) {
        return Some(handle);
    }

    MemberAccessor::property_of(parent, "Handle")
        .get(None)
        .ok()
        .and_then(|value| value.as_int())
        .and_then(|raw| isize::try_from(raw).ok())
        .map(WindowHandle::new)
}
