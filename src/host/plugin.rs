//! Plugins and their loading.

use std::sync::Arc;

use log::{debug, error, warn};

use crate::{host::Host, process::WindowInfo, Result};

/// A loaded plugin.
pub trait Plugin: Send {
    /// Name of the descriptor that created this plugin
    fn name(&self) -> &str;

    /// Called whenever the inspected window changes, with the new window if there is one
    fn on_target_changed(&mut self, _target: Option<&Arc<WindowInfo>>) {}

    /// The plugin's command, for plugins that add one to the toolbar
    fn as_command(&mut self) -> Option<&mut dyn CommandPlugin> {
        None
    }
}

/// A plugin exposed as a toolbar command.
pub trait CommandPlugin {
    /// Button label. Empty labels fall back to the plugin name.
    fn label(&self) -> String;

    /// Whether the command applies right now
    ///
    /// # Errors
    /// Any error means the command is disabled.
    fn can_execute(&self) -> Result<bool>;

    /// Runs the command
    ///
    /// # Errors
    /// Returns the plugin's own failure.
    fn execute_core(&mut self) -> Result<()>;

    /// Runs the command if it can execute. Returns whether it ran.
    ///
    /// # Errors
    /// Returns the error of [`CommandPlugin::execute_core`].
    fn execute(&mut self) -> Result<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }
        self.execute_core()?;
        Ok(true)
    }

    /// [`CommandPlugin::can_execute`], with errors logged and read as disabled
    fn is_enabled(&self) -> bool {
        match self.can_execute() {
            Ok(enabled) => enabled,
            Err(error) => {
                error!("Could not determine whether command can be executed: {error}");
                false
            }
        }
    }
}

/// Creates a plugin. Descriptors are registered once per session.
pub trait PluginDescriptor: Send + Sync {
    /// Plugin name
    fn name(&self) -> &str;

    /// Plugin version
    fn version(&self) -> &str;

    /// Creates the plugin for `host`. `Ok(None)` means the plugin has nothing to offer.
    ///
    /// # Errors
    /// Returns [`crate::Error::Plugin`] or any other error if the plugin cannot be created.
    fn create(&self, host: &Arc<dyn Host>) -> Result<Option<Box<dyn Plugin>>>;
}

/// Shared reference to a plugin descriptor
pub type PluginDescriptorRc = Arc<dyn PluginDescriptor>;

/// Holds the registered descriptors and the plugins created from them.
#[derive(Default)]
pub struct PluginManager {
    descriptors: Vec<PluginDescriptorRc>,
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginManager {
    /// A manager without descriptors
    #[must_use]
    pub fn new() -> Self {
        PluginManager::default()
    }

    /// Adds a descriptor. Descriptors with an already registered name are ignored.
    pub fn register(&mut self, descriptor: PluginDescriptorRc) {
        if self
            .descriptors
            .iter()
            .any(|known| known.name() == descriptor.name())
        {
            warn!("Plugin '{}' is already registered", descriptor.name());
            return;
        }

        debug!(
            "Discovered plugin '{}' {}",
            descriptor.name(),
            descriptor.version()
        );
        self.descriptors.push(descriptor);
    }

    /// The registered descriptors
    #[must_use]
    pub fn descriptors(&self) -> &[PluginDescriptorRc] {
        &self.descriptors
    }

    /// Number of loaded plugins
    #[must_use]
    pub fn loaded(&self) -> usize {
        self.plugins.len()
    }

    /// Names of the loaded plugins
    #[must_use]
    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins.iter().map(|plugin| plugin.name().to_string()).collect()
    }

    /// Creates a plugin from every descriptor, replacing previously loaded plugins.
    ///
    /// A descriptor that fails or creates nothing is logged and skipped. Returns the number
    /// of loaded plugins.
    pub fn load_all(&mut self, host: &Arc<dyn Host>) -> usize {
        self.plugins.clear();

        for descriptor in &self.descriptors {
            debug!("Loading plugin '{}':", descriptor.name());
            match descriptor.create(host) {
                Ok(Some(plugin)) => {
                    self.plugins.push(plugin);
                    debug!("--> OK");
                }
                Ok(None) => warn!("--> Created plugin is null. Nothing to load."),
                Err(error) => error!(
                    "--> Plugin '{}' could not be loaded: {error}",
                    descriptor.name()
                ),
            }
        }

        debug!(
            "{}/{} plugins were successfully loaded.",
            self.plugins.len(),
            self.descriptors.len()
        );
        self.plugins.len()
    }

    /// Forwards a target change to every plugin
    pub fn notify_target_changed(&mut self, target: Option<&Arc<WindowInfo>>) {
        for plugin in &mut self.plugins {
            plugin.on_target_changed(target);
        }
    }

    /// Labels of the command plugins, in load order
    pub fn command_labels(&mut self) -> Vec<String> {
        let mut labels = Vec::new();
        for plugin in &mut self.plugins {
            let name = plugin.name().to_string();
            if let Some(command) = plugin.as_command() {
                let label = command.label();
                labels.push(if label.is_empty() { name } else { label });
            }
        }
        labels
    }

    /// Runs the command of the plugin named `name`. Returns whether it ran.
    ///
    /// # Errors
    /// Returns [`crate::Error::Plugin`] if no such command exists, or the command's own error.
    pub fn execute_command(&mut self, name: &str) -> Result<bool> {
        let command = self
            .plugins
            .iter_mut()
            .filter(|plugin| plugin.name() == name)
            .find_map(|plugin| plugin.as_command());

        match command {
            Some(command) => command.execute(),
            None => Err(crate::Error::Plugin(format!("'{name}' has no command"))),
        }
    }
}
