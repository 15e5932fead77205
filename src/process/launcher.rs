//! Starting the bootstrap and main executables.

use std::{
    fmt,
    path::PathBuf,
    process::{Command, Stdio},
};

use log::info;

use crate::{Error, Result};

/// Which executable an injection runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchTarget {
    /// A runtime and bitness specific bootstrap, by file name
    Bootstrap(String),
    /// The inspector's own main executable, relaunched with the other bitness
    MainExecutable,
}

impl fmt::Display for LaunchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchTarget::Bootstrap(name) => write!(f, "{name}"),
            LaunchTarget::MainExecutable => write!(f, "(main executable)"),
        }
    }
}

/// A fully resolved process launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    /// What is being launched
    pub target: LaunchTarget,
    /// Resolved program path
    pub program: PathBuf,
    /// Positional arguments, unquoted
    pub args: Vec<String>,
}

impl LaunchCommand {
    /// The command as it would be typed, with arguments quoted where needed
    #[must_use]
    pub fn command_line(&self) -> String {
        let mut line = quote(&self.program.display().to_string());
        for arg in &self.args {
            line.push(' ');
            line.push_str(&quote(arg));
        }
        line
    }
}

fn quote(text: &str) -> String {
    if text.is_empty() || text.contains(char::is_whitespace) || text.contains('"') {
        format!("\"{}\"", text.replace('"', "\\\""))
    } else {
        text.to_string()
    }
}

/// Starts processes.
pub trait ProcessLauncher: Send + Sync {
    /// Starts `command` without waiting for it.
    ///
    /// # Errors
    /// Returns [`Error::Launch`] if the process could not be started.
    fn launch(&self, command: &LaunchCommand) -> Result<()>;
}

/// Launches through [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StdLauncher;

impl ProcessLauncher for StdLauncher {
    fn launch(&self, command: &LaunchCommand) -> Result<()> {
        info!("Launching {}", command.command_line());

        Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|source| Error::Launch {
                program: command.program.display().to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> LaunchCommand {
        LaunchCommand {
            target: LaunchTarget::Bootstrap("HawkscopeBootstrapN4x86.exe".to_string()),
            program: PathBuf::from("bin/HawkscopeBootstrapN4x86.exe"),
            args: vec![
                "100".to_string(),
                "200".to_string(),
                "C:\\Program Files\\Hawkscope\\Hawkscope.Core.dll".to_string(),
                "Hawkscope.Core.Attach".to_string(),
                "Attach".to_string(),
            ],
        }
    }

    #[test]
    fn test_command_line_quotes_spaces() {
        assert_eq!(
            command().command_line(),
            "bin/HawkscopeBootstrapN4x86.exe 100 200 \"C:\\Program Files\\Hawkscope\\Hawkscope.Core.dll\" Hawkscope.Core.Attach Attach"
        );
    }

    #[test]
    fn test_std_launcher_reports_missing_program() {
        let mut missing = command();
        missing.program = PathBuf::from("this-program-does-not-exist-hawkscope");

        let error = StdLauncher.launch(&missing).unwrap_err();
        assert!(matches!(error, Error::Launch { .. }));
    }

    #[test]
    fn test_target_display() {
        assert_eq!(LaunchTarget::MainExecutable.to_string(), "(main executable)");
        assert_eq!(command().target.to_string(), "HawkscopeBootstrapN4x86.exe");
    }
}
