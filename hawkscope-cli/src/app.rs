use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// hawkscope - live GUI inspector: window detection, image probing and attach handoff
#[derive(Debug, Parser)]
#[command(name = "hawkscope", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the process, runtime, bitness and modules behind a window.
    Detect {
        /// Window handle (decimal or 0x hex).
        #[arg(value_name = "HWND")]
        window: String,
    },

    /// Probe a PE image for bitness and CLR runtime version.
    Probe {
        /// Path to the PE file.
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    /// Show whether selecting a window would inject, and the command it would run.
    Plan {
        /// Window handle (decimal or 0x hex).
        #[arg(value_name = "HWND")]
        window: String,

        /// Directory holding the bootstraps and the main executable.
        #[arg(long, value_name = "DIR", default_value = ".")]
        install_dir: PathBuf,

        /// Handle of the inspector window passed to the bootstrap.
        #[arg(long, value_name = "HWND")]
        inspector: Option<String>,
    },

    /// Complete an injection handoff: close the previous instance and inspect the target.
    Attach {
        /// Window to inspect.
        #[arg(value_name = "TARGET")]
        target: String,

        /// Window of the instance that launched the bootstrap.
        #[arg(value_name = "PREVIOUS")]
        previous: String,

        /// Settings file (defaults to hawkscope.settings in the current directory).
        #[arg(long, value_name = "FILE")]
        settings: Option<String>,
    },

    /// Validate bootstrap arguments and show the injection payload.
    Bootstrap {
        /// Target window, previous window, assembly, type and method.
        #[arg(value_name = "ARGS", num_args = 0.., trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}
