use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use hawkscope::{
    navigation::NavigationOutcome,
    process::StdLauncher,
    Session, SessionConfig,
};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::{parse_handle, window_system},
    output::{field, print_output},
};

#[derive(Debug, Serialize)]
struct AttachInfo {
    target: String,
    previous: String,
    state: String,
    outcome: String,
    plugins: usize,
    dump: Option<String>,
}

fn describe(outcome: &NavigationOutcome) -> String {
    match outcome {
        NavigationOutcome::Cleared => "no target".to_string(),
        NavigationOutcome::Injected(command) => format!("handed over to {}", command.target),
        NavigationOutcome::Native => "native window".to_string(),
        NavigationOutcome::Inspected { properties, events } => {
            format!("{properties} properties, {events} events")
        }
        NavigationOutcome::Highlighted => "highlighted".to_string(),
        NavigationOutcome::Unchanged => "unchanged".to_string(),
    }
}

pub fn run(
    target: &str,
    previous: &str,
    settings: Option<&str>,
    opts: &GlobalOptions,
) -> anyhow::Result<()> {
    let target = parse_handle(target)?;
    let previous = parse_handle(previous)?;

    let config = SessionConfig {
        settings_file: settings.map(str::to_string),
        data_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        ..SessionConfig::default()
    };
    let mut session = Session::new(config, window_system()?, Arc::new(StdLauncher))
        .context("failed to open the session")?;

    let outcome = session.attach(target, previous)?;
    let info = AttachInfo {
        target: target.to_string(),
        previous: previous.to_string(),
        state: session.state().to_string(),
        outcome: describe(&outcome),
        plugins: session.plugins_mut().loaded(),
        dump: session.navigator().dump(),
    };
    session.teardown()?;

    print_output(&info, opts, |info| {
        field("Target", &info.target, 10);
        field("Previous", &info.previous, 10);
        field("State", &info.state, 10);
        field("Outcome", &info.outcome, 10);
        if let Some(dump) = &info.dump {
            println!();
            println!("{dump}");
        }
    })
}
