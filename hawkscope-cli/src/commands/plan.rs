use std::{path::Path, sync::Arc};

use hawkscope::process::{
    ControlDirectory, ControllerConfig, InjectionController, LaunchTarget, StdLauncher,
};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::{parse_handle, window_info, window_system},
    output::{field, print_output},
};

#[derive(Debug, Serialize)]
struct PlanInfo {
    window: String,
    process_id: u32,
    clr: String,
    bitness: String,
    inject: bool,
    target: Option<String>,
    relaunch: bool,
    program: Option<String>,
    args: Vec<String>,
    command_line: Option<String>,
}

pub fn run(
    window: &str,
    install_dir: &Path,
    inspector: Option<&str>,
    opts: &GlobalOptions,
) -> anyhow::Result<()> {
    let window = parse_handle(window)?;
    let system = window_system()?;
    let info = window_info(system.as_ref(), window)?;

    let config = ControllerConfig {
        install_dir: install_dir.to_path_buf(),
        ..ControllerConfig::default()
    };
    let mut controller = InjectionController::new(
        system,
        Arc::new(StdLauncher),
        Arc::new(ControlDirectory::new()),
        config,
    );
    if let Some(inspector) = inspector {
        controller.set_inspector_window(parse_handle(inspector)?);
    }

    let inject = controller.can_inject(Some(&info));
    let command = if inject {
        Some(controller.launch_command(&info)?)
    } else {
        None
    };

    let plan = PlanInfo {
        window: info.handle().to_string(),
        process_id: info.process_id(),
        clr: info.clr().to_string(),
        bitness: info.bitness().to_string(),
        inject,
        target: command.as_ref().map(|command| command.target.to_string()),
        relaunch: command
            .as_ref()
            .is_some_and(|command| command.target == LaunchTarget::MainExecutable),
        program: command
            .as_ref()
            .map(|command| command.program.display().to_string()),
        args: command
            .as_ref()
            .map(|command| command.args.clone())
            .unwrap_or_default(),
        command_line: command.as_ref().map(|command| command.command_line()),
    };

    print_output(&plan, opts, |plan| {
        field("Window", &plan.window, 10);
        field("Process", plan.process_id, 10);
        field("CLR", &plan.clr, 10);
        field("Bitness", &plan.bitness, 10);
        println!();
        match &plan.command_line {
            Some(command_line) if plan.relaunch => {
                println!("Relaunch the inspector to detect the runtime again:");
                println!("  {command_line}");
            }
            Some(command_line) => {
                println!("Inject through {}:", plan.target.as_deref().unwrap_or_default());
                println!("  {command_line}");
            }
            None => println!("No injection: the window is inspected from this process."),
        }
    })
}
