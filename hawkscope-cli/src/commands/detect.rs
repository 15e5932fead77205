use hawkscope::process::Bitness;
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::{module_rows, parse_handle, window_info, window_system, ModuleRow},
    output::{field, print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
struct DetectInfo {
    window: String,
    process_id: u32,
    clr: String,
    bitness: String,
    inspector_bitness: String,
    modules: Vec<ModuleRow>,
}

pub fn run(window: &str, opts: &GlobalOptions) -> anyhow::Result<()> {
    let window = parse_handle(window)?;
    let system = window_system()?;
    let info = window_info(system.as_ref(), window)?;

    let detected = DetectInfo {
        window: info.handle().to_string(),
        process_id: info.process_id(),
        clr: info.clr().to_string(),
        bitness: info.bitness().to_string(),
        inspector_bitness: system.inspector_bitness().to_string(),
        modules: module_rows(&info),
    };

    print_output(&detected, opts, display_detection)
}

fn display_detection(info: &DetectInfo) {
    field("Window", &info.window, 10);
    field("Process", info.process_id, 10);
    field("CLR", &info.clr, 10);
    field("Bitness", &info.bitness, 10);
    if info.inspector_bitness != Bitness::current().to_string() {
        field("Inspector", &info.inspector_bitness, 10);
    }

    if info.modules.is_empty() {
        println!("No modules visible from this process.");
        return;
    }

    println!();
    println!("Modules ({}):", info.modules.len());
    let mut table = TabWriter::new(vec![
        ("Name", Align::Left),
        ("Runtime", Align::Right),
        ("Path", Align::Left),
    ])
    .indent("  ");
    for module in &info.modules {
        table.row(vec![
            module.name.clone(),
            module
                .runtime_major
                .map_or_else(String::new, |major| format!("v{major}")),
            module.path.clone().unwrap_or_default(),
        ]);
    }
    table.print();
}
