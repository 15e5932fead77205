use hawkscope::process::bootstrap::{InjectorParameters, INJECTOR_MESSAGE, INJECTOR_MODULE};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    output::{field, print_output},
};

#[derive(Debug, Serialize)]
struct BootstrapInfo {
    window: String,
    previous: String,
    assembly: String,
    type_name: String,
    method: String,
    payload: String,
    injector_module: &'static str,
    injector_message: &'static str,
}

pub fn run(args: &[String], opts: &GlobalOptions) -> anyhow::Result<()> {
    let parameters = InjectorParameters::parse(args)?;

    let info = BootstrapInfo {
        window: parameters.window.to_string(),
        previous: parameters.previous.to_string(),
        payload: parameters.payload(),
        assembly: parameters.assembly,
        type_name: parameters.type_name,
        method: parameters.method,
        injector_module: INJECTOR_MODULE,
        injector_message: INJECTOR_MESSAGE,
    };

    print_output(&info, opts, |info| {
        field("Window", &info.window, 10);
        field("Previous", &info.previous, 10);
        field("Assembly", &info.assembly, 10);
        field("Type", &info.type_name, 10);
        field("Method", &info.method, 10);
        field("Payload", &info.payload, 10);
        println!();
        println!(
            "The payload is sent as '{}' to the hook in {}.",
            info.injector_message, info.injector_module
        );
    })
}
