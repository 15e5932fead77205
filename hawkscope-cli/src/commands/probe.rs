use std::path::Path;

use anyhow::Context;
use hawkscope::process::image;
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    output::{field, print_output},
};

#[derive(Debug, Serialize)]
struct ProbeInfo {
    file: String,
    bitness: String,
    managed: bool,
    runtime_version: Option<String>,
    runtime_major: Option<u32>,
}

pub fn run(path: &Path, opts: &GlobalOptions) -> anyhow::Result<()> {
    let image = image::probe_file(path)
        .with_context(|| format!("failed to probe image: {}", path.display()))?;

    let info = ProbeInfo {
        file: path.display().to_string(),
        bitness: image.bitness.to_string(),
        managed: image.is_managed,
        runtime_major: image.runtime_major(),
        runtime_version: image.runtime_version,
    };

    print_output(&info, opts, |info| {
        field("File", &info.file, 10);
        field("Bitness", &info.bitness, 10);
        match &info.runtime_version {
            Some(version) => field("Runtime", version, 10),
            None if info.managed => field("Runtime", "(unknown)", 10),
            None => field("Runtime", "(native image)", 10),
        }
    })
}
