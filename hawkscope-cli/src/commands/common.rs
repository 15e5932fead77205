use std::sync::Arc;

use anyhow::Context;
use hawkscope::process::{
    detect_bitness, detect_clr, platform, WindowHandle, WindowInfo, WindowSystem,
};
use serde::Serialize;

/// Parse a window handle argument (decimal or 0x hex).
pub fn parse_handle(text: &str) -> anyhow::Result<WindowHandle> {
    text.parse()
        .with_context(|| format!("invalid window handle: {text}"))
}

/// The native window system.
pub fn window_system() -> anyhow::Result<Arc<dyn WindowSystem>> {
    platform::native().context("no window system available on this host")
}

/// Build the window info of `window` without looking for managed controls.
pub fn window_info(system: &dyn WindowSystem, window: WindowHandle) -> anyhow::Result<WindowInfo> {
    let process_id = system
        .process_of(window)
        .with_context(|| format!("cannot inspect window {window}"))?;
    let modules = system.modules(process_id);
    let clr = detect_clr(&modules);
    let bitness = detect_bitness(system.inspector_bitness(), &modules);
    Ok(WindowInfo::new(window, process_id, clr, bitness, modules, None))
}

#[derive(Debug, Serialize)]
pub struct ModuleRow {
    pub name: String,
    pub path: Option<String>,
    pub runtime_major: Option<u32>,
}

/// Serializable module list of `info`.
pub fn module_rows(info: &WindowInfo) -> Vec<ModuleRow> {
    info.modules()
        .iter()
        .map(|module| ModuleRow {
            name: module.name.clone(),
            path: module.path.as_ref().map(|path| path.display().to_string()),
            runtime_major: module.runtime_major,
        })
        .collect()
}
