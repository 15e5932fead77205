//! Managed runtime and bitness detection from a process module list.

use crate::process::{Bitness, Clr, ModuleInfo};

fn has_module(modules: &[ModuleInfo], name: &str) -> bool {
    modules.iter().any(|module| module.name.eq_ignore_ascii_case(name))
}

/// Detects the managed runtime loaded in a process.
///
/// An empty list means the modules could not be read at all, which happens when a 32-bit
/// inspector looks at a 64-bit process, so the runtime is [`Clr::Undefined`] rather than
/// [`Clr::None`].
#[must_use]
pub fn detect_clr(modules: &[ModuleInfo]) -> Clr {
    if modules.is_empty() {
        return Clr::Undefined;
    }

    if has_module(modules, "coreclr.dll") {
        return Clr::Unsupported;
    }
    if has_module(modules, "clr.dll") {
        return Clr::Net4;
    }
    if has_module(modules, "mscorwks.dll") {
        return Clr::Net2;
    }

    let mut mscorlibs = modules
        .iter()
        .filter(|module| module.name.to_ascii_lowercase().contains("mscorlib"))
        .peekable();
    if mscorlibs.peek().is_none() {
        return Clr::None;
    }

    let majors: Vec<Option<u32>> = mscorlibs.map(|module| module.runtime_major).collect();
    if majors.contains(&Some(4)) {
        Clr::Net4
    } else if majors.iter().any(|major| matches!(major, Some(2 | 3))) {
        Clr::Net2
    } else {
        Clr::Unsupported
    }
}

/// Detects the bitness of a process as seen from an inspector of bitness `inspector`.
///
/// A 64-bit inspector sees the `wow64` layer inside 32-bit processes. A 32-bit inspector can
/// only enumerate the modules of other 32-bit processes.
#[must_use]
pub fn detect_bitness(inspector: Bitness, modules: &[ModuleInfo]) -> Bitness {
    match inspector {
        Bitness::X64 => {
            let wow64 = modules
                .iter()
                .any(|module| module.name.to_ascii_lowercase().contains("wow64"));
            if wow64 {
                Bitness::X86
            } else {
                Bitness::X64
            }
        }
        Bitness::X86 => {
            if modules.is_empty() {
                Bitness::X64
            } else {
                Bitness::X86
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modules(names: &[&str]) -> Vec<ModuleInfo> {
        names.iter().map(|name| ModuleInfo::named(name)).collect()
    }

    #[test]
    fn test_clr_from_runtime_dlls() {
        assert_eq!(detect_clr(&[]), Clr::Undefined);
        assert_eq!(detect_clr(&modules(&["app.exe", "user32.dll"])), Clr::None);
        assert_eq!(detect_clr(&modules(&["app.exe", "CLR.dll"])), Clr::Net4);
        assert_eq!(detect_clr(&modules(&["app.exe", "mscorwks.dll"])), Clr::Net2);
        assert_eq!(
            detect_clr(&modules(&["app.exe", "coreclr.dll", "clr.dll"])),
            Clr::Unsupported
        );
    }

    #[test]
    fn test_clr_from_mscorlib_version() {
        let v4 = vec![
            ModuleInfo::named("app.exe"),
            ModuleInfo::named("mscorlib.ni.dll").with_runtime(4),
        ];
        assert_eq!(detect_clr(&v4), Clr::Net4);

        let v3 = vec![ModuleInfo::named("mscorlib.dll").with_runtime(3)];
        assert_eq!(detect_clr(&v3), Clr::Net2);

        let v1 = vec![ModuleInfo::named("mscorlib.dll").with_runtime(1)];
        assert_eq!(detect_clr(&v1), Clr::Unsupported);

        let unknown = vec![ModuleInfo::named("mscorlib.dll")];
        assert_eq!(detect_clr(&unknown), Clr::Unsupported);
    }

    #[test]
    fn test_bitness() {
        let wow = modules(&["app.exe", "wow64.dll", "wow64win.dll"]);
        let native = modules(&["app.exe", "ntdll.dll"]);

        assert_eq!(detect_bitness(Bitness::X64, &wow), Bitness::X86);
        assert_eq!(detect_bitness(Bitness::X64, &native), Bitness::X64);
        assert_eq!(detect_bitness(Bitness::X86, &native), Bitness::X86);
        assert_eq!(detect_bitness(Bitness::X86, &[]), Bitness::X64);
    }
}
