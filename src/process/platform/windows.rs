//! Win32 window system.

use std::{ffi::c_void, mem, path::PathBuf};

use log::{debug, warn};
use widestring::U16CStr;
use windows::Win32::{
    Foundation::{CloseHandle, BOOL, HWND, LPARAM, RECT, TRUE, WPARAM},
    Graphics::Gdi::{EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFO, MONITORINFOEXW},
    System::{
        Diagnostics::ToolHelp::{
            CreateToolhelp32Snapshot, Module32FirstW, Module32NextW, MODULEENTRY32W,
            TH32CS_SNAPMODULE, TH32CS_SNAPMODULE32,
        },
        Threading::GetCurrentProcessId,
    },
    UI::WindowsAndMessaging::{
        EnumWindows, FlashWindow, GetWindow, GetWindowThreadProcessId, IsWindow,
        IsWindowVisible, SendMessageW, GW_OWNER, MONITORINFOF_PRIMARY, WM_CLOSE,
    },
};

use crate::{
    layout::{Rect, Screen},
    process::{image, ModuleInfo, WindowHandle, WindowSystem},
    Error, Result,
};

fn hwnd(window: WindowHandle) -> HWND {
    HWND(window.raw() as *mut c_void)
}

fn handle(hwnd: HWND) -> WindowHandle {
    WindowHandle::new(hwnd.0 as isize)
}

fn rect(native: RECT) -> Rect {
    Rect::new(
        native.left,
        native.top,
        native.right - native.left,
        native.bottom - native.top,
    )
}

fn wide(buffer: &[u16]) -> String {
    U16CStr::from_slice_truncate(buffer)
        .map(|text| text.to_string_lossy())
        .unwrap_or_default()
}

fn module_info(entry: &MODULEENTRY32W) -> ModuleInfo {
    let name = wide(&entry.szModule);
    let path = PathBuf::from(wide(&entry.szExePath));

    // Only mscorlib needs its runtime version read from disk.
    let runtime_major = if name.to_ascii_lowercase().contains("mscorlib") {
        match image::probe_file(&path) {
            Ok(info) => info.runtime_major(),
            Err(error) => {
                debug!("Cannot probe '{}': {error}", path.display());
                None
            }
        }
    } else {
        None
    };

    ModuleInfo {
        name,
        path: Some(path),
        runtime_major,
    }
}

struct MainWindowSearch {
    process_id: u32,
    found: Option<HWND>,
}

unsafe extern "system" fn find_main_window(window: HWND, lparam: LPARAM) -> BOOL {
    let search = &mut *(lparam.0 as *mut MainWindowSearch);

    let mut owner = 0u32;
    GetWindowThreadProcessId(window, Some(&mut owner));
    let unowned = GetWindow(window, GW_OWNER).map_or(true, |owner| owner.0.is_null());

    if owner == search.process_id && unowned && IsWindowVisible(window).as_bool() {
        search.found = Some(window);
        return BOOL(0);
    }

    TRUE
}

unsafe extern "system" fn collect_monitor(
    monitor: HMONITOR,
    _hdc: HDC,
    _clip: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    let screens = &mut *(lparam.0 as *mut Vec<Screen>);

    let mut info = MONITORINFOEXW::default();
    info.monitorInfo.cbSize = mem::size_of::<MONITORINFOEXW>() as u32;
    if GetMonitorInfoW(monitor, &mut info.monitorInfo as *mut MONITORINFO).as_bool() {
        screens.push(Screen {
            device_name: wide(&info.szDevice),
            bounds: rect(info.monitorInfo.rcMonitor),
            working_area: rect(info.monitorInfo.rcWork),
            primary: info.monitorInfo.dwFlags & MONITORINFOF_PRIMARY != 0,
        });
    }

    TRUE
}

/// The window system of the running Windows session.
#[derive(Debug, Default)]
pub struct WindowsSystem;

impl WindowsSystem {
    /// Connects to the current session
    #[must_use]
    pub fn new() -> Self {
        WindowsSystem
    }

    fn ensure_window(window: WindowHandle) -> Result<HWND> {
        let native = hwnd(window);
        if unsafe { IsWindow(native) }.as_bool() {
            Ok(native)
        } else {
            Err(Error::WindowNotFound(window))
        }
    }
}

impl WindowSystem for WindowsSystem {
    fn current_process_id(&self) -> u32 {
        unsafe { GetCurrentProcessId() }
    }

    fn process_of(&self, window: WindowHandle) -> Result<u32> {
        let native = Self::ensure_window(window)?;

        let mut process_id = 0u32;
        unsafe { GetWindowThreadProcessId(native, Some(&mut process_id)) };
        if process_id == 0 {
            return Err(Error::WindowNotFound(window));
        }

        Ok(process_id)
    }

    fn modules(&self, process_id: u32) -> Vec<ModuleInfo> {
        let snapshot = match unsafe {
            CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, process_id)
        } {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!("Cannot enumerate the modules of process {process_id}: {error}");
                return Vec::new();
            }
        };

        let mut modules = Vec::new();
        let mut entry = MODULEENTRY32W {
            dwSize: mem::size_of::<MODULEENTRY32W>() as u32,
            ..Default::default()
        };

        unsafe {
            if Module32FirstW(snapshot, &mut entry).is_ok() {
                loop {
                    modules.push(module_info(&entry));
                    if Module32NextW(snapshot, &mut entry).is_err() {
                        break;
                    }
                }
            }
            let _ = CloseHandle(snapshot);
        }

        modules
    }

    fn main_window(&self, process_id: u32) -> Option<WindowHandle> {
        let mut search = MainWindowSearch {
            process_id,
            found: None,
        };

        // EnumWindows reports an error when the callback stops the enumeration early.
        let _ = unsafe {
            EnumWindows(
                Some(find_main_window),
                LPARAM(&mut search as *mut MainWindowSearch as isize),
            )
        };

        search.found.map(handle)
    }

    fn send_close(&self, window: WindowHandle) -> Result<()> {
        let native = Self::ensure_window(window)?;
        unsafe { SendMessageW(native, WM_CLOSE, WPARAM(0), LPARAM(0)) };
        Ok(())
    }

    fn screens(&self) -> Vec<Screen> {
        let mut screens: Vec<Screen> = Vec::new();
        unsafe {
            let _ = EnumDisplayMonitors(
                HDC::default(),
                None,
                Some(collect_monitor),
                LPARAM(&mut screens as *mut Vec<Screen> as isize),
            );
        }
        screens
    }

    fn highlight(&self, window: WindowHandle) -> Result<()> {
        let native = Self::ensure_window(window)?;
        unsafe {
            let _ = FlashWindow(native, TRUE);
        }
        Ok(())
    }
}
