//! The bootstrap side of an injection.
//!
//! A bootstrap is started with five positional arguments: the target window, the window of the
//! inspector instance that started it, the attach assembly, the attach type and the attach
//! method. It hands the last three to an [`Injector`] as a single `assembly$type$method`
//! payload, then checks that the injector module really showed up in the target.

use log::{debug, error, info};

use crate::{
    process::{WindowHandle, WindowSystem},
    Error, Result,
};

/// File name fragment identifying the injector module inside a target
pub const INJECTOR_MODULE: &str = "HawkscopeInjector";

/// Registered window message the injector hooks
pub const INJECTOR_MESSAGE: &str = "HawkscopeInjector_GOBABYGO!";

const SEPARATOR: char = '$';

/// Parsed bootstrap command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectorParameters {
    /// Window to inject into
    pub window: WindowHandle,
    /// Window of the inspector instance being replaced
    pub previous: WindowHandle,
    /// Attach assembly path
    pub assembly: String,
    /// Attach type name
    pub type_name: String,
    /// Attach method name
    pub method: String,
}

impl InjectorParameters {
    /// Parses the five positional bootstrap arguments. Surrounding quotes are stripped.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] for a wrong argument count or unparsable handles.
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args
            .into_iter()
            .map(|arg| arg.as_ref().trim().trim_matches('"').to_string())
            .collect();

        let [window, previous, assembly, type_name, method] = args.as_slice() else {
            return Err(Error::InvalidArgument(format!(
                "Expected 5 arguments (window, previous window, assembly, type, method), got {}",
                args.len()
            )));
        };

        for (label, value) in [("assembly", assembly), ("type", type_name), ("method", method)] {
            if value.is_empty() || value.contains(SEPARATOR) {
                return Err(Error::InvalidArgument(format!(
                    "Invalid {label} argument '{value}'"
                )));
            }
        }

        Ok(InjectorParameters {
            window: window.parse()?,
            previous: previous.parse()?,
            assembly: assembly.clone(),
            type_name: type_name.clone(),
            method: method.clone(),
        })
    }

    /// The `assembly$type$method` string handed to the injected module
    #[must_use]
    pub fn payload(&self) -> String {
        format!(
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            self.assembly, self.type_name, self.method
        )
    }
}

/// A decoded injection payload, as seen by the injected module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachPayload {
    /// Assembly to load
    pub assembly: String,
    /// Type to look up in it
    pub type_name: String,
    /// Static method to call
    pub method: String,
}

impl AttachPayload {
    /// Splits an `assembly$type$method` payload.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] unless the payload has exactly three non-empty parts.
    pub fn parse(payload: &str) -> Result<Self> {
        let parts: Vec<&str> = payload.split(SEPARATOR).collect();
        match parts.as_slice() {
            [assembly, type_name, method]
                if !assembly.is_empty() && !type_name.is_empty() && !method.is_empty() =>
            {
                Ok(AttachPayload {
                    assembly: (*assembly).to_string(),
                    type_name: (*type_name).to_string(),
                    method: (*method).to_string(),
                })
            }
            _ => Err(Error::InvalidArgument(format!(
                "Malformed attach payload '{payload}'"
            ))),
        }
    }
}

/// Delivers a payload into the process owning a window.
pub trait Injector {
    /// Injects `payload` through `window`
    ///
    /// # Errors
    /// Returns an error if the injection could not be attempted at all.
    fn inject(&self, window: WindowHandle, payload: &str) -> Result<()>;
}

/// Outcome of a bootstrap run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapOutcome {
    /// The window the last injection went through
    pub window: WindowHandle,
    /// Whether the injector module is present in the target afterwards
    pub injected: bool,
}

fn check_injected(system: &dyn WindowSystem, process_id: u32) -> bool {
    let injected = system
        .modules(process_id)
        .iter()
        .any(|module| module.name.contains(INJECTOR_MODULE));

    if injected {
        info!("Successfully injected into process {process_id}");
    } else {
        error!("Failed to inject into process {process_id}");
    }
    injected
}

/// Runs the bootstrap protocol.
///
/// Some windows do not pump the injector's message. When the first attempt leaves no trace in
/// the target and the process's main window is a different window, the injection is retried
/// exactly once through the main window.
///
/// # Errors
/// Returns [`Error::WindowNotFound`] if the target window is gone, and injector errors.
pub fn run_bootstrap(
    parameters: &InjectorParameters,
    system: &dyn WindowSystem,
    injector: &dyn Injector,
) -> Result<BootstrapOutcome> {
    let payload = parameters.payload();
    let process_id = system.process_of(parameters.window)?;

    debug!("Injecting '{payload}' through window {}", parameters.window);
    injector.inject(parameters.window, &payload)?;

    let mut outcome = BootstrapOutcome {
        window: parameters.window,
        injected: check_injected(system, process_id),
    };

    if !outcome.injected {
        if let Some(main_window) = system.main_window(process_id) {
            if main_window != parameters.window {
                debug!("Could not inject with the current handle, retrying with main window {main_window}");
                injector.inject(main_window, &payload)?;
                outcome = BootstrapOutcome {
                    window: main_window,
                    injected: check_injected(system, process_id),
                };
            }
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::process::{mock::MockWindowSystem, ModuleInfo};

    const ARGS: [&str; 5] = [
        "100",
        "200",
        "\"C:\\Hawkscope\\Hawkscope.Core.dll\"",
        "\"Hawkscope.HawkscopeAttacher\"",
        "Attach",
    ];

    #[derive(Default)]
    struct RecordingInjector {
        calls: RefCell<Vec<WindowHandle>>,
    }

    impl Injector for RecordingInjector {
        fn inject(&self, window: WindowHandle, _payload: &str) -> Result<()> {
            self.calls.borrow_mut().push(window);
            Ok(())
        }
    }

    #[test]
    fn test_parse_parameters() {
        let parameters = InjectorParameters::parse(ARGS).unwrap();
        assert_eq!(parameters.window, WindowHandle::new(100));
        assert_eq!(parameters.previous, WindowHandle::new(200));
        assert_eq!(parameters.assembly, "C:\\Hawkscope\\Hawkscope.Core.dll");
        assert_eq!(
            parameters.payload(),
            "C:\\Hawkscope\\Hawkscope.Core.dll$Hawkscope.HawkscopeAttacher$Attach"
        );

        let payload = AttachPayload::parse(&parameters.payload()).unwrap();
        assert_eq!(payload.type_name, "Hawkscope.HawkscopeAttacher");
        assert_eq!(payload.method, "Attach");
    }

    #[test]
    fn test_parse_rejects_bad_arguments() {
        assert!(InjectorParameters::parse(&ARGS[..4]).is_err());
        assert!(InjectorParameters::parse(["x", "1", "a", "b", "c"]).is_err());
        assert!(InjectorParameters::parse(["1", "2", "a$b", "b", "c"]).is_err());
        assert!(AttachPayload::parse("a$b").is_err());
        assert!(AttachPayload::parse("a$$c").is_err());
    }

    #[test]
    fn test_single_injection_when_it_works() {
        let system = MockWindowSystem::new(1)
            .with_window(WindowHandle::new(100), 5)
            .with_main_window(5, WindowHandle::new(101))
            .with_modules(5, vec![ModuleInfo::named("HawkscopeInjector.dll")]);
        let injector = RecordingInjector::default();

        let outcome =
            run_bootstrap(&InjectorParameters::parse(ARGS).unwrap(), &system, &injector).unwrap();
        assert!(outcome.injected);
        assert_eq!(*injector.calls.borrow(), [WindowHandle::new(100)]);
    }

    #[test]
    fn test_retries_once_with_main_window() {
        let system = MockWindowSystem::new(1)
            .with_window(WindowHandle::new(100), 5)
            .with_main_window(5, WindowHandle::new(101))
            .with_modules(5, vec![ModuleInfo::named("app.exe")]);
        let injector = RecordingInjector::default();

        let outcome =
            run_bootstrap(&InjectorParameters::parse(ARGS).unwrap(), &system, &injector).unwrap();
        assert!(!outcome.injected);
        assert_eq!(outcome.window, WindowHandle::new(101));
        assert_eq!(
            *injector.calls.borrow(),
            [WindowHandle::new(100), WindowHandle::new(101)]
        );
    }

    #[test]
    fn test_no_retry_when_target_is_main_window() {
        let system = MockWindowSystem::new(1)
            .with_main_window(5, WindowHandle::new(100))
            .with_modules(5, vec![ModuleInfo::named("app.exe")]);
        let injector = RecordingInjector::default();

        let outcome =
            run_bootstrap(&InjectorParameters::parse(ARGS).unwrap(), &system, &injector).unwrap();
        assert!(!outcome.injected);
        assert_eq!(injector.calls.borrow().len(), 1);
    }

    #[test]
    fn test_missing_window() {
        let system = MockWindowSystem::new(1);
        let injector = RecordingInjector::default();

        let result = run_bootstrap(&InjectorParameters::parse(ARGS).unwrap(), &system, &injector);
        assert!(matches!(result, Err(Error::WindowNotFound(_))));
        assert!(injector.calls.borrow().is_empty());
    }
}
