//! The settings file.
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <settings version="1.0.0">
//!   <hawkscope>
//!     <layouts>...</layouts>
//!     <configuration>...</configuration>
//!   </hawkscope>
//!   <plugins>
//!     <snapshot>...</snapshot>
//!   </plugins>
//! </settings>
//! ```
//!
//! Every element below a section is a store, keyed `section/element`. Two keys are special:
//! `hawkscope/configuration` is the inspector's own store under the key `hawkscope`, and
//! `hawkscope/layouts` holds layout markup rather than text.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use log::{debug, error, warn};
use quick_xml::{
    escape::unescape,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Reader, Writer,
};

use crate::{
    config::{MemoryStore, ReadOnlyStore, SettingsStore, StoreRc},
    Error, Result,
};

/// Settings file format version
pub const SETTINGS_VERSION: &str = "1.0.0";

/// File name used when none is configured
pub const DEFAULT_SETTINGS_FILE: &str = "hawkscope.settings";

/// Key of the inspector's own store
pub const HAWKSCOPE_STORE_KEY: &str = "hawkscope";

/// Key of the layout markup store
pub const LAYOUTS_STORE_KEY: &str = "hawkscope/layouts";

const ROOT: &str = "settings";

const DEFAULT_SETTINGS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<settings version="1.0.0">
  <hawkscope>
    <layouts></layouts>
    <configuration></configuration>
  </hawkscope>
  <plugins>
  </plugins>
</settings>
"#;

fn store_key(section: &str, element: &str) -> String {
    match (section, element) {
        (HAWKSCOPE_STORE_KEY, "configuration") => HAWKSCOPE_STORE_KEY.to_string(),
        _ => format!("{section}/{element}"),
    }
}

fn split_key(key: &str) -> (&str, &str) {
    if key == HAWKSCOPE_STORE_KEY {
        return (HAWKSCOPE_STORE_KEY, "configuration");
    }
    key.split_once('/').unwrap_or((key, "default"))
}

fn element_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.name().as_ref()).into_owned()
}

/// Parses a settings document into `(store key, content)` pairs.
fn parse(text: &str) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                let name = element_name(&element);
                if path.is_empty() && name != ROOT {
                    return Err(Error::Xml(format!(
                        "Expected a <{ROOT}> root element, found <{name}>"
                    )));
                }

                if path.len() < 2 {
                    path.push(name);
                    continue;
                }

                let key = store_key(&path[1], &name);
                let raw = reader.read_text(element.name())?;
                let content = if key == LAYOUTS_STORE_KEY {
                    raw.trim().to_string()
                } else {
                    unescape(&raw)
                        .map_err(|error| Error::Xml(error.to_string()))?
                        .into_owned()
                };
                entries.push((key, content));
            }
            Event::Empty(element) => {
                if path.len() == 2 {
                    entries.push((store_key(&path[1], &element_name(&element)), String::new()));
                }
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

fn write_store<W: std::io::Write>(
    writer: &mut Writer<W>,
    element: &str,
    content: &str,
    markup: bool,
) -> Result<()> {
    if content.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(element)))?;
        return Ok(());
    }

    writer.write_event(Event::Start(BytesStart::new(element)))?;
    let text = if markup {
        BytesText::from_escaped(content)
    } else {
        BytesText::new(content)
    };
    writer.write_event(Event::Text(text))?;
    writer.write_event(Event::End(BytesEnd::new(element)))?;
    Ok(())
}

/// Loads, hands out and saves the settings stores.
#[derive(Debug)]
pub struct SettingsManager {
    path: PathBuf,
    stores: DashMap<String, Arc<MemoryStore>>,
}

impl SettingsManager {
    /// Resolves a configured settings file name. No name means [`DEFAULT_SETTINGS_FILE`], and
    /// relative names are taken relative to `data_dir`.
    #[must_use]
    pub fn resolve(file_name: Option<&str>, data_dir: &Path) -> PathBuf {
        let name = match file_name {
            Some(name) if !name.is_empty() => Path::new(name),
            _ => Path::new(DEFAULT_SETTINGS_FILE),
        };

        if name.is_absolute() {
            name.to_path_buf()
        } else {
            data_dir.join(name)
        }
    }

    /// Opens the settings file at `path`, creating a default one if it does not exist.
    ///
    /// # Errors
    /// Returns [`Error::FileError`] if the file cannot be created or read and [`Error::Xml`] if
    /// it is not a settings document.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            debug!("Creating default settings file '{}'", path.display());
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(&path, DEFAULT_SETTINGS)?;
        }

        let text = fs::read_to_string(&path)?;
        let manager = SettingsManager::in_memory(path);
        for (key, content) in parse(&text)? {
            if manager.stores.contains_key(&key) {
                warn!("Duplicate settings store '{key}' ignored");
                continue;
            }
            manager.stores.insert(key, Arc::new(MemoryStore::new(&content)));
        }

        Ok(manager)
    }

    /// A manager that starts empty and saves to `path`
    #[must_use]
    pub fn in_memory(path: impl Into<PathBuf>) -> Self {
        SettingsManager {
            path: path.into(),
            stores: DashMap::new(),
        }
    }

    /// The settings file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entry(&self, key: &str) -> Arc<MemoryStore> {
        self.stores
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(MemoryStore::default()))
            .clone()
    }

    /// The writable store for `key`, created empty on first use
    #[must_use]
    pub fn store(&self, key: &str) -> StoreRc {
        self.entry(key)
    }

    /// A read-only view of the inspector's own store
    #[must_use]
    pub fn hawkscope_store(&self) -> StoreRc {
        Arc::new(ReadOnlyStore::new(self.entry(HAWKSCOPE_STORE_KEY)))
    }

    /// The store a plugin asking for `key` gets. The inspector's own settings are only handed
    /// out read-only, and so is the result of asking with an empty key.
    #[must_use]
    pub fn settings(&self, key: &str) -> StoreRc {
        if key.is_empty() || key == HAWKSCOPE_STORE_KEY {
            self.hawkscope_store()
        } else {
            self.store(key)
        }
    }

    /// Store keys, sorted
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.stores.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Renders the settings document.
    ///
    /// # Errors
    /// Returns [`Error::Xml`] if the document cannot be written.
    pub fn render(&self) -> Result<String> {
        let mut sections: BTreeMap<String, BTreeMap<String, (String, bool)>> = BTreeMap::new();
        sections.entry(HAWKSCOPE_STORE_KEY.to_string()).or_default();
        for entry in &self.stores {
            let (section, element) = split_key(entry.key());
            sections.entry(section.to_string()).or_default().insert(
                element.to_string(),
                (entry.value().content(), entry.key() == LAYOUTS_STORE_KEY),
            );
        }

        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut root = BytesStart::new(ROOT);
        root.push_attribute(("version", SETTINGS_VERSION));
        writer.write_event(Event::Start(root))?;

        // The inspector's own section always comes first.
        let own = sections.remove(HAWKSCOPE_STORE_KEY).unwrap_or_default();
        let ordered = std::iter::once((HAWKSCOPE_STORE_KEY.to_string(), own)).chain(sections);
        for (section, elements) in ordered {
            writer.write_event(Event::Start(BytesStart::new(section.as_str())))?;
            for (element, (content, markup)) in &elements {
                write_store(&mut writer, element, content, *markup)?;
            }
            writer.write_event(Event::End(BytesEnd::new(section.as_str())))?;
        }

        writer.write_event(Event::End(BytesEnd::new(ROOT)))?;

        String::from_utf8(writer.into_inner()).map_err(|error| Error::Xml(error.to_string()))
    }

    /// Writes all stores to the settings file, copying the previous file to `<file>.bak` first.
    ///
    /// A failed backup is logged and does not prevent the save.
    ///
    /// # Errors
    /// Returns [`Error::FileError`] if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let text = self.render()?;

        if self.path.exists() {
            let mut backup = self.path.clone().into_os_string();
            backup.push(".bak");
            if let Err(error) = fs::copy(&self.path, &backup) {
                error!("Could not create backup copy of settings file: {error}");
            }
        }

        fs::write(&self.path, text)?;
        debug!("Settings saved to '{}'", self.path.display());
        Ok(())
    }
}
