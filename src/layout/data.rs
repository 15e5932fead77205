//! Persisted window placement.
//!
//! Layout records are kept as a sequence of `<layout>` elements. The settings file stores that
//! sequence inside its `<layouts>` element, and a blob still carrying the wrapper reads the same:
//!
//! ```xml
//! <layout key="main">
//!   <bounds value="10, 10, 800, 600"/>
//!   <state value="Normal"/>
//!   <screen value="\\.\DISPLAY1"/>
//!   <additionalData>splitter=250</additionalData>
//! </layout>
//! ```

use std::collections::BTreeMap;

use log::warn;
use quick_xml::{
    escape::unescape,
    events::{BytesEnd, BytesStart, BytesText, Event},
    Reader, Writer,
};
use strum::{Display, EnumIter, EnumString};

use crate::{layout::Rect, Error, Result};

/// Window show state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter)]
pub enum WindowState {
    /// Restored
    #[default]
    Normal,
    /// Minimized to the task bar
    Minimized,
    /// Maximized
    Maximized,
}

/// Placement record of one window key. Every part is optional; missing parts fall back to
/// defaults when the window is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormLayoutData {
    /// Last bounds
    pub bounds: Option<Rect>,
    /// Last show state
    pub state: Option<WindowState>,
    /// Device name of the screen the window was on
    pub screen: Option<String>,
    /// Opaque data owned by the window
    pub additional_data: Option<String>,
}

/// Layout records by key
pub type LayoutTable = BTreeMap<String, FormLayoutData>;

fn attribute(element: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    match element.try_get_attribute(name)? {
        Some(attribute) => Ok(Some(attribute.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn apply_value(key: &str, element: &BytesStart<'_>, layout: &mut FormLayoutData) -> Result<()> {
    let name = element.name();
    let name = name.as_ref();
    if !matches!(name, b"bounds" | b"state" | b"screen") {
        return Ok(());
    }

    let value = attribute(element, "value")?;
    match name {
        b"bounds" => {
            layout.bounds = match value.as_deref().map(str::parse::<Rect>) {
                Some(Ok(bounds)) => Some(bounds),
                Some(Err(error)) => {
                    warn!("Invalid 'bounds' value for key {key}: {error}");
                    None
                }
                None => {
                    warn!("'bounds' value for key {key} was not found.");
                    None
                }
            };
        }
        b"state" => {
            layout.state = match value.as_deref().map(str::parse::<WindowState>) {
                Some(Ok(state)) => Some(state),
                Some(Err(_)) => {
                    warn!("Invalid 'state' value for key {key}: {}", value.unwrap_or_default());
                    None
                }
                None => {
                    warn!("'state' value for key {key} was not found.");
                    None
                }
            };
        }
        _ => layout.screen = value,
    }
    Ok(())
}

type PendingRecord = Option<(Option<String>, FormLayoutData)>;

fn finish(table: &mut LayoutTable, record: PendingRecord) {
    match record {
        Some((Some(key), layout)) => {
            table.entry(key).or_insert(layout);
        }
        Some((None, _)) => warn!("Layout record without a key ignored"),
        None => {}
    }
}

/// Reads layout records. Records without a key are skipped, and the first record of a key wins.
///
/// # Errors
/// Returns [`Error::Xml`] if the markup cannot be parsed.
pub fn read_layouts(markup: &str) -> Result<LayoutTable> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().trim_text(true);

    let mut table = LayoutTable::new();
    let mut current: PendingRecord = None;

    loop {
        match reader.read_event()? {
            Event::Start(element) => match element.name().as_ref() {
                b"layout" => current = Some((attribute(&element, "key")?, FormLayoutData::default())),
                b"additionalData" => {
                    let raw = reader.read_text(element.name())?;
                    if let Some((_, layout)) = current.as_mut() {
                        let text = unescape(&raw).map_err(|error| Error::Xml(error.to_string()))?;
                        layout.additional_data = Some(text.into_owned());
                    }
                }
                _ => {
                    if let Some((key, layout)) = current.as_mut() {
                        apply_value(key.as_deref().unwrap_or_default(), &element, layout)?;
                    }
                }
            },
            Event::Empty(element) => match element.name().as_ref() {
                b"layout" => finish(
                    &mut table,
                    Some((attribute(&element, "key")?, FormLayoutData::default())),
                ),
                b"additionalData" => {
                    if let Some((_, layout)) = current.as_mut() {
                        layout.additional_data = Some(String::new());
                    }
                }
                _ => {
                    if let Some((key, layout)) = current.as_mut() {
                        apply_value(key.as_deref().unwrap_or_default(), &element, layout)?;
                    }
                }
            },
            Event::End(element) => {
                if element.name().as_ref() == b"layout" {
                    finish(&mut table, current.take());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(table)
}

fn write_value(writer: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<()> {
    let mut element = BytesStart::new(name);
    element.push_attribute(("value", value));
    writer.write_event(Event::Empty(element))?;
    Ok(())
}

/// Writes layout records in key order.
///
/// # Errors
/// Returns [`Error::Xml`] if the markup cannot be produced.
pub fn write_layouts(table: &LayoutTable) -> Result<String> {
    let mut writer = Writer::new(Vec::new());

    for (key, layout) in table {
        let mut element = BytesStart::new("layout");
        element.push_attribute(("key", key.as_str()));
        writer.write_event(Event::Start(element))?;

        if let Some(bounds) = layout.bounds {
            write_value(&mut writer, "bounds", &bounds.to_string())?;
        }
        if let Some(state) = layout.state {
            write_value(&mut writer, "state", &state.to_string())?;
        }
        if let Some(screen) = layout.screen.as_deref().filter(|screen| !screen.is_empty()) {
            write_value(&mut writer, "screen", screen)?;
        }
        if let Some(data) = &layout.additional_data {
            writer.write_event(Event::Start(BytesStart::new("additionalData")))?;
            writer.write_event(Event::Text(BytesText::new(data)))?;
            writer.write_event(Event::End(BytesEnd::new("additionalData")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("layout")))?;
    }

    String::from_utf8(writer.into_inner()).map_err(|error| Error::Xml(error.to_string()))
}
