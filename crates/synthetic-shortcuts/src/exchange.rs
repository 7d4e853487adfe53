//! Text formats used to persist a [`ShortcutRegistry`].
//!
//! XML follows the layout of the host's keyboard shortcut export:
//!
//! ```xml
//! <Shortcuts>
//!   <ShortcutItem CommandName="Save" CommandId="ID_FILE_SAVE" Shortcuts="CTRL+S" Paths="File"/>
//! </Shortcuts>
//! ```
//!
//! JSON stores the same four fields per entry with the shortcuts as a list.

use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Writer;
use roxmltree::{Document, Node};
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use synthetic_store::KeyValueStore;
use thiserror::Error;
use tracing::{debug, warn};

use crate::entry::{ShortcutEntry, DEFAULT_SEPARATOR};
use crate::registry::ShortcutRegistry;

const ROOT_TAG: &str = "Shortcuts";
const ITEM_TAG: &str = "ShortcutItem";
const ATTR_COMMAND_NAME: &str = "CommandName";
const ATTR_COMMAND_ID: &str = "CommandId";
const ATTR_SHORTCUTS: &str = "Shortcuts";
const ATTR_PATHS: &str = "Paths";

/// Errors raised while reading or writing shortcut files.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("I/O error accessing {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse shortcut XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("Failed to write shortcut XML: {0}")]
    XmlWrite(String),
    #[error("Failed to process shortcut JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ShortcutItem at line {line} is missing the {attribute} attribute")]
    MissingAttribute { line: u32, attribute: &'static str },
}

pub type Result<T> = std::result::Result<T, ExchangeError>;

/// Concrete syntax of a shortcut file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangeFormat {
    #[default]
    Xml,
    Json,
}

impl ExchangeFormat {
    /// Pick the format from the file extension; anything but `.json` is XML.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Xml,
        }
    }
}

/// Formatting knobs for the XML writer and the shortcut string parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeOptions {
    pub separator: char,
    pub indent: usize,
    pub declaration: bool,
}

impl Default for ExchangeOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            indent: 2,
            declaration: false,
        }
    }
}

impl ShortcutRegistry {
    pub fn serialize(&self, format: ExchangeFormat, options: &ExchangeOptions) -> Result<String> {
        match format {
            ExchangeFormat::Xml => self.to_xml_string(options),
            ExchangeFormat::Json => self.to_json_string(),
        }
    }

    pub fn deserialize(
        source: &str,
        format: ExchangeFormat,
        options: &ExchangeOptions,
    ) -> Result<Self> {
        match format {
            ExchangeFormat::Xml => Self::from_xml_str(source, options),
            ExchangeFormat::Json => Self::from_json_str(source),
        }
    }

    pub fn to_xml_string(&self, options: &ExchangeOptions) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', options.indent);
        if options.declaration {
            write_event(
                &mut writer,
                Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
            )?;
        }

        if self.is_empty() {
            write_event(&mut writer, Event::Empty(BytesStart::new(ROOT_TAG)))?;
        } else {
            write_event(&mut writer, Event::Start(BytesStart::new(ROOT_TAG)))?;
            for entry in self.entries() {
                let mut item = BytesStart::new(ITEM_TAG);
                item.push_attribute(attribute(ATTR_COMMAND_NAME, &entry.command_name));
                item.push_attribute(attribute(ATTR_COMMAND_ID, &entry.command_id));
                if let Some(shortcuts) = entry.shortcut_string_with(options.separator) {
                    item.push_attribute(attribute(ATTR_SHORTCUTS, &shortcuts));
                }
                item.push_attribute(attribute(ATTR_PATHS, &entry.paths));
                write_event(&mut writer, Event::Empty(item))?;
            }
            write_event(&mut writer, Event::End(BytesEnd::new(ROOT_TAG)))?;
        }

        let mut out = String::from_utf8(writer.into_inner())
            .map_err(|err| ExchangeError::XmlWrite(err.to_string()))?;
        out.push('\n');
        Ok(out)
    }

    pub fn from_xml_str(source: &str, options: &ExchangeOptions) -> Result<Self> {
        let document = Document::parse(source)?;
        let root = document.root_element();
        if root.tag_name().name() != ROOT_TAG {
            warn!(root = root.tag_name().name(), "unexpected root element in shortcut XML");
        }

        let mut entries = Vec::new();
        for node in root.children().filter(Node::is_element) {
            if node.tag_name().name() != ITEM_TAG {
                warn!(element = node.tag_name().name(), "skipping unknown element");
                continue;
            }
            entries.push(read_item(&document, node, options.separator)?);
        }

        debug!(entries = entries.len(), "parsed shortcut XML");
        Ok(Self::from_entries(entries))
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        let registry: Self = serde_json::from_str(source)?;
        debug!(entries = registry.len(), "parsed shortcut JSON");
        Ok(registry)
    }

    /// Read a shortcut file, choosing the format from its extension.
    pub fn load_from_file(path: impl AsRef<Path>, options: &ExchangeOptions) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ExchangeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::deserialize(&contents, ExchangeFormat::from_path(path), options)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>, options: &ExchangeOptions) -> Result<()> {
        let path = path.as_ref();
        let contents = self.serialize(ExchangeFormat::from_path(path), options)?;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ExchangeError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, contents).map_err(|source| ExchangeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), entries = self.len(), "saved shortcut registry");
        Ok(())
    }
}

fn read_item(
    document: &Document<'_>,
    node: Node<'_, '_>,
    separator: char,
) -> Result<ShortcutEntry> {
    let attributes: KeyValueStore<String> = node
        .attributes()
        .map(|attribute| (attribute.name().to_string(), attribute.value().to_string()))
        .collect();

    let command_name = attributes
        .get(ATTR_COMMAND_NAME)
        .ok_or_else(|| ExchangeError::MissingAttribute {
            line: document.text_pos_at(node.range().start).row,
            attribute: ATTR_COMMAND_NAME,
        })?;
    let text = |name: &str| attributes.get(name).cloned().unwrap_or_default();

    Ok(ShortcutEntry::with_separator(
        command_name.as_str(),
        text(ATTR_COMMAND_ID),
        attributes.get(ATTR_SHORTCUTS).map(String::as_str),
        text(ATTR_PATHS),
        separator,
    ))
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|err| ExchangeError::XmlWrite(err.to_string()))
}

/// Escaped attribute; whitespace controls become character references so
/// attribute value normalization on read leaves them intact.
fn attribute<'a>(name: &'a str, value: &str) -> Attribute<'a> {
    let escaped = escape(value)
        .replace('\n', "&#10;")
        .replace('\r', "&#13;")
        .replace('\t', "&#9;");
    Attribute {
        key: QName(name.as_bytes()),
        value: Cow::Owned(escaped.into_bytes()),
    }
}
