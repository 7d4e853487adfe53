//! Keyboard shortcut bindings: per-command entries, the registry that holds
//! them, comparison between two registries, and the file formats they are
//! exchanged in.

pub mod entry;
pub mod exchange;
pub mod registry;

pub use entry::{parse_shortcuts, ShortcutEntry, DEFAULT_SEPARATOR, NO_SHORTCUT};
pub use exchange::{ExchangeError, ExchangeFormat, ExchangeOptions};
pub use registry::{compare, Comparison, ShortcutIndex, ShortcutRegistry};
