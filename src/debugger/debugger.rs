use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::{IdentifierKind, QueryError, QueryResult};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl DebugLevel {
    pub fn by_name(name: &str) -> QueryResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(DebugLevel::Off),
            "error" => Ok(DebugLevel::Error),
            "warn" | "warning" => Ok(DebugLevel::Warn),
            "info" => Ok(DebugLevel::Info),
            "debug" => Ok(DebugLevel::Debug),
            "trace" => Ok(DebugLevel::Trace),
            _ => Err(QueryError::unknown(IdentifierKind::DebugLevel, name)),
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => DebugLevel::Off,
            1 => DebugLevel::Error,
            2 => DebugLevel::Warn,
            3 => DebugLevel::Info,
            4 => DebugLevel::Debug,
            _ => DebugLevel::Trace,
        }
    }
}

/// Subsystem tag printed with every diagnostic line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Component {
    Convert,
    Catalog,
    Scan,
    Pipeline,
    Join,
    Pivot,
    Sort,
    Export,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Component::Convert => "convert",
            Component::Catalog => "catalog",
            Component::Scan => "scan",
            Component::Pipeline => "pipeline",
            Component::Join => "join",
            Component::Pivot => "pivot",
            Component::Sort => "sort",
            Component::Export => "export",
        };
        f.write_str(s)
    }
}

pub static DEBUG_LEVEL: AtomicU8 = AtomicU8::new(DebugLevel::Warn as u8);

thread_local! {
    static INDENT: Cell<usize> = const { Cell::new(0) };
}

pub fn set_debug_level(level: DebugLevel) {
    DEBUG_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn get_debug_level() -> DebugLevel {
    DebugLevel::from_u8(DEBUG_LEVEL.load(Ordering::Relaxed))
}

#[inline]
pub fn should_log(level: DebugLevel) -> bool {
    level != DebugLevel::Off && level <= get_debug_level()
}

pub fn indent() {
    INDENT.with(|i| i.set(i.get() + 1));
}

pub fn dedent() {
    INDENT.with(|i| i.set(i.get().saturating_sub(1)));
}

pub fn format_indent() -> String {
    INDENT.with(|i| "  ".repeat(i.get()))
}

pub mod color {
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const GREEN: &str = "\x1b[32m";
    pub const BLUE: &str = "\x1b[34m";
    pub const GRAY: &str = "\x1b[90m";
    pub const RESET: &str = "\x1b[0m";
}
