//! Argument normalization helpers kept for older callers
//!
//! Both functions are pure: they take everything explicitly and hand back
//! the resolved value. The only side effect is a `tracing` warning when a
//! deprecated spelling is used.

use std::collections::HashMap;
use std::fmt;

use tracing::warn;

/// A name or path that may arrive as text or as raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedArg {
    Text(String),
    Bytes(Vec<u8>),
}

impl EncodedArg {
    /// Decode to text; invalid UTF-8 sequences become U+FFFD
    pub fn into_text(self) -> String {
        match self {
            EncodedArg::Text(text) => text,
            EncodedArg::Bytes(bytes) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
            },
        }
    }
}

impl From<&str> for EncodedArg {
    fn from(s: &str) -> Self {
        EncodedArg::Text(s.to_string())
    }
}

impl From<String> for EncodedArg {
    fn from(s: String) -> Self {
        EncodedArg::Text(s)
    }
}

impl From<&[u8]> for EncodedArg {
    fn from(b: &[u8]) -> Self {
        EncodedArg::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for EncodedArg {
    fn from(b: Vec<u8>) -> Self {
        EncodedArg::Bytes(b)
    }
}

/// Module search path: one entry or a list of entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPath<T> {
    Single(T),
    List(Vec<T>),
}

/// A module lookup with every argument decoded to text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleQuery {
    pub name: String,
    pub path: Option<SearchPath<String>>,
}

/// Decode a module lookup's name and search path to text
///
/// The shape of `path` is preserved: a single entry stays single and a list
/// stays a list with each element decoded independently.
pub fn normalize_module_query(
    name: impl Into<EncodedArg>,
    path: Option<SearchPath<EncodedArg>>,
) -> ModuleQuery {
    let path = path.map(|path| match path {
        SearchPath::Single(entry) => SearchPath::Single(entry.into_text()),
        SearchPath::List(entries) => {
            SearchPath::List(entries.into_iter().map(EncodedArg::into_text).collect())
        }
    });

    ModuleQuery {
        name: name.into().into_text(),
        path,
    }
}

/// A boolean option that used to be spelled differently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyFlag {
    /// Old option name, looked up in the caller's option map
    pub key: &'static str,
    /// Name callers should use instead
    pub replacement: &'static str,
}

/// The `async` keyword, renamed to `async_`
pub const ASYNC_FLAG: LegacyFlag = LegacyFlag {
    key: "async",
    replacement: "async_",
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeprecationNotice {
    pub legacy: &'static str,
    pub replacement: &'static str,
}

impl fmt::Display for DeprecationNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\" attribute is deprecated. Use \"{}\" instead.",
            self.legacy, self.replacement
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFlag {
    pub value: bool,
    pub notice: Option<DeprecationNotice>,
}

/// Pick a flag value from the primary parameter or its legacy spelling
///
/// `primary` wins when set and leaves `options` untouched. Otherwise the
/// legacy key is removed from `options` and used, with a notice. Failing
/// both, `default` is returned.
pub fn resolve_deprecated_flag(
    flag: &LegacyFlag,
    primary: Option<bool>,
    options: &mut HashMap<String, bool>,
    default: bool,
) -> ResolvedFlag {
    if let Some(value) = primary {
        return ResolvedFlag {
            value,
            notice: None,
        };
    }

    match options.remove(flag.key) {
        Some(value) => {
            let notice = DeprecationNotice {
                legacy: flag.key,
                replacement: flag.replacement,
            };
            warn!("{}", notice);
            ResolvedFlag {
                value,
                notice: Some(notice),
            }
        }
        None => ResolvedFlag {
            value: default,
            notice: None,
        },
    }
}
