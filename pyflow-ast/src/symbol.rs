//! Symbol interning for identifiers
//!
//! Names are compared constantly during scope lookups, so every identifier in
//! the tree is interned once and compared as an integer afterwards. Ordering
//! follows the string contents so that ordered maps keyed by symbols iterate
//! the same way regardless of interning order.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, OnceLock};

/// Interned string symbol
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(u32);

impl Symbol {
    /// Intern a string and return its symbol
    pub fn intern(s: &str) -> Self {
        GlobalInterner::get().with_mut(|interner| interner.intern(s))
    }

    /// Get the string representation of this symbol
    pub fn as_str(self) -> &'static str {
        GlobalInterner::get().with(|interner| interner.resolve(self))
    }

    /// Get the raw symbol ID
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Python-style "private" names start with an underscore
    pub fn is_private(self) -> bool {
        self.as_str().starts_with('_')
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.0 == other.0 {
            Ordering::Equal
        } else {
            self.as_str().cmp(other.as_str())
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::intern(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Symbol::intern(&s)
    }
}

// Serialized trees carry names as plain strings.
impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Symbol::intern(&s))
    }
}

struct SymbolInterner {
    symbols: Vec<&'static str>,
    indices: HashMap<&'static str, u32>,
}

impl SymbolInterner {
    fn new() -> Self {
        SymbolInterner {
            symbols: Vec::new(),
            indices: HashMap::new(),
        }
    }

    fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&index) = self.indices.get(s) {
            return Symbol(index);
        }
        // Interned names live for the whole process.
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let index = self.symbols.len() as u32;
        self.symbols.push(leaked);
        self.indices.insert(leaked, index);
        Symbol(index)
    }

    fn resolve(&self, symbol: Symbol) -> &'static str {
        self.symbols.get(symbol.0 as usize).copied().unwrap_or("")
    }
}

struct GlobalInterner {
    inner: Mutex<SymbolInterner>,
}

impl GlobalInterner {
    fn get() -> &'static GlobalInterner {
        static INTERNER: OnceLock<GlobalInterner> = OnceLock::new();
        INTERNER.get_or_init(|| GlobalInterner {
            inner: Mutex::new(SymbolInterner::new()),
        })
    }

    fn with_mut<R>(&self, f: impl FnOnce(&mut SymbolInterner) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    fn with<R>(&self, f: impl FnOnce(&SymbolInterner) -> R) -> R {
        let guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&guard)
    }
}

/// Names the analyzer looks up by identity
pub mod names {
    use super::Symbol;
    use std::sync::OnceLock;

    macro_rules! define_names {
        ($($name:ident = $value:literal),* $(,)?) => {
            $(
                #[allow(non_snake_case)]
                pub fn $name() -> Symbol {
                    static SYMBOL: OnceLock<Symbol> = OnceLock::new();
                    *SYMBOL.get_or_init(|| Symbol::intern($value))
                }
            )*
        };
    }

    define_names! {
        INIT = "__init__",
        ITER = "__iter__",
        ENTER = "__enter__",
        GETITEM = "__getitem__",
        CALL = "__call__",
        GETSLICE = "__getslice__",
        ALL = "__all__",
        SLOTS = "__slots__",
        BASES = "__bases__",
        NAME = "__name__",
        DICT = "__dict__",
        MODULE = "__module__",
        DOC = "__doc__",
        FILE = "__file__",
        SELF_ATTR = "__self__",
        CLASS_ATTR = "__class__",
        IM_SELF = "im_self",
        IM_CLASS = "im_class",
        SELF = "self",
    }
}
