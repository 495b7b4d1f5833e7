use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{LazyLock, Mutex};

/// Global string interner for ids: fast comparisons, low memory.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Per-prefix counters for minted ids (`shape_0`, `shape_1`, `text_0`, ...).
static COUNTERS: LazyLock<Mutex<HashMap<String, u64>>> = LazyLock::new(Default::default);

/// Fallback counter when the per-prefix table is poisoned.
static FALLBACK: AtomicU64 = AtomicU64::new(0);

fn next_for(prefix: &str) -> u64 {
    match COUNTERS.lock() {
        Ok(mut counters) => {
            let n = counters.entry(prefix.to_string()).or_insert(0);
            let current = *n;
            *n += 1;
            current
        }
        Err(_) => FALLBACK.fetch_add(1, Ordering::Relaxed),
    }
}

/// Mint an id string that is not yet interned.
///
/// Interning is process-wide, so a string that was ever seen (a layer id
/// from a loaded document, a previously minted id) is skipped.
fn mint(prefix: &str) -> Spur {
    loop {
        let candidate = format!("{prefix}_{}", next_for(prefix));
        if INTERNER.get(&candidate).is_none() {
            return INTERNER.get_or_intern(candidate);
        }
    }
}

/// A lightweight, interned identifier for layers in a document.
/// Internally a `Spur` index: 4 bytes, Copy, Eq, Hash in O(1).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(Spur);

impl LayerId {
    /// Intern a string as a LayerId, or return existing if already interned.
    pub fn intern(s: &str) -> Self {
        LayerId(INTERNER.get_or_intern(s))
    }

    /// The id for `s` if it was ever interned. Does not intern, so
    /// probing with untrusted strings leaves the interner untouched.
    pub fn lookup(s: &str) -> Option<Self> {
        INTERNER.get(s).map(LayerId)
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Mint a fresh id with a kind prefix (e.g. `shape_1`, `text_2`).
    pub fn fresh(prefix: &str) -> Self {
        LayerId(mint(prefix))
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LayerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LayerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(LayerId::intern(&s))
    }
}

/// Identifier of a whole document.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(Spur);

impl DocumentId {
    pub fn intern(s: &str) -> Self {
        DocumentId(INTERNER.get_or_intern(s))
    }

    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    pub fn fresh() -> Self {
        DocumentId(mint("doc"))
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc:{}", self.as_str())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(DocumentId::intern(&s))
    }
}
