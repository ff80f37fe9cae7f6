//! Alias and nickname tables. Loaded once at startup and shared read-only by every resolver.
//!
//! Both files are flat JSON objects. Key order is kept as written: resolution breaks ties by
//! taking the first candidate in table order, so iteration order is part of the behavior.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Result, StarforgeError};
use crate::resolve::names::normalize_name;

pub const DEFAULT_ALIASES_PATH: &str = "data/lookup/aliases.json";
pub const DEFAULT_NICKNAMES_PATH: &str = "data/lookup/nickname-map.json";

/// One display string (usually with a trailing point cost) and the card it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub display: String,
    pub canonical_id: String,
    normalized: String,
}

impl AliasEntry {
    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

/// Display string -> canonical ID. Many display strings may share one ID.
#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    entries: Vec<AliasEntry>,
    by_display: HashMap<String, usize>,
    by_canonical: HashMap<String, Vec<usize>>,
}

impl AliasMap {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = AliasMap::default();
        for (display, canonical_id) in pairs {
            map.insert(display.into(), canonical_id.into());
        }
        map
    }

    fn insert(&mut self, display: String, canonical_id: String) {
        if let Some(&index) = self.by_display.get(&display) {
            // Later duplicate keys win, as with a JSON object; position stays put.
            let old = std::mem::replace(&mut self.entries[index].canonical_id, canonical_id.clone());
            if let Some(ids) = self.by_canonical.get_mut(&old) {
                ids.retain(|&i| i != index);
            }
            self.by_canonical.entry(canonical_id).or_default().push(index);
            return;
        }
        let index = self.entries.len();
        self.entries.push(AliasEntry {
            normalized: normalize_name(&display),
            display: display.clone(),
            canonical_id: canonical_id.clone(),
        });
        self.by_display.insert(display, index);
        self.by_canonical.entry(canonical_id).or_default().push(index);
    }

    pub fn from_json_str(raw: &str, source: &str) -> Result<Self> {
        let object = parse_object(raw, source)?;
        let mut pairs = Vec::with_capacity(object.len());
        for (display, value) in object {
            let Value::String(canonical_id) = value else {
                return Err(StarforgeError::LookupShape {
                    path: source.to_string(),
                    message: format!("alias '{display}' must map to a string canonical id"),
                });
            };
            pairs.push((display, canonical_id));
        }
        Ok(Self::from_pairs(pairs))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = read_table(path)?;
        Self::from_json_str(&raw, &path.display().to_string())
    }

    pub fn canonical_id(&self, display: &str) -> Option<&str> {
        self.by_display
            .get(display)
            .map(|&index| self.entries[index].canonical_id.as_str())
    }

    /// Every display string for a canonical ID, in table order.
    pub fn displays_for<'a>(&'a self, canonical_id: &str) -> impl Iterator<Item = &'a AliasEntry> + 'a {
        self.by_canonical
            .get(canonical_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(move |&index| &self.entries[index])
    }

    pub fn entries(&self) -> &[AliasEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NicknameTarget {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NicknameEntry {
    pub nickname: String,
    pub canonical_ids: Vec<String>,
}

/// Informal name -> ordered canonical IDs (ambiguous by nature).
#[derive(Debug, Clone, Default)]
pub struct NicknameMap {
    entries: Vec<NicknameEntry>,
    exact: HashMap<String, usize>,
    normalized: HashMap<String, usize>,
}

impl NicknameMap {
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<String>)>,
        K: Into<String>,
    {
        let mut map = NicknameMap::default();
        for (nickname, canonical_ids) in entries {
            let nickname = nickname.into();
            let index = map.entries.len();
            map.exact.insert(nickname.clone(), index);
            // First nickname in table order owns a normalized key.
            map.normalized.entry(normalize_name(&nickname)).or_insert(index);
            map.entries.push(NicknameEntry {
                nickname,
                canonical_ids,
            });
        }
        map
    }

    pub fn from_json_str(raw: &str, source: &str) -> Result<Self> {
        let object = parse_object(raw, source)?;
        let mut entries = Vec::with_capacity(object.len());
        for (nickname, value) in object {
            let target: NicknameTarget =
                serde_json::from_value(value).map_err(|_| StarforgeError::LookupShape {
                    path: source.to_string(),
                    message: format!(
                        "nickname '{nickname}' must map to a string or a list of strings"
                    ),
                })?;
            let ids = match target {
                NicknameTarget::One(id) => vec![id],
                NicknameTarget::Many(ids) => ids,
            };
            entries.push((nickname, ids));
        }
        Ok(Self::from_entries(entries))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = read_table(path)?;
        Self::from_json_str(&raw, &path.display().to_string())
    }

    /// Exact key first, then case/whitespace-insensitive.
    pub fn lookup(&self, name: &str) -> Option<&[String]> {
        let index = self
            .exact
            .get(name)
            .or_else(|| self.normalized.get(&normalize_name(name)))?;
        Some(&self.entries[*index].canonical_ids)
    }

    pub fn entries(&self) -> &[NicknameEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Both tables together; what a resolver is built from.
#[derive(Debug, Clone, Default)]
pub struct LookupTables {
    pub aliases: AliasMap,
    pub nicknames: NicknameMap,
}

impl LookupTables {
    pub fn new(aliases: AliasMap, nicknames: NicknameMap) -> Self {
        Self { aliases, nicknames }
    }

    pub fn load(aliases_path: impl AsRef<Path>, nicknames_path: impl AsRef<Path>) -> Result<Self> {
        let aliases = AliasMap::load(aliases_path)?;
        let nicknames = NicknameMap::load(nicknames_path)?;
        tracing::info!(
            aliases = aliases.len(),
            nicknames = nicknames.len(),
            "lookup tables loaded"
        );
        Ok(Self { aliases, nicknames })
    }
}

fn read_table(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| StarforgeError::LookupRead {
        path: path.display().to_string(),
        source,
    })
}

fn parse_object(raw: &str, source: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(raw).map_err(|err| StarforgeError::LookupParse {
        path: source.to_string(),
        source: err,
    })?;
    match value {
        Value::Object(object) => Ok(object),
        _ => Err(StarforgeError::LookupShape {
            path: source.to_string(),
            message: "expected a top-level JSON object".to_string(),
        }),
    }
}
