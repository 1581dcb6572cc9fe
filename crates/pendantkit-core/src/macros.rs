//! Macro file model and validation
//!
//! The macro file is a YAML mapping of `Macro-N` keycap names to macro
//! definitions. A definition carries a human-readable description, an
//! optional G-code line to stream, and optional `before`/`after` strings
//! of whitespace-separated magic-command names that bracket the stream.
//!
//! Loading is forgiving by contract: entries with bad names, out-of-range
//! numbers, or unknown magic references are logged and skipped, never
//! fatal. Only an unreadable or unparsable file is an error.

use crate::error::MacroError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Number of macro keycaps on the pendant (`Macro-1` .. `Macro-10`).
pub const MAX_MACROS: usize = 10;

/// Raw macro entry as it appears in the YAML file.
#[derive(Debug, Clone, Deserialize)]
struct MacroEntry {
    description: String,
    #[serde(default)]
    commands: Option<String>,
    #[serde(default)]
    before: Option<String>,
    #[serde(default)]
    after: Option<String>,
}

/// A validated macro bound to one `Macro-N` keycap.
#[derive(Debug, Clone, Serialize)]
pub struct Macro {
    /// Human-readable description, logged when the macro fires.
    pub description: String,
    /// Optional single G-code line streamed between the magic lists.
    pub commands: Option<String>,
    /// Magic commands run before the G-code line.
    pub before: Vec<String>,
    /// Magic commands run after the G-code line.
    pub after: Vec<String>,
}

/// The loaded macro table, indexed by macro number 1..=10.
#[derive(Debug)]
pub struct MacroSet {
    slots: Vec<Option<Macro>>,
}

impl Default for MacroSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// Parse a `Macro-N` keycap name into its number.
pub fn parse_macro_number(name: &str) -> Option<u8> {
    name.strip_prefix("Macro-")?.parse::<u8>().ok()
}

impl MacroSet {
    /// An empty set with no macros bound.
    pub fn empty() -> Self {
        Self {
            slots: vec![None; MAX_MACROS + 1],
        }
    }

    /// Load and validate a macro file.
    ///
    /// `magic_names` is the set of magic-command names the coordinator can
    /// execute; `before`/`after` references outside it are dropped with a
    /// warning.
    pub fn load(path: &Path, magic_names: &[&str]) -> Result<Self, MacroError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text, magic_names)
    }

    /// Parse a macro file from YAML text. An empty document loads as an
    /// empty set.
    pub fn from_yaml(text: &str, magic_names: &[&str]) -> Result<Self, MacroError> {
        let entries: BTreeMap<String, MacroEntry> =
            serde_yaml::from_str::<Option<_>>(text)?.unwrap_or_default();
        let mut set = Self::empty();

        for (name, entry) in entries {
            let num = match parse_macro_number(&name) {
                Some(n) => n,
                None => {
                    warn!("Invalid macro name '{}': ignoring", name);
                    continue;
                }
            };
            if num == 0 || num as usize > MAX_MACROS {
                warn!("Macro number {} out of range 1..={}: ignoring", num, MAX_MACROS);
                continue;
            }

            let before = split_magic(&name, "before", entry.before.as_deref(), magic_names);
            let after = split_magic(&name, "after", entry.after.as_deref(), magic_names);

            set.slots[num as usize] = Some(Macro {
                description: entry.description,
                commands: entry.commands,
                before,
                after,
            });
        }

        Ok(set)
    }

    /// Look up the macro bound to `Macro-<num>`.
    pub fn get(&self, num: u8) -> Option<&Macro> {
        self.slots.get(num as usize).and_then(|slot| slot.as_ref())
    }

    /// Number of bound macros.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bound macros keyed by their keycap name, for startup reporting.
    pub fn to_named_map(&self) -> BTreeMap<String, &Macro> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(num, slot)| {
                slot.as_ref().map(|m| (format!("Macro-{}", num), m))
            })
            .collect()
    }
}

/// Split a `before`/`after` string into validated magic-command names.
fn split_magic(
    macro_name: &str,
    field: &str,
    value: Option<&str>,
    magic_names: &[&str],
) -> Vec<String> {
    let Some(value) = value else {
        return Vec::new();
    };
    value
        .split_whitespace()
        .filter(|name| {
            let known = magic_names.contains(name);
            if !known {
                warn!(
                    "{}: unknown magic command '{}' in '{}' list: ignoring",
                    macro_name, name, field
                );
            }
            known
        })
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MAGIC: &[&str] = &["VIEW_PARSER", "STATUS", "RESET"];

    #[test]
    fn test_parse_macro_number() {
        assert_eq!(parse_macro_number("Macro-1"), Some(1));
        assert_eq!(parse_macro_number("Macro-10"), Some(10));
        assert_eq!(parse_macro_number("macro-1"), None);
        assert_eq!(parse_macro_number("Macro-x"), None);
        assert_eq!(parse_macro_number("Reset"), None);
    }

    #[test]
    fn test_from_yaml_full_entry() {
        let yaml = r#"
Macro-1:
  description: park the spindle
  commands: G0 X0 Y0
  before: VIEW_PARSER
  after: STATUS RESET
"#;
        let set = MacroSet::from_yaml(yaml, MAGIC).unwrap();
        let m = set.get(1).unwrap();
        assert_eq!(m.description, "park the spindle");
        assert_eq!(m.commands.as_deref(), Some("G0 X0 Y0"));
        assert_eq!(m.before, vec!["VIEW_PARSER"]);
        assert_eq!(m.after, vec!["STATUS", "RESET"]);
    }

    #[test]
    fn test_from_yaml_commands_optional() {
        let yaml = r#"
Macro-2:
  description: just a status ping
  after: STATUS
"#;
        let set = MacroSet::from_yaml(yaml, MAGIC).unwrap();
        let m = set.get(2).unwrap();
        assert!(m.commands.is_none());
        assert!(m.before.is_empty());
        assert_eq!(m.after, vec!["STATUS"]);
    }

    #[test]
    fn test_from_yaml_skips_bad_names_and_range() {
        let yaml = r#"
NotAMacro:
  description: wrong key
Macro-0:
  description: below range
Macro-11:
  description: above range
Macro-3:
  description: survives
"#;
        let set = MacroSet::from_yaml(yaml, MAGIC).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.get(3).is_some());
        assert!(set.get(0).is_none());
    }

    #[test]
    fn test_from_yaml_filters_unknown_magic() {
        let yaml = r#"
Macro-4:
  description: magic filter
  before: STATUS BOGUS VIEW_PARSER
"#;
        let set = MacroSet::from_yaml(yaml, MAGIC).unwrap();
        let m = set.get(4).unwrap();
        assert_eq!(m.before, vec!["STATUS", "VIEW_PARSER"]);
    }

    #[test]
    fn test_from_yaml_rejects_garbage() {
        assert!(MacroSet::from_yaml(": not yaml : [", MAGIC).is_err());
    }

    #[test]
    fn test_from_yaml_empty_document() {
        let set = MacroSet::from_yaml("", MAGIC).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Macro-5:\n  description: from disk\n  commands: M3").unwrap();
        let set = MacroSet::load(file.path(), MAGIC).unwrap();
        assert_eq!(set.get(5).unwrap().commands.as_deref(), Some("M3"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = MacroSet::load(Path::new("/nonexistent/whb04b.yml"), MAGIC);
        assert!(matches!(err, Err(MacroError::Io(_))));
    }

    #[test]
    fn test_named_map() {
        let yaml = "Macro-1:\n  description: one\nMacro-9:\n  description: nine\n";
        let set = MacroSet::from_yaml(yaml, MAGIC).unwrap();
        let map = set.to_named_map();
        assert_eq!(map.len(), 2);
        assert!(map.contains_key("Macro-1"));
        assert!(map.contains_key("Macro-9"));
    }
}
