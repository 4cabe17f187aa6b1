//! File-backed allow-list of senders permitted to use restricted
//! commands.
//!
//! Entries are either literal Matrix user ids or regex patterns. A
//! pattern matches the whole sender id (anchored); an entry that is
//! not a valid regex falls back to literal comparison.

use std::{collections::BTreeSet, path::PathBuf};

use {
    anyhow::Result,
    regex::Regex,
    serde::{Deserialize, Serialize},
    tracing::debug,
};

#[derive(Debug, Default, Serialize, Deserialize)]
struct AllowlistFile {
    #[serde(default)]
    allowlist: Vec<String>,
}

/// One entry, compiled once when the set changes.
#[derive(Debug)]
enum Matcher {
    Pattern(Regex),
    Literal(String),
}

impl Matcher {
    fn compile(entry: &str) -> Self {
        match Regex::new(&format!("^(?:{entry})$")) {
            Ok(re) => Self::Pattern(re),
            Err(_) => Self::Literal(entry.to_owned()),
        }
    }

    fn matches(&self, sender: &str) -> bool {
        match self {
            Self::Pattern(re) => re.is_match(sender),
            Self::Literal(lit) => lit == sender,
        }
    }
}

/// Set of allow-list entries, persisted as a small TOML file.
#[derive(Debug)]
pub struct Allowlist {
    path: PathBuf,
    entries: BTreeSet<String>,
    matchers: Vec<Matcher>,
}

impl Allowlist {
    /// Load the allow-list from `path`, writing a default (empty) file
    /// if none exists yet.
    pub fn load(path: PathBuf) -> Result<Self> {
        let entries: BTreeSet<String> = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let file: AllowlistFile = toml::from_str(&raw)?;
            file.allowlist.into_iter().collect()
        } else {
            debug!(path = %path.display(), "no allowlist file, creating default");
            let list = Self {
                path: path.clone(),
                entries: BTreeSet::new(),
                matchers: Vec::new(),
            };
            list.save()?;
            return Ok(list);
        };
        let matchers = compile_all(&entries);
        Ok(Self {
            path,
            entries,
            matchers,
        })
    }

    /// Persist the current state.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = AllowlistFile {
            allowlist: self.entries.iter().cloned().collect(),
        };
        std::fs::write(&self.path, toml::to_string_pretty(&file)?)?;
        Ok(())
    }

    /// Whether `sender` matches any entry, literally or as an anchored
    /// regex.
    pub fn contains(&self, sender: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(sender))
    }

    /// Add entries; returns the ones that were not already present.
    pub fn add(&mut self, entries: impl IntoIterator<Item = String>) -> BTreeSet<String> {
        let added: BTreeSet<String> = entries
            .into_iter()
            .filter(|e| self.entries.insert(e.clone()))
            .collect();
        if !added.is_empty() {
            self.matchers = compile_all(&self.entries);
        }
        added
    }

    /// Remove entries; returns the ones that were actually present.
    pub fn remove(&mut self, entries: impl IntoIterator<Item = String>) -> BTreeSet<String> {
        let removed: BTreeSet<String> = entries
            .into_iter()
            .filter(|e| self.entries.remove(e))
            .collect();
        if !removed.is_empty() {
            self.matchers = compile_all(&self.entries);
        }
        removed
    }

    pub fn entries(&self) -> &BTreeSet<String> {
        &self.entries
    }
}

fn compile_all(entries: &BTreeSet<String>) -> Vec<Matcher> {
    entries.iter().map(|e| Matcher::compile(e)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_list(dir: &tempfile::TempDir) -> Allowlist {
        Allowlist::load(dir.path().join("allowlist.toml")).unwrap()
    }

    #[test]
    fn creates_default_file_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("allowlist.toml");
        let list = Allowlist::load(path.clone()).unwrap();
        assert!(path.exists());
        assert!(list.entries().is_empty());
    }

    #[test]
    fn literal_and_regex_matching() {
        let dir = tempfile::tempdir().unwrap();
        let mut list = empty_list(&dir);
        list.add([
            "@alice:example.org".to_string(),
            "@.*:staff\\.example\\.org".to_string(),
        ]);

        assert!(list.contains("@alice:example.org"));
        assert!(list.contains("@bob:staff.example.org"));
        // Anchored: no substring matches.
        assert!(!list.contains("@alice:example.org.evil.com"));
        assert!(!list.contains("@mallory:example.org"));
    }

    #[test]
    fn invalid_pattern_falls_back_to_literal() {
        let dir = tempfile::tempdir().unwrap();
        let mut list = empty_list(&dir);
        list.add(["@weird[:example.org".to_string()]);
        assert!(list.contains("@weird[:example.org"));
        assert!(!list.contains("@other:example.org"));
    }

    #[test]
    fn add_and_remove_report_changes() {
        let dir = tempfile::tempdir().unwrap();
        let mut list = empty_list(&dir);

        let added = list.add(["a".to_string(), "b".to_string(), "a".to_string()]);
        assert_eq!(added.len(), 2);
        // Duplicates collapse.
        let added_again = list.add(["a".to_string()]);
        assert!(added_again.is_empty());

        let removed = list.remove(["a".to_string(), "zzz".to_string()]);
        assert_eq!(removed.into_iter().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn matching_tracks_additions_and_removals() {
        let dir = tempfile::tempdir().unwrap();
        let mut list = empty_list(&dir);

        assert!(!list.contains("@alice:staff.example.org"));
        list.add(["@.*:staff\\.example\\.org".to_string()]);
        assert!(list.contains("@alice:staff.example.org"));

        list.remove(["@.*:staff\\.example\\.org".to_string()]);
        assert!(!list.contains("@alice:staff.example.org"));
    }

    #[test]
    fn persists_and_reloads_membership() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("allowlist.toml");
        {
            let mut list = Allowlist::load(path.clone()).unwrap();
            list.add(["@alice:example.org".to_string(), "@bob:example.org".to_string()]);
            list.save().unwrap();
        }
        let reloaded = Allowlist::load(path).unwrap();
        assert_eq!(reloaded.entries().len(), 2);
        assert!(reloaded.contains("@alice:example.org"));
        assert!(reloaded.contains("@bob:example.org"));
    }
}
