//! Section indexer for extracted knowledge-base text.
//!
//! Splits the plain text of the safety guide into [`Section`]s delimited by
//! bracketed header lines (`[Lost Passport]`) and stores them in a
//! [`SectionIndex`] keyed by the normalized header.
//!
//! # Parsing Rules
//!
//! 1. Split on `\n`, trim every line, drop lines that are empty after trimming.
//! 2. A line starting with `[` and ending with `]` opens a new section.
//! 3. Other lines are appended to the open section. Lines before the first
//!    header are discarded.
//! 4. A section is committed only if it has at least one content line.
//! 5. Duplicate keys overwrite the earlier text but keep its position.

use std::collections::HashMap;

/// A labeled block of guidance text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Normalized header: brackets removed, lowercased, trimmed.
    pub key: String,
    /// Original header line followed by the content lines, newline-joined.
    pub text: String,
}

/// Insertion-ordered mapping from section key to section text.
///
/// Iteration order is the order in which each key was first committed.
/// The resolver's tie-breaking depends on this order.
#[derive(Debug, Clone, Default)]
pub struct SectionIndex {
    sections: Vec<Section>,
    positions: HashMap<String, usize>,
}

impl SectionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Returns the section text stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.positions
            .get(key)
            .map(|&pos| self.sections[pos].text.as_str())
    }

    /// Iterates sections in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.key.as_str())
    }

    fn insert(&mut self, key: String, text: String) {
        match self.positions.get(&key) {
            Some(&pos) => self.sections[pos].text = text,
            None => {
                self.positions.insert(key.clone(), self.sections.len());
                self.sections.push(Section { key, text });
            }
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SectionIndex {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut index = SectionIndex::new();
        for (key, text) in iter {
            index.insert(key.into(), text.into());
        }
        index
    }
}

/// Returns true if a trimmed line is a section header.
pub fn is_header(line: &str) -> bool {
    line.starts_with('[') && line.ends_with(']')
}

/// Normalizes a header line into a section key.
pub fn normalize_key(header: &str) -> String {
    header
        .to_lowercase()
        .replace(['[', ']'], "")
        .trim()
        .to_string()
}

/// Builds the section index from raw extracted text.
///
/// Never fails: text without any header yields an empty index.
pub fn build_index(text: &str) -> SectionIndex {
    let mut index = SectionIndex::new();
    let mut current_header: Option<&str> = None;
    let mut current_content: Vec<&str> = Vec::new();

    let lines = text.split('\n').map(str::trim).filter(|l| !l.is_empty());

    for line in lines {
        if is_header(line) {
            if let Some(header) = current_header {
                commit(&mut index, header, &current_content);
            }
            current_header = Some(line);
            current_content.clear();
        } else if current_header.is_some() {
            current_content.push(line);
        }
    }

    // Final section has no following header to trigger its commit.
    if let Some(header) = current_header {
        commit(&mut index, header, &current_content);
    }

    index
}

fn commit(index: &mut SectionIndex, header: &str, content: &[&str]) {
    if content.is_empty() {
        return;
    }
    let key = normalize_key(header);
    if key.is_empty() {
        return;
    }
    let mut text = String::from(header);
    for line in content {
        text.push('\n');
        text.push_str(line);
    }
    index.insert(key, text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_section() {
        let index = build_index("[Topic]\nline one\nline two");
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("topic"), Some("[Topic]\nline one\nline two"));
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let index = build_index("[ Topic ]\nfirst body\n[TOPIC]\nsecond body");
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("topic"), Some("[TOPIC]\nsecond body"));
    }

    #[test]
    fn test_duplicate_key_keeps_first_position() {
        let index = build_index("[A]\none\n[B]\ntwo\n[a]\nthree");
        let keys: Vec<&str> = index.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(index.get("a"), Some("[a]\nthree"));
    }

    #[test]
    fn test_trailing_empty_section_dropped() {
        let index = build_index("[A]\nbody\n[B]");
        assert_eq!(index.len(), 1);
        assert!(index.get("a").is_some());
        assert!(index.get("b").is_none());
    }

    #[test]
    fn test_middle_empty_section_dropped() {
        let index = build_index("[A]\n[B]\nbody");
        let keys: Vec<&str> = index.keys().collect();
        assert_eq!(keys, vec!["b"]);
    }

    #[test]
    fn test_blank_and_preamble_discarded() {
        let index = build_index("intro line\n\n[Only]\n\n   \nkept");
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("only"), Some("[Only]\nkept"));
        assert!(index.iter().all(|s| !s.text.contains("intro line")));
    }

    #[test]
    fn test_no_headers_yields_empty() {
        assert!(build_index("").is_empty());
        assert!(build_index("just some text\nwithout headers").is_empty());
    }

    #[test]
    fn test_lines_are_trimmed() {
        let index = build_index("   [Fire Safety]  \r\n  Leave the building.  \r\n");
        assert_eq!(
            index.get("fire safety"),
            Some("[Fire Safety]\nLeave the building.")
        );
    }

    #[test]
    fn test_empty_key_not_committed() {
        let index = build_index("[]\norphan\n[ ]\nalso orphan\n[Real]\nbody");
        let keys: Vec<&str> = index.keys().collect();
        assert_eq!(keys, vec!["real"]);
    }

    #[test]
    fn test_inner_brackets_removed_from_key() {
        let index = build_index("[[Medical] Help]\ncall 102");
        assert_eq!(index.get("medical help"), Some("[[Medical] Help]\ncall 102"));
    }

    #[test]
    fn test_keys_lowercase_and_values_start_with_header() {
        let text = "[Lost Passport]\nContact embassy\n[THEFT]\nFile a report\n[Road Safety]\nWear a helmet";
        let index = build_index(text);
        assert_eq!(index.len(), 3);
        for section in index.iter() {
            assert!(!section.key.is_empty());
            assert_eq!(section.key, section.key.to_lowercase());
            assert!(section.text.starts_with('['));
            assert!(section.text.lines().next().is_some_and(is_header));
        }
    }
}
