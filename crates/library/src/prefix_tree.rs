//! Prefix tree over Unicode scalar values.
//!
//! Level `n` of the tree holds every character that appears at index `n` of
//! some inserted key below the same prefix. The tree only records presence of
//! paths: it stores no values and nodes are never removed.

use std::collections::{HashMap, HashSet};
use std::fmt;

/// Node in a [`PrefixTree`]. The root carries no symbol.
#[derive(Debug, Clone, Default)]
struct PrefixNode {
    symbol: Option<char>,
    children: HashMap<char, PrefixNode>,
}

impl PrefixNode {
    fn new(symbol: char) -> Self {
        Self {
            symbol: Some(symbol),
            children: HashMap::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn count(&self) -> usize {
        self.children.values().map(|c| 1 + c.count()).sum()
    }

    fn collect_words(&self, path: &mut String, out: &mut HashSet<String>) {
        if let Some(symbol) = self.symbol {
            path.push(symbol);
        }
        if self.is_leaf() {
            out.insert(path.clone());
        } else {
            for child in self.children.values() {
                child.collect_words(path, out);
            }
        }
        if self.symbol.is_some() {
            path.pop();
        }
    }
}

/// Presence index of character paths.
#[derive(Debug, Clone, Default)]
pub struct PrefixTree {
    root: PrefixNode,
}

impl PrefixTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key. The nth character of `key` lands on level n of the tree.
    pub fn insert(&mut self, key: &str) {
        let mut node = &mut self.root;
        for c in key.chars() {
            node = node.children.entry(c).or_insert_with(|| PrefixNode::new(c));
        }
    }

    /// True if a path from the root spells out `key`. The empty key is always
    /// contained.
    pub fn contains(&self, key: &str) -> bool {
        let mut node = &self.root;
        for c in key.chars() {
            match node.children.get(&c) {
                Some(child) => node = child,
                None => return false,
            }
        }
        true
    }

    /// Every root-to-leaf string in the tree.
    pub fn words(&self) -> HashSet<String> {
        let mut words = HashSet::new();
        if self.root.is_leaf() {
            return words;
        }
        let mut path = String::new();
        self.root.collect_words(&mut path, &mut words);
        words
    }

    /// Breadth-first rendering, e.g. `"w,o,r,d,"`.
    ///
    /// All symbols of one level are written before any symbol of the next
    /// level. Within a level symbols are sorted by code point.
    pub fn level_order(&self) -> String {
        let mut out = String::new();
        let mut level: Vec<&PrefixNode> = self.root.children.values().collect();
        while !level.is_empty() {
            let mut symbols: Vec<char> = level.iter().filter_map(|n| n.symbol).collect();
            symbols.sort_unstable();
            for symbol in symbols {
                out.push(symbol);
                out.push(',');
            }
            level = level
                .into_iter()
                .flat_map(|n| n.children.values())
                .collect();
        }
        out
    }

    /// Number of nodes below the root.
    pub fn node_count(&self) -> usize {
        self.root.count()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_leaf()
    }
}

impl fmt::Display for PrefixTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.level_order())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_of(keys: &[&str]) -> PrefixTree {
        let mut tree = PrefixTree::new();
        for key in keys {
            tree.insert(key);
        }
        tree
    }

    #[test]
    fn test_empty_tree_renders_empty() {
        let tree = PrefixTree::new();
        assert_eq!(tree.level_order(), "");
        assert!(tree.words().is_empty());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_single_word_level_order() {
        let tree = tree_of(&["word"]);
        assert_eq!(tree.level_order(), "w,o,r,d,");
        assert_eq!(tree.to_string(), "w,o,r,d,");
    }

    #[test]
    fn test_level_order_sorts_within_level() {
        let tree = tree_of(&["cat", "bat", "car"]);
        // level 0: b c, level 1: a a, level 2: r t t
        assert_eq!(tree.level_order(), "b,c,a,a,r,t,t,");
    }

    #[test]
    fn test_contains_after_insert() {
        let tree = tree_of(&["Song AXAnnBob", "héllo wörld", "日本語"]);
        assert!(tree.contains("Song AXAnnBob"));
        assert!(tree.contains("héllo wörld"));
        assert!(tree.contains("日本語"));
        // prefixes are paths too
        assert!(tree.contains("Song"));
        assert!(tree.contains("日"));
    }

    #[test]
    fn test_contains_missing_key() {
        let tree = tree_of(&["word"]);
        assert!(!tree.contains("world"));
        assert!(!tree.contains("words"));
        assert!(!tree.contains("x"));
        assert!(!PrefixTree::new().contains("a"));
    }

    #[test]
    fn test_empty_key() {
        let mut tree = PrefixTree::new();
        assert!(tree.contains(""));
        tree.insert("");
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 0);
        assert!(tree.contains(""));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut tree = tree_of(&["abc"]);
        let before = tree.node_count();
        tree.insert("abc");
        tree.insert("ab");
        assert_eq!(tree.node_count(), before);
        assert_eq!(before, 3);
    }

    #[test]
    fn test_words_with_branches() {
        let tree = tree_of(&["tea", "ten", "to", "te"]);
        let expected: HashSet<String> = ["tea", "ten", "to"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(tree.words(), expected);
    }

    #[test]
    fn test_shared_prefixes_share_nodes() {
        let tree = tree_of(&["abcd", "abce", "abx"]);
        // a b c d e x
        assert_eq!(tree.node_count(), 6);
    }
}
