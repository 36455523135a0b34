//! Trie data structure for dictionary-based tokenization.
//!
//! The Trie stores words as sequences of syllables and answers prefix queries
//! one syllable at a time. Nodes live in a single arena and refer to their
//! children by index. A [`Trie`] is read-only once built; all mutation goes
//! through [`TrieBuilder`].

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::char_categories::{get_char_category, CharCategory};
use crate::chunker::normalize_syl;
use crate::error::{Diagnostic, DiagnosticKind, Result, TokenizerError};
use crate::pos::Pos;
use crate::syllable::{get_all_affixed, Affixation, TSEK};

/// Maximum number of TSV columns: form, pos, lemma, sense, freq, affix
const MAX_COLUMNS: usize = 6;

/// Attributes of one sense of a dictionary key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LexicalEntry {
    /// Part-of-speech tag
    pub pos: Option<Pos>,
    /// Lemma (base form)
    pub lemma: Option<String>,
    /// Sense description/gloss
    pub sense: Option<String>,
    /// Frequency, used as the tie-break weight
    pub freq: Option<u32>,
    /// Set when the key is an affixed form (host + fused particle)
    pub affixation: Option<Affixation>,
    /// Whether this is a Sanskrit word
    pub skrt: bool,
    /// Generated from another word by inflection rather than listed
    pub inflected: bool,
}

impl LexicalEntry {
    /// Create an entry with only a POS tag
    pub fn with_pos(pos: Pos) -> Self {
        LexicalEntry {
            pos: Some(pos),
            ..Default::default()
        }
    }

    /// Weight used to rank senses of the same key
    pub fn weight(&self) -> u32 {
        self.freq.unwrap_or(0)
    }
}

/// Index of a node in the trie arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    const ROOT: NodeId = NodeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the Trie
#[derive(Debug, Clone, Default)]
pub struct TrieNode {
    /// Children nodes, keyed by syllable
    children: HashMap<String, NodeId>,
    /// Senses of the word ending here, in insertion order
    entries: Vec<LexicalEntry>,
}

impl TrieNode {
    /// Check if this node has any children
    pub fn can_walk(&self) -> bool {
        !self.children.is_empty()
    }

    /// Check if this node is a valid word ending
    pub fn is_match(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Senses of the word ending here
    pub fn entries(&self) -> &[LexicalEntry] {
        &self.entries
    }
}

/// A dictionary match found by [`Trie::lookup_prefixes`]
#[derive(Debug, Clone, Copy)]
pub struct PrefixMatch<'a> {
    /// Number of syllables matched
    pub len: usize,
    /// Position of the entry among the senses of its key (insertion order)
    pub index: usize,
    pub entry: &'a LexicalEntry,
}

/// A Trie for storing and looking up Tibetan words
#[derive(Debug, Clone)]
pub struct Trie {
    nodes: Vec<TrieNode>,
    /// Number of keys with at least one entry
    word_count: usize,
    /// Built by a builder that generated affixed forms
    inflected: bool,
}

impl Default for Trie {
    fn default() -> Self {
        Trie {
            nodes: vec![TrieNode::default()],
            word_count: 0,
            inflected: false,
        }
    }
}

impl Trie {
    /// Create a new empty Trie
    pub fn empty() -> Self {
        Trie::default()
    }

    /// Get the number of words in the trie
    pub fn len(&self) -> usize {
        self.word_count
    }

    /// Check if the trie is empty
    pub fn is_empty(&self) -> bool {
        self.word_count == 0
    }

    /// Whether words were added with their affixed forms
    pub fn is_inflected(&self) -> bool {
        self.inflected
    }

    /// Number of nodes in the arena, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn node(&self, id: NodeId) -> &TrieNode {
        &self.nodes[id.index()]
    }

    /// Walk the trie by one syllable, returning the next node if it exists
    pub fn walk(&self, syl: &str, from: NodeId) -> Option<NodeId> {
        self.node(from).children.get(syl).copied()
    }

    fn find(&self, syls: &[&str]) -> Option<&TrieNode> {
        let mut current = self.root();
        for syl in syls {
            current = self.walk(&normalize_syl(syl), current)?;
        }
        Some(self.node(current))
    }

    /// Check if a word exists in the trie
    pub fn has_word(&self, syls: &[&str]) -> bool {
        self.find(syls).is_some_and(TrieNode::is_match)
    }

    /// All senses recorded for a word, in insertion order
    pub fn entries(&self, syls: &[&str]) -> &[LexicalEntry] {
        self.find(syls).map(TrieNode::entries).unwrap_or(&[])
    }

    /// Every dictionary key that is a prefix of `syls[start..]`.
    ///
    /// Matches come back ordered by length, then by sense order. Syllables
    /// must be NFC-normalized, as the chunker produces them.
    pub fn lookup_prefixes<S: AsRef<str>>(&self, syls: &[S], start: usize) -> Vec<PrefixMatch<'_>> {
        let mut matches = Vec::new();
        let mut current = self.root();

        for (offset, syl) in syls.iter().enumerate().skip(start) {
            match self.walk(syl.as_ref(), current) {
                Some(next) => current = next,
                None => break,
            }
            let len = offset - start + 1;
            for (index, entry) in self.node(current).entries.iter().enumerate() {
                matches.push(PrefixMatch { len, index, entry });
            }
        }

        matches
    }

    /// Depth-first visit of every key and its entries.
    fn for_each_word<F>(&self, mut visit: F)
    where
        F: FnMut(&[String], &[LexicalEntry]),
    {
        let mut path = Vec::new();
        let mut stack = vec![(self.root(), 0usize, None::<&String>)];

        while let Some((id, depth, syl)) = stack.pop() {
            path.truncate(depth);
            if let Some(syl) = syl {
                path.push(syl.clone());
            }
            let node = self.node(id);
            if node.is_match() {
                visit(&path, &node.entries);
            }
            for (child_syl, &child) in &node.children {
                stack.push((child, path.len(), Some(child_syl)));
            }
        }
    }
}

/// Split a dictionary form into syllables on tsek
fn split_form(form: &str) -> Vec<&str> {
    form.split(TSEK).map(str::trim).filter(|s| !s.is_empty()).collect()
}

fn is_sanskrit(form: &str) -> bool {
    form.chars().any(|c| {
        matches!(
            get_char_category(c),
            CharCategory::SkrtCons
                | CharCategory::SkrtSubCons
                | CharCategory::SkrtVow
                | CharCategory::SkrtLongVow
        )
    })
}

fn non_empty(column: Option<&&str>) -> Option<String> {
    column
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse one non-comment TSV line into its form and entry.
fn parse_tsv_line(line: &str) -> std::result::Result<(String, LexicalEntry), DiagnosticKind> {
    let parts: Vec<&str> = line.split('\t').collect();
    if parts.len() > MAX_COLUMNS {
        return Err(DiagnosticKind::TooManyColumns(parts.len()));
    }

    let form = parts[0].trim();
    if split_form(form).is_empty() {
        return Err(DiagnosticKind::EmptyForm);
    }

    let pos_column = parts.get(1).ok_or(DiagnosticKind::MissingPos)?.trim();
    let pos = if pos_column.is_empty() {
        None
    } else {
        Some(
            pos_column
                .parse::<Pos>()
                .map_err(|e| DiagnosticKind::UnknownPos(e.0))?,
        )
    };

    let freq = match non_empty(parts.get(4)) {
        Some(raw) => Some(
            raw.parse::<u32>()
                .map_err(|_| DiagnosticKind::InvalidFrequency(raw))?,
        ),
        None => None,
    };

    let affixation = match non_empty(parts.get(5)) {
        Some(raw) => Some(
            raw.parse::<Affixation>()
                .map_err(DiagnosticKind::UnknownAffixRule)?,
        ),
        None => None,
    };

    let entry = LexicalEntry {
        pos,
        lemma: non_empty(parts.get(2)),
        sense: non_empty(parts.get(3)),
        freq,
        affixation,
        skrt: is_sanskrit(form),
        inflected: false,
    };

    Ok((form.to_string(), entry))
}

/// Lines of a TSV document that carry data, with their 1-based numbers.
fn data_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
}

/// Builder for a Trie. Not shared across threads while building.
#[derive(Debug, Clone, Default)]
pub struct TrieBuilder {
    trie: Trie,
    /// Generate affixed forms for every word added
    inflect: bool,
}

impl TrieBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        TrieBuilder::default()
    }

    /// Create a builder that adds every affixed form of each word it is given
    pub fn with_inflection() -> Self {
        TrieBuilder {
            inflect: true,
            ..Default::default()
        }
    }

    /// Continue building on top of an existing trie, inflecting new words
    /// the way the trie's own words were
    pub fn from_trie(trie: Trie) -> Self {
        TrieBuilder {
            inflect: trie.inflected,
            trie,
        }
    }

    /// Enable or disable auto-inflection
    pub fn set_inflection(&mut self, enable: bool) {
        self.inflect = enable;
    }

    /// The trie as built so far
    pub fn trie(&self) -> &Trie {
        &self.trie
    }

    fn node_mut(&mut self, id: NodeId) -> &mut TrieNode {
        &mut self.trie.nodes[id.index()]
    }

    fn find_mut(&mut self, syls: &[&str]) -> Option<&mut TrieNode> {
        let mut current = self.trie.root();
        for syl in syls {
            current = self.trie.walk(&normalize_syl(syl), current)?;
        }
        Some(self.node_mut(current))
    }

    fn child_or_insert(&mut self, parent: NodeId, syl: String) -> NodeId {
        if let Some(child) = self.trie.walk(&syl, parent) {
            return child;
        }
        let child = NodeId(self.trie.nodes.len() as u32);
        self.trie.nodes.push(TrieNode::default());
        self.node_mut(parent).children.insert(syl, child);
        child
    }

    /// Add a sense for a word given as syllables.
    ///
    /// A sense with the same POS as an existing one replaces it in place;
    /// otherwise the sense is appended. Listed senses displace senses
    /// generated by inflection, never the other way round.
    pub fn add(&mut self, syls: &[&str], entry: LexicalEntry) {
        if syls.is_empty() {
            return;
        }

        let mut current = self.trie.root();
        for syl in syls {
            current = self.child_or_insert(current, normalize_syl(syl));
        }

        let node = self.node_mut(current);
        let was_match = node.is_match();

        if entry.inflected {
            if node.entries.iter().any(|e| !e.inflected) {
                return;
            }
        } else {
            node.entries.retain(|e| !e.inflected);
        }

        match node.entries.iter_mut().find(|e| e.pos == entry.pos) {
            Some(existing) => *existing = entry,
            None => node.entries.push(entry),
        }

        if !was_match {
            self.trie.word_count += 1;
        }
    }

    /// Add a word from a string (split into syllables by tsek).
    ///
    /// With inflection enabled, every affixed form of the word is added as
    /// well, unless that form is already listed.
    pub fn add_word(&mut self, word: &str, entry: LexicalEntry) {
        let syls = split_form(word);
        if syls.is_empty() {
            return;
        }

        if self.inflect && entry.affixation.is_none() {
            if let Some((last, host)) = syls.split_last() {
                if let Some(forms) = get_all_affixed(last) {
                    let lemma = entry
                        .lemma
                        .clone()
                        .unwrap_or_else(|| syls.join(&TSEK.to_string()));
                    for (form, affixation) in forms {
                        let mut affixed: Vec<&str> = host.to_vec();
                        affixed.push(&form);
                        self.add(
                            &affixed,
                            LexicalEntry {
                                lemma: Some(lemma.clone()),
                                affixation: Some(affixation),
                                inflected: true,
                                ..entry.clone()
                            },
                        );
                    }
                }
            }
        }

        self.add(&syls, entry);
    }

    /// Deactivate a word (make it not findable)
    pub fn deactivate(&mut self, syls: &[&str]) -> bool {
        match self.find_mut(syls) {
            Some(node) if node.is_match() => {
                node.entries.clear();
                self.trie.word_count -= 1;
                true
            }
            _ => false,
        }
    }

    /// Deactivate a word given as a string, and its affixed forms when
    /// inflection is enabled
    pub fn deactivate_word(&mut self, word: &str) -> bool {
        let syls = split_form(word);
        let removed = self.deactivate(&syls);

        if self.inflect {
            if let Some((last, host)) = syls.split_last() {
                for (form, _) in get_all_affixed(last).unwrap_or_default() {
                    let mut affixed: Vec<&str> = host.to_vec();
                    affixed.push(&form);
                    let generated_only = self
                        .trie
                        .entries(&affixed)
                        .iter()
                        .all(|e| e.inflected);
                    if generated_only {
                        self.deactivate(&affixed);
                    }
                }
            }
        }

        removed
    }

    /// Add every word of `other` to this builder
    pub fn merge(&mut self, other: &Trie) {
        let mut words: Vec<(Vec<String>, Vec<LexicalEntry>)> = Vec::new();
        other.for_each_word(|syls, entries| words.push((syls.to_vec(), entries.to_vec())));

        for (syls, entries) in words {
            let syls: Vec<&str> = syls.iter().map(String::as_str).collect();
            for entry in entries {
                self.add(&syls, entry);
            }
        }
    }

    /// Load words from TSV content (`form\tpos\tlemma\tsense\tfreq\taffix`).
    ///
    /// Malformed lines are skipped; one diagnostic is returned per skipped
    /// line. Lines starting with `#` are comments and a leading `form` header
    /// is ignored.
    pub fn load_tsv(&mut self, tsv_content: &str) -> Vec<Diagnostic> {
        self.load_tsv_from(tsv_content, None)
    }

    /// Load words from a TSV file. Only an unreadable file is an error.
    pub fn load_tsv_file<P: AsRef<Path>>(&mut self, path: P) -> Result<Vec<Diagnostic>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| TokenizerError::io(path, e))?;
        Ok(self.load_tsv_from(&content, Some(path)))
    }

    pub(crate) fn load_tsv_from(&mut self, content: &str, source: Option<&Path>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let mut added = 0usize;

        for (index, (line_no, line)) in data_lines(content).enumerate() {
            if index == 0 && line.split('\t').next().map(str::trim) == Some("form") {
                continue;
            }

            match parse_tsv_line(line) {
                Ok((form, entry)) => {
                    self.add_word(&form, entry);
                    added += 1;
                }
                Err(kind) => {
                    let diagnostic = Diagnostic {
                        source: source.map(Path::to_path_buf),
                        line: line_no,
                        kind,
                    };
                    warn!("skipping dictionary line: {}", diagnostic);
                    diagnostics.push(diagnostic);
                }
            }
        }

        debug!(
            "loaded {} entries from {} ({} skipped)",
            added,
            source.map_or_else(|| "<tsv>".into(), |p| p.display().to_string()),
            diagnostics.len()
        );

        diagnostics
    }

    /// Deactivate every form listed in TSV content (first column only)
    pub fn remove_tsv(&mut self, tsv_content: &str) -> usize {
        data_lines(tsv_content)
            .filter_map(|(_, line)| line.split('\t').next())
            .filter(|form| self.deactivate_word(form))
            .count()
    }

    /// Deactivate every form listed in a TSV file
    pub fn remove_tsv_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| TokenizerError::io(path, e))?;
        Ok(self.remove_tsv(&content))
    }

    /// Build and return the Trie
    pub fn build(mut self) -> Trie {
        self.trie.inflected = self.inflect;
        debug!(
            "built trie with {} words and {} nodes",
            self.trie.len(),
            self.trie.node_count()
        );
        self.trie
    }
}
