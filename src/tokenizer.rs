//! The main tokenizer implementing longest-match algorithm.
//!
//! This module takes chunked text and uses the Trie to find the longest matching
//! words, producing a list of tokens. Matching is purely in-memory; the only
//! I/O a [`WordTokenizer`] may do is loading its dictionary on first use.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::debug;
use once_cell::sync::{Lazy, OnceCell};

use crate::chunker::{Chunk, Chunker};
use crate::config::{TokenizeOptions, TokenizerConfig};
use crate::dialect_pack::{load_dialect_pack, PackCache};
use crate::error::{Diagnostic, Result, TokenizerError};
use crate::modifiers::apply_all_modifiers;
use crate::sentence::{sentence_tokenize, Sentence};
use crate::token::{assert_partition, ChunkType, Provenance, Token};
use crate::trie::{PrefixMatch, Trie, TrieBuilder};

static EMPTY_TRIE: Lazy<Trie> = Lazy::new(Trie::empty);

/// Pick the match to emit: most syllables, then highest weight, then the
/// sense inserted first.
fn select_match<'a>(matches: &[PrefixMatch<'a>]) -> Option<PrefixMatch<'a>> {
    matches.iter().copied().max_by(|a, b| {
        a.len
            .cmp(&b.len)
            .then(a.entry.weight().cmp(&b.entry.weight()))
            .then(b.index.cmp(&a.index))
    })
}

/// Token for a punctuation, numeral, whitespace or non-Tibetan chunk
fn passthrough_token(chunk: &Chunk, text: &str) -> Token {
    let mut token = Token::with_text(
        chunk.text(text).to_string(),
        chunk.start,
        chunk.len,
        chunk.chunk_type,
    );
    token.provenance = Provenance::Passthrough;
    token
}

/// Token for a syllable with no dictionary match
fn unknown_token(chunk: &Chunk, text: &str) -> Token {
    let mut token = Token::with_text(
        chunk.text(text).to_string(),
        chunk.start,
        chunk.len,
        ChunkType::Text,
    );
    token.syls = chunk.syl.iter().cloned().collect();
    token.provenance = Provenance::Unknown;
    token
}

/// Token spanning `chunks`, described by the selected dictionary match
fn word_token(chunks: &[Chunk], text: &str, best: PrefixMatch<'_>, matches: &[PrefixMatch<'_>]) -> Token {
    let start = chunks[0].start;
    let end = chunks[chunks.len() - 1].end();

    let mut token = Token::with_text(text[start..end].to_string(), start, end - start, ChunkType::Text);
    token.syls = chunks.iter().filter_map(|c| c.syl.clone()).collect();

    let entry = best.entry;
    token.pos = entry.pos;
    token.lemma = entry.lemma.clone();
    token.freq = entry.freq;
    token.is_skrt = entry.skrt;
    token.affixation = entry.affixation;
    token.senses = matches
        .iter()
        .filter(|m| m.len == best.len)
        .map(|m| m.entry.clone())
        .collect();
    token.provenance = Provenance::Dictionary;
    token
}

/// Run the longest-match state machine over `chunks`.
fn match_chunks(trie: &Trie, chunks: &[Chunk], text: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(chunks.len());
    let mut i = 0;

    while i < chunks.len() {
        // Non-syllable chunks are passed through as-is
        if chunks[i].syl.is_none() {
            tokens.push(passthrough_token(&chunks[i], text));
            i += 1;
            continue;
        }

        // Words never cross a non-syllable chunk
        let run_end = chunks[i..]
            .iter()
            .position(|c| c.syl.is_none())
            .map_or(chunks.len(), |n| i + n);
        let run = &chunks[i..run_end];
        let syls: Vec<&str> = run.iter().filter_map(|c| c.syl.as_deref()).collect();

        let mut j = 0;
        while j < syls.len() {
            let matches = trie.lookup_prefixes(&syls, j);
            match select_match(&matches) {
                Some(best) => {
                    tokens.push(word_token(&run[j..j + best.len], text, best, &matches));
                    j += best.len;
                }
                None => {
                    tokens.push(unknown_token(&run[j], text));
                    j += 1;
                }
            }
        }

        i = run_end;
    }

    tokens
}

/// Chunk, match and post-process `text` against `trie`.
fn segment(trie: &Trie, text: &str, options: &TokenizeOptions) -> Vec<Token> {
    let chunks = Chunker::new(text)
        .spaces_as_punct(options.spaces_as_punct)
        .make_chunks();
    let mut tokens = match_chunks(trie, &chunks, text);
    apply_all_modifiers(&mut tokens, options);
    assert_partition(text, &tokens);
    tokens
}

/// Dictionary-driven word tokenizer.
///
/// The trie is shared read-only behind an `Arc`, so one tokenizer can serve
/// many threads. With `auto_download` the dialect pack is resolved and loaded
/// on the first call that needs it.
pub struct WordTokenizer {
    trie: OnceCell<Arc<Trie>>,
    config: TokenizerConfig,
    options: TokenizeOptions,
    cache: Option<PackCache>,
}

impl WordTokenizer {
    /// Create a new tokenizer with the given trie
    pub fn new(trie: Trie) -> Self {
        Self::with_arc(Arc::new(trie))
    }

    /// Create a new tokenizer with a shared trie reference.
    ///
    /// Words loaded later are inflected only if the trie itself was built
    /// with inflection.
    pub fn with_arc(trie: Arc<Trie>) -> Self {
        let mut config = TokenizerConfig::default().auto_download(false);
        config.inflect = trie.is_inflected();
        WordTokenizer {
            trie: OnceCell::with_value(trie),
            options: config.options(),
            config,
            cache: None,
        }
    }

    /// Create a tokenizer from a configuration.
    ///
    /// Nothing is loaded yet. With `auto_download` the configured pack is
    /// fetched and loaded on first use; otherwise a dictionary must be loaded
    /// with [`load_tsv_file`](Self::load_tsv_file) before tokenizing.
    pub fn from_config(config: TokenizerConfig) -> Result<Self> {
        config.validate()?;
        let cache = if config.auto_download {
            Some(PackCache::from_config(&config)?)
        } else {
            None
        };
        Ok(Self::unloaded(config, cache))
    }

    /// Like [`from_config`](Self::from_config), with an explicit pack cache
    pub fn with_cache(config: TokenizerConfig, cache: PackCache) -> Result<Self> {
        config.validate()?;
        Ok(Self::unloaded(config, Some(cache)))
    }

    fn unloaded(config: TokenizerConfig, cache: Option<PackCache>) -> Self {
        WordTokenizer {
            trie: OnceCell::new(),
            options: config.options(),
            config,
            cache,
        }
    }

    /// Build a tokenizer from a dialect pack already on disk. Does no
    /// network I/O.
    pub fn from_dialect_pack<P: AsRef<Path>>(pack_path: P, config: TokenizerConfig) -> Result<Self> {
        config.validate()?;
        let trie = build_pack_trie(pack_path.as_ref(), config.inflect)?;
        let mut tokenizer = Self::unloaded(config, None);
        tokenizer.trie = OnceCell::with_value(Arc::new(trie));
        Ok(tokenizer)
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Default options used by [`tokenize`](Self::tokenize)
    pub fn options(&self) -> &TokenizeOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: TokenizeOptions) {
        self.options = options;
    }

    /// Get a reference to the trie, if one is loaded
    pub fn trie(&self) -> Option<&Trie> {
        self.trie.get().map(|trie| trie.as_ref())
    }

    /// Get the Arc reference to the trie (for sharing)
    pub fn trie_arc(&self) -> Option<Arc<Trie>> {
        self.trie.get().cloned()
    }

    /// Load the dictionary now if it is not loaded yet
    pub fn ensure_loaded(&self) -> Result<&Arc<Trie>> {
        self.trie.get_or_try_init(|| {
            let cache = match (&self.cache, self.config.auto_download) {
                (Some(cache), true) => cache,
                _ => return Err(TokenizerError::NoDictionary),
            };
            let path = cache.get_dialect_pack(&self.config.dialect_name)?;
            build_pack_trie(&path, self.config.inflect).map(Arc::new)
        })
    }

    /// The trie new entries are added on top of. Only copied when a caller
    /// still holds it through [`trie_arc`](Self::trie_arc).
    fn take_trie(&mut self) -> Result<Trie> {
        if self.trie.get().is_none() && self.config.auto_download {
            self.ensure_loaded()?;
        }
        Ok(match self.trie.take() {
            Some(trie) => Arc::try_unwrap(trie).unwrap_or_else(|shared| (*shared).clone()),
            None => Trie::empty(),
        })
    }

    fn extend_trie<F>(&mut self, load: F) -> Result<Vec<Diagnostic>>
    where
        F: FnOnce(&mut TrieBuilder) -> Vec<Diagnostic>,
    {
        let mut builder = TrieBuilder::from_trie(self.take_trie()?);
        builder.set_inflection(self.config.inflect);
        let diagnostics = load(&mut builder);
        self.trie = OnceCell::with_value(Arc::new(builder.build()));
        Ok(diagnostics)
    }

    /// Add the words of TSV content to the dictionary
    pub fn load_tsv(&mut self, tsv_content: &str) -> Result<Vec<Diagnostic>> {
        self.extend_trie(|builder| builder.load_tsv(tsv_content))
    }

    /// Add the words of a TSV file to the dictionary. Malformed lines are
    /// skipped and returned as diagnostics; an unreadable file is an error and
    /// leaves the dictionary unchanged.
    pub fn load_tsv_file<P: AsRef<Path>>(&mut self, path: P) -> Result<Vec<Diagnostic>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| TokenizerError::io(path, e))?;
        self.extend_trie(|builder| builder.load_tsv_from(&content, Some(path)))
    }

    /// Tokenize a string with the tokenizer's default options
    pub fn tokenize(&self, text: &str) -> Result<Vec<Token>> {
        self.tokenize_with_options(text, &self.options)
    }

    /// Tokenize a string with configurable options
    pub fn tokenize_with_options(&self, text: &str, options: &TokenizeOptions) -> Result<Vec<Token>> {
        let trie = self.ensure_loaded()?;
        Ok(segment(trie, text, options))
    }

    /// Tokenize and group the tokens into sentences
    pub fn tokenize_sentences(&self, text: &str) -> Result<Vec<Sentence>> {
        Ok(sentence_tokenize(&self.tokenize(text)?))
    }

    /// Tokenize without post-processing (raw tokenization)
    pub fn tokenize_raw(&self, text: &str) -> Result<Vec<Token>> {
        let options = TokenizeOptions {
            spaces_as_punct: self.options.spaces_as_punct,
            ..TokenizeOptions::raw()
        };
        self.tokenize_with_options(text, &options)
    }

    /// Tokenize pre-chunked text, without post-processing.
    ///
    /// `chunks` must come from chunking `text`.
    pub fn tokenize_chunks(&self, chunks: &[Chunk], text: &str) -> Result<Vec<Token>> {
        let trie = self.ensure_loaded()?;
        let tokens = match_chunks(trie, chunks, text);
        assert_partition(text, &tokens);
        Ok(tokens)
    }
}

impl fmt::Debug for WordTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordTokenizer")
            .field("words", &self.trie().map(Trie::len))
            .field("config", &self.config)
            .field("options", &self.options)
            .finish()
    }
}

fn build_pack_trie(pack_path: &Path, inflect: bool) -> Result<Trie> {
    let mut builder = TrieBuilder::new();
    builder.set_inflection(inflect);
    let diagnostics = load_dialect_pack(&mut builder, pack_path)?;
    if !diagnostics.is_empty() {
        debug!(
            "{} dictionary lines skipped in {}",
            diagnostics.len(),
            pack_path.display()
        );
    }
    Ok(builder.build())
}

/// A simple tokenizer that doesn't use a dictionary (just syllabifies)
pub struct SimpleTokenizer;

impl SimpleTokenizer {
    /// Tokenize text into syllables (no dictionary lookup)
    pub fn tokenize(text: &str) -> Vec<Token> {
        Self::tokenize_with_options(text, &TokenizeOptions::default())
    }

    pub fn tokenize_with_options(text: &str, options: &TokenizeOptions) -> Vec<Token> {
        segment(&EMPTY_TRIE, text, options)
    }
}
