//! Token representation for Tibetan text.
//!
//! A Token represents a segmented unit of text, which can be a word, an affix
//! split off a word, punctuation, or a foreign run passed through untouched.

use serde::{Deserialize, Serialize};

use crate::pos::Pos;
use crate::syllable::{Affixation, TSEK};
use crate::trie::LexicalEntry;

/// What kind of span a chunk or token covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChunkType {
    /// Tibetan syllables
    #[default]
    Text,
    /// Shad, head marks and stray tseks
    Punct,
    /// Tibetan numerals
    Num,
    Sym,
    Latin,
    Cjk,
    /// Anything else, including unassigned Tibetan code points
    Other,
    /// Whitespace that belongs to no other chunk
    Space,
}

impl ChunkType {
    /// Upper-case name used in serialized output
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::Text => "TEXT",
            ChunkType::Punct => "PUNCT",
            ChunkType::Num => "NUM",
            ChunkType::Sym => "SYM",
            ChunkType::Latin => "LATIN",
            ChunkType::Cjk => "CJK",
            ChunkType::Other => "OTHER",
            ChunkType::Space => "SPACE",
        }
    }
}

/// How a token came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Matched a dictionary key
    Dictionary,
    /// Host or particle produced by splitting an affixed dictionary match
    AffixSplit,
    /// Syllable with no dictionary match
    #[default]
    Unknown,
    /// Punctuation, numerals or a non-Tibetan run
    Passthrough,
}

/// One segmented span of the input.
///
/// `start` and `len` are byte offsets into the caller's string, and `text` is
/// exactly that slice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,

    pub start: usize,

    pub len: usize,

    pub chunk_type: ChunkType,

    /// Part-of-speech tag (absent for unknown words and non-words)
    pub pos: Option<Pos>,

    /// Dictionary form; filled in for every word by the default lemma pass
    pub lemma: Option<String>,

    /// Dictionary frequency of the chosen sense
    pub freq: Option<u32>,

    /// Cleaned syllables, as used for the trie lookup
    pub syls: Vec<String>,

    pub provenance: Provenance,

    /// A particle split off its host
    pub is_affix: bool,

    /// The host a particle was split from
    pub is_affix_host: bool,

    /// Marked as a Sanskrit loan in the dictionary
    pub is_skrt: bool,

    /// Every dictionary sense of the matched key, in insertion order
    pub senses: Vec<LexicalEntry>,

    /// Affixation of the matched form, if it was an affixed form
    pub affixation: Option<Affixation>,

    /// A following པ་ པོ་ བ་ བོ་ was merged in
    pub has_merged_dagdra: bool,
}

impl Token {
    /// Token with only its span set
    pub fn with_text(text: String, start: usize, len: usize, chunk_type: ChunkType) -> Self {
        Token {
            text,
            start,
            len,
            chunk_type,
            ..Default::default()
        }
    }

    /// Byte offset one past the end of the token
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Syllables joined with tsek, without a trailing tsek
    pub fn text_cleaned(&self) -> String {
        self.syls.join(&TSEK.to_string())
    }

    /// Tibetan text with at least one syllable
    pub fn is_word(&self) -> bool {
        self.chunk_type == ChunkType::Text && !self.syls.is_empty()
    }

    pub fn is_punct(&self) -> bool {
        self.chunk_type == ChunkType::Punct
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)?;
        if let Some(ref pos) = self.pos {
            write!(f, "/{}", pos)?;
        }
        Ok(())
    }
}

/// Panics unless `tokens` cover `text` exactly, in order.
///
/// A failure here is a bug in the chunker or the tokenizer, never bad input.
pub(crate) fn assert_partition(text: &str, tokens: &[Token]) {
    let mut offset = 0;
    for token in tokens {
        assert_eq!(
            token.start, offset,
            "token {:?} does not start where the previous one ended",
            token.text
        );
        assert_eq!(
            &text[token.start..token.end()],
            token.text,
            "token text does not match its span"
        );
        offset = token.end();
    }
    assert_eq!(offset, text.len(), "tokens do not cover the whole input");
}
