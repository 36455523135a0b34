//! Sentence and paragraph grouping over a token stream.
//!
//! Boundaries are found in passes, from the most to the least reliable cue:
//! an ending particle before a shad, a clause particle or imperative word
//! before a shad, a verb before a shad, and in long sentences a verb before a
//! clause particle. Short sentences without a verb are then joined to a
//! neighbour. Syllables are compared in their cleaned form, without tsek.

use std::ops::Range;

use serde::Serialize;

use crate::pos::Pos;
use crate::token::{ChunkType, Token};

const ENDING_PARTICLES: &[&str] = &["གོ", "ངོ", "དོ", "ནོ", "བོ", "མོ", "འོ", "རོ", "ལོ", "སོ", "ཏོ"];

const ENDING_WORDS: &[&str] = &["ཅིག", "ཤོག"];

const ENDING_VERBS: &[&str] = &[
    "ཡིན", "ཡོད", "མིན", "མེད", "འགྱུར", "ལྡན", "བགྱི", "བྱ", "བཞུགས", "འདུག", "སོང",
];

const CLAUSE_PARTICLES: &[&str] = &["སྟེ", "ཏེ", "དེ", "ནས", "ན", "ལ", "ཞིང"];

const DAGDRA: &[&str] = &["པ", "བ", "པོ", "བོ"];

/// Sentences longer than this many tokens are also split after a verb
/// followed by a clause particle
const LONG_SENTENCE: usize = 30;

/// Sentences of at most this many tokens without a verb are joined to a
/// neighbour
const SHORT_SENTENCE: usize = 4;

/// A paragraph is closed once it holds this many words
const PARAGRAPH_WORDS: usize = 70;

/// A sentence that would push a paragraph past this many words starts a new
/// one
const PARAGRAPH_MAX_WORDS: usize = 150;

/// A run of tokens forming one sentence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sentence {
    pub tokens: Vec<Token>,
    /// Number of Tibetan word tokens
    pub word_count: usize,
    /// Indices of the tokens in the slice the sentence was cut from
    pub range: Range<usize>,
}

impl Sentence {
    /// The sentence exactly as it appears in the input
    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    /// The text with ༑ written as ། and whitespace runs collapsed
    pub fn normalized_text(&self) -> String {
        self.text()
            .replace('༑', "།")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Byte span of the sentence in the input
    pub fn span(&self) -> Range<usize> {
        match (self.tokens.first(), self.tokens.last()) {
            (Some(first), Some(last)) => first.start..last.end(),
            _ => 0..0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paragraph {
    pub sentences: Vec<Sentence>,
    pub word_count: usize,
}

impl Paragraph {
    pub fn text(&self) -> String {
        self.sentences.iter().map(Sentence::text).collect()
    }
}

fn last_syl_in(token: &Token, list: &[&str]) -> bool {
    token
        .syls
        .last()
        .is_some_and(|syl| list.contains(&syl.as_str()))
}

fn is_word(token: &Token) -> bool {
    token.chunk_type == ChunkType::Text && !token.syls.is_empty()
}

fn is_verb(token: &Token) -> bool {
    (token.pos == Some(Pos::Verb) && !last_syl_in(token, DAGDRA)) || last_syl_in(token, ENDING_VERBS)
}

fn is_shad(token: &Token) -> bool {
    token.chunk_type == ChunkType::Punct
}

fn ending_particle_then_shad(prev: &Token, next: &Token) -> bool {
    prev.pos == Some(Pos::Part) && last_syl_in(prev, ENDING_PARTICLES) && is_shad(next)
}

fn clause_end_then_shad(prev: &Token, next: &Token) -> bool {
    (last_syl_in(prev, CLAUSE_PARTICLES) || last_syl_in(prev, ENDING_WORDS)) && is_shad(next)
}

fn verb_then_shad(prev: &Token, next: &Token) -> bool {
    is_verb(prev) && is_shad(next)
}

fn verb_then_clause_particle(prev: &Token, next: &Token) -> bool {
    is_verb(prev) && last_syl_in(next, CLAUSE_PARTICLES)
}

/// Split every sentence longer than `min_len` tokens after each token pair
/// that passes `ends`. The second token of the pair closes the sentence.
fn split_where<F>(tokens: &[Token], sentences: Vec<Range<usize>>, min_len: usize, ends: F) -> Vec<Range<usize>>
where
    F: Fn(&Token, &Token) -> bool,
{
    let mut out = Vec::with_capacity(sentences.len());
    for range in sentences {
        if range.len() <= min_len {
            out.push(range);
            continue;
        }
        let mut start = range.start;
        for i in range.start + 1..range.end {
            if ends(&tokens[i - 1], &tokens[i]) {
                out.push(start..i + 1);
                start = i + 1;
            }
        }
        if start < range.end {
            out.push(start..range.end);
        }
    }
    out
}

/// Join short sentences without a verb to the next sentence when they end
/// in a clause particle, otherwise to the previous one unless it ends in an
/// ending particle.
fn join_verbless(tokens: &[Token], mut sentences: Vec<Range<usize>>) -> Vec<Range<usize>> {
    let last_word = |range: &Range<usize>| tokens[range.clone()].iter().rev().find(|t| is_word(t));

    let mut i = 0;
    while i < sentences.len() {
        let range = sentences[i].clone();
        let short_verbless = range.len() <= SHORT_SENTENCE && !tokens[range.clone()].iter().any(is_verb);

        if short_verbless {
            if i + 1 < sentences.len() && last_word(&range).is_some_and(|t| last_syl_in(t, CLAUSE_PARTICLES)) {
                sentences[i + 1].start = range.start;
                sentences.remove(i);
                continue;
            }
            if i > 0 && !last_word(&sentences[i - 1]).is_some_and(|t| last_syl_in(t, ENDING_PARTICLES)) {
                sentences[i - 1].end = range.end;
                sentences.remove(i);
                continue;
            }
        }
        i += 1;
    }
    sentences
}

fn sentence_ranges(tokens: &[Token]) -> Vec<Range<usize>> {
    let whole = vec![0..tokens.len()];
    let sentences = split_where(tokens, whole, 0, ending_particle_then_shad);
    let sentences = split_where(tokens, sentences, 0, clause_end_then_shad);
    let sentences = split_where(tokens, sentences, 0, verb_then_shad);
    let sentences = split_where(tokens, sentences, LONG_SENTENCE, verb_then_clause_particle);
    join_verbless(tokens, sentences)
}

/// Group tokens into sentences. Every token belongs to exactly one sentence,
/// in order.
pub fn sentence_tokenize(tokens: &[Token]) -> Vec<Sentence> {
    if tokens.is_empty() {
        return Vec::new();
    }

    sentence_ranges(tokens)
        .into_iter()
        .map(|range| {
            let tokens = tokens[range.clone()].to_vec();
            Sentence {
                word_count: tokens.iter().filter(|t| is_word(t)).count(),
                tokens,
                range,
            }
        })
        .collect()
}

/// Group sentences into paragraphs of roughly [`PARAGRAPH_WORDS`] words
pub fn paragraph_tokenize(tokens: &[Token]) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();
    let mut current = Paragraph {
        sentences: Vec::new(),
        word_count: 0,
    };

    for sentence in sentence_tokenize(tokens) {
        if !current.sentences.is_empty() && current.word_count + sentence.word_count > PARAGRAPH_MAX_WORDS {
            paragraphs.push(std::mem::replace(
                &mut current,
                Paragraph {
                    sentences: Vec::new(),
                    word_count: 0,
                },
            ));
        }

        current.word_count += sentence.word_count;
        current.sentences.push(sentence);

        if current.word_count >= PARAGRAPH_WORDS {
            paragraphs.push(std::mem::replace(
                &mut current,
                Paragraph {
                    sentences: Vec::new(),
                    word_count: 0,
                },
            ));
        }
    }

    if !current.sentences.is_empty() {
        paragraphs.push(current);
    }
    paragraphs
}
