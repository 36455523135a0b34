//! Token post-processing and modification.
//!
//! This module provides functions to modify tokens after initial tokenization,
//! including splitting affixed particles, merging dagdra, and generating lemmas.
//! Every modifier keeps the token sequence a partition of the input.

use crate::char_categories::get_char_category;
use crate::chunker::normalize_syl;
use crate::config::TokenizeOptions;
use crate::pos::Pos;
use crate::syllable::{is_dagdra, Affixation};
use crate::token::{ChunkType, Provenance, Token};

/// Split tokens whose dictionary form carries a fused particle.
///
/// The host keeps the dictionary attributes; the particle becomes a `PART`
/// token of its own (e.g. "རྒྱལ་པོས" -> "རྒྱལ་པོ" + "ས").
pub fn split_affixed(tokens: &mut Vec<Token>) {
    let mut i = 0;
    while i < tokens.len() {
        if let Some((host, particle)) = split_token_at_affix(&tokens[i]) {
            tokens[i] = host;
            tokens.insert(i + 1, particle);
            i += 1; // Skip the newly inserted particle
        }
        i += 1;
    }
}

/// Byte offset in `text` where the last `affix_chars` syllable characters
/// begin, ignoring trailing tseks and spaces.
fn affix_offset(text: &str, affix_chars: usize) -> Option<usize> {
    let is_syl = |c: char| get_char_category(c).is_syllable_part();
    let mut chars = text.char_indices().rev().skip_while(|&(_, c)| !is_syl(c));

    let mut offset = None;
    for _ in 0..affix_chars {
        let (idx, c) = chars.next()?;
        if !is_syl(c) {
            return None;
        }
        offset = Some(idx);
    }
    offset.filter(|&idx| idx > 0)
}

/// Split a token at the affix boundary, if it is an affixed dictionary match.
fn split_token_at_affix(token: &Token) -> Option<(Token, Token)> {
    if token.provenance != Provenance::Dictionary {
        return None;
    }
    let Affixation { rule, aa } = token.affixation?;

    let split = affix_offset(&token.text, rule.len())?;
    let (host_text, particle_text) = token.text.split_at(split);

    let particle_syl: String = particle_text
        .chars()
        .filter(|&c| get_char_category(c).is_syllable_part())
        .collect();
    if normalize_syl(&particle_syl) != rule.suffix() {
        return None;
    }

    let mut host_syls = token.syls.clone();
    let last = host_syls.pop()?;
    let stem = last.strip_suffix(rule.suffix())?;
    if !stem.is_empty() {
        host_syls.push(stem.to_string());
    }
    if host_syls.is_empty() {
        return None;
    }

    let mut host = Token::with_text(host_text.to_string(), token.start, split, ChunkType::Text);
    host.syls = host_syls;
    host.pos = token.pos;
    host.freq = token.freq;
    host.is_skrt = token.is_skrt;
    host.senses = token.senses.clone();
    host.affixation = token.affixation;
    host.provenance = Provenance::AffixSplit;
    host.is_affix_host = true;
    host.lemma = token.lemma.clone().or_else(|| {
        let mut lemma = host.text_cleaned();
        if aa {
            lemma.push('འ');
        }
        Some(lemma)
    });

    let mut particle = Token::with_text(
        particle_text.to_string(),
        token.start + split,
        token.len - split,
        ChunkType::Text,
    );
    particle.syls = vec![particle_syl];
    particle.pos = Some(Pos::Part);
    particle.lemma = Some(rule.lemma().to_string());
    particle.provenance = Provenance::AffixSplit;
    particle.is_affix = true;

    Some((host, particle))
}

/// Whether `token` is a dictionary word a dagdra may attach to
fn can_host_dagdra(token: &Token) -> bool {
    token.chunk_type == ChunkType::Text
        && !token.is_affix
        && matches!(
            token.provenance,
            Provenance::Dictionary | Provenance::AffixSplit
        )
}

/// Merge dagdra particles (པ་/པོ་/བ་/བོ་) with the preceding dictionary word.
///
/// In Tibetan, these particles are often written separately but should be
/// considered part of the preceding word for many NLP tasks.
pub fn merge_dagdra(tokens: &mut Vec<Token>) {
    let mut i = 0;
    while i + 1 < tokens.len() {
        let next = &tokens[i + 1];
        let mergeable = can_host_dagdra(&tokens[i])
            && next.chunk_type == ChunkType::Text
            && !next.is_affix
            && next.syls.len() == 1
            && is_dagdra(&next.syls[0]);

        if mergeable {
            let second = tokens.remove(i + 1);
            merge_into(&mut tokens[i], second);
            // Stay on i: the merged token may take another dagdra
        } else {
            i += 1;
        }
    }
}

/// Append `second` to `first`
fn merge_into(first: &mut Token, second: Token) {
    first.text.push_str(&second.text);
    first.len += second.len;
    first.syls.extend(second.syls);
    first.has_merged_dagdra = true;
    first.lemma = Some(first.text_cleaned());
}

/// Generate default lemmas for tokens that don't have one.
///
/// The default lemma is the cleaned text (syllables joined with tsek).
pub fn generate_default_lemmas(tokens: &mut [Token]) {
    for token in tokens.iter_mut() {
        if token.lemma.is_none() && !token.syls.is_empty() {
            token.lemma = Some(token.text_cleaned());
        }
    }
}

/// Apply the enabled post-processing steps, in order: affix split, dagdra
/// merge, default lemmas.
pub fn apply_all_modifiers(tokens: &mut Vec<Token>, options: &TokenizeOptions) {
    if options.split_affixes {
        split_affixed(tokens);
    }
    if options.merge_dagdra {
        merge_dagdra(tokens);
    }
    generate_default_lemmas(tokens);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syllable::AffixRule;

    fn word(text: &str, start: usize, syls: &[&str], provenance: Provenance) -> Token {
        let mut token = Token::with_text(text.to_string(), start, text.len(), ChunkType::Text);
        token.syls = syls.iter().map(|s| s.to_string()).collect();
        token.provenance = provenance;
        token
    }

    #[test]
    fn test_split_affixed() {
        let mut token = word("རྒྱལ་པོས་", 0, &["རྒྱལ", "པོས"], Provenance::Dictionary);
        token.pos = Some(Pos::Noun);
        token.lemma = Some("རྒྱལ་པོ".to_string());
        token.affixation = Some(Affixation { rule: AffixRule::Gis, aa: false });
        let mut tokens = vec![token];

        split_affixed(&mut tokens);

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "རྒྱལ་པོ");
        assert_eq!(tokens[0].syls, vec!["རྒྱལ", "པོ"]);
        assert!(tokens[0].is_affix_host);
        assert_eq!(tokens[0].provenance, Provenance::AffixSplit);
        assert_eq!(tokens[1].text, "ས་");
        assert_eq!(tokens[1].start, tokens[0].end());
        assert_eq!(tokens[1].end(), "རྒྱལ་པོས་".len());
        assert_eq!(tokens[1].pos, Some(Pos::Part));
        assert_eq!(tokens[1].lemma.as_deref(), Some("གིས"));
        assert!(tokens[1].is_affix);
    }

    #[test]
    fn test_split_restores_aa_in_lemma() {
        let mut token = word("དགའི", 0, &["དགའི"], Provenance::Dictionary);
        token.affixation = Some(Affixation { rule: AffixRule::Gi, aa: true });
        let mut tokens = vec![token];

        split_affixed(&mut tokens);

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "དག");
        assert_eq!(tokens[0].lemma.as_deref(), Some("དགའ"));
        assert_eq!(tokens[1].text, "འི");
    }

    #[test]
    fn test_affix_without_host_is_not_split() {
        let mut token = word("ར་", 0, &["ར"], Provenance::Dictionary);
        token.affixation = Some(Affixation { rule: AffixRule::La, aa: false });
        let mut tokens = vec![token];

        split_affixed(&mut tokens);
        assert_eq!(tokens.len(), 1);
    }

    #[test]
    fn test_merge_dagdra() {
        let mut tokens = vec![
            word("བཀྲ་ཤིས་", 0, &["བཀྲ", "ཤིས"], Provenance::Dictionary),
            word("པ་", 24, &["པ"], Provenance::Unknown),
        ];

        merge_dagdra(&mut tokens);

        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].has_merged_dagdra);
        assert_eq!(tokens[0].syls.len(), 3);
        assert_eq!(tokens[0].len, 30);
        assert_eq!(tokens[0].lemma.as_deref(), Some("བཀྲ་ཤིས་པ"));
    }

    #[test]
    fn test_dagdra_after_unknown_stays() {
        let mut tokens = vec![
            word("ཀཀ་", 0, &["ཀཀ"], Provenance::Unknown),
            word("པ་", 9, &["པ"], Provenance::Unknown),
        ];

        merge_dagdra(&mut tokens);
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_generate_default_lemmas() {
        let mut tokens = vec![word("བཀྲ་ཤིས་", 0, &["བཀྲ", "ཤིས"], Provenance::Unknown)];

        generate_default_lemmas(&mut tokens);

        assert_eq!(tokens[0].lemma.as_deref(), Some("བཀྲ་ཤིས"));
    }
}
