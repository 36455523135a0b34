//! Chunking and syllabification for Tibetan text.
//!
//! This module segments text into chunks (syllables, punctuation, foreign runs,
//! whitespace) that can then be processed by the tokenizer. Chunks are produced
//! lazily and always partition the input: concatenating their spans gives back
//! the original string.

use unicode_normalization::UnicodeNormalization;

use crate::char_categories::{get_char_category, CharCategory};
use crate::token::ChunkType;

/// A chunk of text with its type and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The syllable text (cleaned, without tsek, NFC) - None for non-syllable chunks
    pub syl: Option<String>,
    /// The type of this chunk
    pub chunk_type: ChunkType,
    /// Starting byte offset in the original string
    pub start: usize,
    /// Length in bytes
    pub len: usize,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(syl: Option<String>, chunk_type: ChunkType, start: usize, len: usize) -> Self {
        Chunk {
            syl,
            chunk_type,
            start,
            len,
        }
    }

    /// Byte offset one past the end of the chunk
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// The slice of `source` this chunk covers
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end()]
    }
}

/// Normalize a syllable the way trie keys are normalized.
pub(crate) fn normalize_syl(syl: &str) -> String {
    syl.nfc().collect()
}

/// Chunker for Tibetan text
#[derive(Debug, Clone, Copy)]
pub struct Chunker<'a> {
    text: &'a str,
    spaces_as_punct: bool,
}

impl<'a> Chunker<'a> {
    /// Create a new chunker for the given string
    pub fn new(text: &'a str) -> Self {
        Chunker {
            text,
            spaces_as_punct: false,
        }
    }

    /// Emit every whitespace run as its own chunk instead of attaching it to
    /// the preceding chunk. Whitespace then also ends a syllable.
    pub fn spaces_as_punct(mut self, enabled: bool) -> Self {
        self.spaces_as_punct = enabled;
        self
    }

    /// Get the original string
    pub fn string(&self) -> &'a str {
        self.text
    }

    /// Lazily iterate over the chunks
    pub fn chunks(&self) -> Chunks<'a> {
        Chunks {
            text: self.text,
            pos: 0,
            spaces_as_punct: self.spaces_as_punct,
        }
    }

    /// Chunk the text into syllables, punctuation, etc.
    pub fn make_chunks(&self) -> Vec<Chunk> {
        self.chunks().collect()
    }
}

/// Iterator over the chunks of a string. Cloning it restarts from the
/// clone's position.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    pos: usize,
    spaces_as_punct: bool,
}

impl<'a> Chunks<'a> {
    fn peek(&self) -> Option<(char, CharCategory)> {
        self.text[self.pos..]
            .chars()
            .next()
            .map(|c| (c, get_char_category(c)))
    }

    /// Advance past every character whose category satisfies `keep`.
    fn skip_while<F>(&mut self, keep: F)
    where
        F: Fn(CharCategory) -> bool,
    {
        while let Some((c, cat)) = self.peek() {
            if !keep(cat) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    /// Advance past a run of `category`, with interior whitespace unless
    /// spaces are chunks of their own.
    fn skip_run(&mut self, category: CharCategory) {
        let spaces_inside = !self.spaces_as_punct;
        self.skip_while(|cat| cat == category || (spaces_inside && cat == CharCategory::Transparent));
    }

    /// Read a Tibetan syllable, returning its cleaned text
    fn read_syllable(&mut self) -> String {
        let mut syl = String::new();

        while let Some((c, cat)) = self.peek() {
            match cat {
                cat if cat.is_syllable_part() => {
                    syl.push(c);
                    self.pos += c.len_utf8();
                }

                // Tsek ends the syllable; doubled tseks stay with it
                CharCategory::Tsek => {
                    self.skip_while(|cat| cat == CharCategory::Tsek);
                    break;
                }

                // A space inside a syllable is kept when more syllable follows
                CharCategory::Transparent if !self.spaces_as_punct => {
                    self.pos += c.len_utf8();
                    match self.peek() {
                        Some((_, next)) if next.is_syllable_part() => continue,
                        _ => break,
                    }
                }

                _ => break,
            }
        }

        normalize_syl(&syl)
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let start = self.pos;
        let (_, cat) = self.peek()?;

        let (chunk_type, syl) = match cat {
            cat if cat.is_syllable_part() => (ChunkType::Text, Some(self.read_syllable())),

            // Tsek with no syllable before it
            CharCategory::Tsek => {
                self.skip_while(|cat| cat == CharCategory::Tsek);
                (ChunkType::Punct, None)
            }

            CharCategory::NormalPunct | CharCategory::SpecialPunct => {
                let spaces_inside = !self.spaces_as_punct;
                self.skip_while(|cat| {
                    cat.is_punct() || (spaces_inside && cat == CharCategory::Transparent)
                });
                (ChunkType::Punct, None)
            }

            CharCategory::Numeral => {
                self.skip_run(CharCategory::Numeral);
                (ChunkType::Num, None)
            }

            CharCategory::Symbol => {
                self.skip_run(CharCategory::Symbol);
                (ChunkType::Sym, None)
            }

            CharCategory::Latin => {
                self.skip_run(CharCategory::Latin);
                (ChunkType::Latin, None)
            }

            CharCategory::Cjk => {
                self.skip_run(CharCategory::Cjk);
                (ChunkType::Cjk, None)
            }

            // Whitespace that follows no chunk
            CharCategory::Transparent => {
                self.skip_while(|cat| cat == CharCategory::Transparent);
                return Some(Chunk::new(None, ChunkType::Space, start, self.pos - start));
            }

            _ => {
                self.skip_run(CharCategory::Other);
                (ChunkType::Other, None)
            }
        };

        // Trailing whitespace belongs to the chunk it follows
        if !self.spaces_as_punct {
            self.skip_while(|cat| cat == CharCategory::Transparent);
        }

        Some(Chunk::new(syl, chunk_type, start, self.pos - start))
    }
}

/// Chunk `text` with default settings
pub fn chunk(text: &str) -> Vec<Chunk> {
    Chunker::new(text).make_chunks()
}

/// Lazily yield the cleaned syllables of `text`, skipping everything that is
/// not a Tibetan syllable.
pub fn get_syls(text: &str) -> Syllables<'_> {
    Syllables {
        chunks: Chunker::new(text).chunks(),
    }
}

/// Iterator returned by [`get_syls`]. Clone it to iterate again.
#[derive(Debug, Clone)]
pub struct Syllables<'a> {
    chunks: Chunks<'a>,
}

impl<'a> Iterator for Syllables<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.chunks.by_ref().find_map(|chunk| chunk.syl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rebuild(text: &str, chunks: &[Chunk]) -> String {
        chunks.iter().map(|c| c.text(text)).collect()
    }

    #[test]
    fn test_simple_syllables() {
        let chunker = Chunker::new("བཀྲ་ཤིས་");
        let chunks = chunker.make_chunks();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].syl, Some("བཀྲ".to_string()));
        assert_eq!(chunks[0].chunk_type, ChunkType::Text);
        assert_eq!(chunks[1].syl, Some("ཤིས".to_string()));
    }

    #[test]
    fn test_with_punctuation() {
        let chunks = chunk("བཀྲ་ཤིས།");

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].syl, Some("བཀྲ".to_string()));
        assert_eq!(chunks[1].syl, Some("ཤིས".to_string()));
        assert_eq!(chunks[2].chunk_type, ChunkType::Punct);
    }

    #[test]
    fn test_mixed_content() {
        let text = "བཀྲ་ཤིས། hello 123 就到";
        let chunks = chunk(text);

        assert_eq!(chunks[0].chunk_type, ChunkType::Text);
        assert!(chunks.iter().any(|c| c.chunk_type == ChunkType::Latin));
        assert!(chunks.iter().any(|c| c.chunk_type == ChunkType::Cjk));
        assert_eq!(rebuild(text, &chunks), text);
    }

    #[test]
    fn test_latin_run_is_one_chunk() {
        let text = "hello world, 42";
        let chunks = chunk(text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_type, ChunkType::Latin);
        assert_eq!(chunks[0].len, text.len());
    }

    #[test]
    fn test_chunk_positions() {
        let text = "བཀྲ་";
        let chunks = chunk(text);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text(text), "བཀྲ་");
    }

    #[test]
    fn test_empty_input() {
        assert!(chunk("").is_empty());
        assert_eq!(get_syls("").count(), 0);
    }

    #[test]
    fn test_no_delimiter_is_single_chunk() {
        let chunks = chunk("བཀྲ");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].syl.as_deref(), Some("བཀྲ"));
    }

    #[test]
    fn test_leading_space_is_kept() {
        let text = "  བཀྲ་";
        let chunks = chunk(text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chunk_type, ChunkType::Space);
        assert_eq!(chunks[0].text(text), "  ");
        assert_eq!(rebuild(text, &chunks), text);
    }

    #[test]
    fn test_consecutive_tseks_attach_to_syllable() {
        let text = "བདེ་་ལེགས";
        let chunks = chunk(text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text(text), "བདེ་་");
        assert!(chunks.iter().all(|c| c.len > 0));
    }

    #[test]
    fn test_spaces_as_punct() {
        let text = "བཀྲ་ཤིས་ བདེ";
        let chunks = Chunker::new(text).spaces_as_punct(true).make_chunks();
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[2].chunk_type, ChunkType::Space);
        assert_eq!(chunks[2].text(text), " ");
        assert_eq!(rebuild(text, &chunks), text);
    }

    #[test]
    fn test_get_syls_is_restartable() {
        let syls = get_syls("བཀྲ་ཤིས། hello བདེ་ལེགས");
        let first: Vec<String> = syls.clone().collect();
        let second: Vec<String> = syls.collect();
        assert_eq!(first, vec!["བཀྲ", "ཤིས", "བདེ", "ལེགས"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_syllable_key_is_nfc() {
        // U+0F43 decomposes to U+0F42 U+0FB7 under NFC
        let chunks = chunk("\u{0F43}་");
        assert_eq!(chunks[0].syl.as_deref(), Some("\u{0F42}\u{0FB7}"));
        assert_eq!(chunks[0].len, "\u{0F43}་".len());
    }
}
