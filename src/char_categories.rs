//! Character classification for Tibetan Unicode characters.
//!
//! Every character of a string falls into exactly one [`CharCategory`]. The
//! chunker relies on this to decide where syllables, punctuation and foreign
//! runs begin and end.

/// Character categories used in Tibetan text processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CharCategory {
    /// Tibetan consonant
    Cons,
    /// Sub-joined consonant (used in consonant clusters)
    SubCons,
    /// Tibetan vowel sign
    Vow,
    /// Tsek (syllable separator ་)
    Tsek,
    /// Normal punctuation (shad, etc.)
    NormalPunct,
    /// Special punctuation (head marks, brackets, gter tsheg)
    SpecialPunct,
    /// Tibetan numeral
    Numeral,
    /// Symbol
    Symbol,
    /// Whitespace
    Transparent,
    /// Sanskrit vowel
    SkrtVow,
    /// Sanskrit consonant
    SkrtCons,
    /// Sanskrit sub-joined consonant
    SkrtSubCons,
    /// Sanskrit long vowel (visarga ཿ)
    SkrtLongVow,
    /// In-syllable mark
    InSylMark,
    /// Pre-composed letter that NFC decomposes
    Nfc,
    /// Latin character
    Latin,
    /// CJK character
    Cjk,
    /// Other/unknown character
    #[default]
    Other,
}

impl CharCategory {
    /// Check if this category represents a character that can be part of a syllable
    pub fn is_syllable_part(&self) -> bool {
        matches!(
            self,
            CharCategory::Cons
                | CharCategory::SubCons
                | CharCategory::Vow
                | CharCategory::SkrtVow
                | CharCategory::SkrtCons
                | CharCategory::SkrtSubCons
                | CharCategory::SkrtLongVow
                | CharCategory::InSylMark
                | CharCategory::Nfc
        )
    }

    /// Check if this is a Tibetan character (not Latin, CJK, whitespace or Other)
    pub fn is_tibetan(&self) -> bool {
        !matches!(
            self,
            CharCategory::Latin | CharCategory::Cjk | CharCategory::Other | CharCategory::Transparent
        )
    }

    /// Check if this is shad-like punctuation
    pub fn is_punct(&self) -> bool {
        matches!(self, CharCategory::NormalPunct | CharCategory::SpecialPunct)
    }
}

/// List of characters that should be treated as transparent (spaces, etc.)
const TRANSPARENT_CHARS: &[char] = &[
    ' ',        // SPACE
    '\t',       // TAB
    '\n',       // NEWLINE
    '\r',       // CARRIAGE RETURN
    '\u{00A0}', // NO-BREAK SPACE
    '\u{1680}', // OGHAM SPACE MARK
    '\u{2000}', // EN QUAD
    '\u{2001}', // EM QUAD
    '\u{2002}', // EN SPACE
    '\u{2003}', // EM SPACE
    '\u{2004}', // THREE-PER-EM SPACE
    '\u{2005}', // FOUR-PER-EM SPACE
    '\u{2006}', // SIX-PER-EM SPACE
    '\u{2007}', // FIGURE SPACE
    '\u{2008}', // PUNCTUATION SPACE
    '\u{2009}', // THIN SPACE
    '\u{200A}', // HAIR SPACE
    '\u{200B}', // ZERO WIDTH SPACE
    '\u{202F}', // NARROW NO-BREAK SPACE
    '\u{205F}', // MEDIUM MATHEMATICAL SPACE
    '\u{3000}', // IDEOGRAPHIC SPACE
    '\u{FEFF}', // ZERO WIDTH NO-BREAK SPACE
];

/// Get the category of a character
pub fn get_char_category(c: char) -> CharCategory {
    if TRANSPARENT_CHARS.contains(&c) {
        return CharCategory::Transparent;
    }

    if ('\u{0F00}'..='\u{0FFF}').contains(&c) {
        return tibetan_category(c as u32);
    }

    // Basic Latin + Latin-1 Supplement + Latin Extended-A/B + IPA Extensions + Spacing Modifier Letters
    if ('\u{0020}'..='\u{036F}').contains(&c) || ('\u{1E00}'..='\u{20CF}').contains(&c) {
        return CharCategory::Latin;
    }

    if ('\u{4E00}'..='\u{9FFF}').contains(&c)     // CJK Unified Ideographs
        || ('\u{3400}'..='\u{4DBF}').contains(&c) // CJK Unified Ideographs Extension A
        || ('\u{2E80}'..='\u{2EFF}').contains(&c) // CJK Radicals Supplement
        || ('\u{3000}'..='\u{303F}').contains(&c) // CJK Symbols and Punctuation
    {
        return CharCategory::Cjk;
    }

    CharCategory::Other
}

/// Classification of the Tibetan block (U+0F00..U+0FFF).
fn tibetan_category(cp: u32) -> CharCategory {
    use CharCategory::*;

    match cp {
        0x0F00 => Cons,
        0x0F01..=0x0F03 => Symbol,
        0x0F04..=0x0F0A => SpecialPunct,
        0x0F0B | 0x0F0C => Tsek,
        0x0F0D..=0x0F12 => NormalPunct,
        0x0F13 | 0x0F14 => SpecialPunct,
        0x0F15..=0x0F17 => Symbol,
        0x0F18 | 0x0F19 => InSylMark,
        0x0F1A..=0x0F1F => Symbol,
        0x0F20..=0x0F33 => Numeral,
        0x0F34 | 0x0F36 | 0x0F38 => Symbol,
        0x0F35 | 0x0F37 | 0x0F39 => InSylMark,
        0x0F3A..=0x0F3D => SpecialPunct,
        0x0F3E | 0x0F3F => InSylMark,

        // precomposed letters excluded from composition
        0x0F43 | 0x0F4D | 0x0F52 | 0x0F57 | 0x0F5C | 0x0F69 => Nfc,
        0x0F4A..=0x0F4E | 0x0F65 | 0x0F6B | 0x0F6C => SkrtCons,
        0x0F40..=0x0F47 | 0x0F49..=0x0F6A => Cons,

        0x0F73 | 0x0F75..=0x0F79 | 0x0F81 => Nfc,
        0x0F71 | 0x0F7B | 0x0F7D | 0x0F80 => SkrtVow,
        0x0F72 | 0x0F74 | 0x0F7A | 0x0F7C => Vow,
        0x0F7F => SkrtLongVow,
        0x0F7E | 0x0F82..=0x0F84 | 0x0F86 | 0x0F87 => InSylMark,
        0x0F85 => SpecialPunct,
        0x0F88..=0x0F8C => SkrtCons,
        0x0F8D..=0x0F8F => SubCons,

        0x0F93 | 0x0F9D | 0x0FA2 | 0x0FA7 | 0x0FAC | 0x0FB9 => Nfc,
        0x0F9A..=0x0F9C | 0x0F9E | 0x0FB5 | 0x0FBA..=0x0FBC => SkrtSubCons,
        0x0F90..=0x0F97 | 0x0F99..=0x0FBC => SubCons,

        0x0FBE..=0x0FC5 | 0x0FC7..=0x0FCC | 0x0FCE | 0x0FCF => Symbol,
        0x0FC6 => InSylMark,
        0x0FD0 | 0x0FD1 | 0x0FD3 | 0x0FD4 | 0x0FD9 | 0x0FDA => SpecialPunct,
        0x0FD2 => NormalPunct,
        0x0FD5..=0x0FD8 => Symbol,

        _ => Other,
    }
}

/// A string with character category information for each character
#[derive(Debug, Clone)]
pub struct BoString {
    /// The original string
    pub string: String,
    /// Category for each character (by index)
    pub categories: Vec<CharCategory>,
}

impl BoString {
    /// Create a new BoString from a string
    pub fn new(s: &str) -> Self {
        let categories: Vec<CharCategory> = s.chars().map(get_char_category).collect();
        BoString {
            string: s.to_string(),
            categories,
        }
    }

    /// Get the length (number of characters)
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Get the category at a specific index
    pub fn get_category(&self, idx: usize) -> Option<CharCategory> {
        self.categories.get(idx).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CharCategory::*;

    #[test]
    fn test_categories() {
        let cases = [
            ('ཀ', Cons),
            ('འ', Cons),
            ('\u{0F72}', Vow),
            ('\u{0F7C}', Vow),
            ('\u{0FB2}', SubCons),
            ('\u{0F9F}', SubCons),
            ('ཊ', SkrtCons),
            ('\u{0F7F}', SkrtLongVow),
            ('\u{0F43}', Nfc),
            ('་', Tsek),
            ('།', NormalPunct),
            ('༄', SpecialPunct),
            ('༣', Numeral),
            ('\u{3000}', Transparent),
            ('\n', Transparent),
            ('q', Latin),
            ('7', Latin),
            ('藏', Cjk),
            ('я', Other),
            ('\u{0F48}', Other),
        ];
        for (c, expected) in cases {
            assert_eq!(get_char_category(c), expected, "U+{:04X}", c as u32);
        }
    }

    #[test]
    fn test_category_groups() {
        assert!(SubCons.is_syllable_part() && SkrtVow.is_syllable_part());
        assert!(!Tsek.is_syllable_part());
        assert!(get_char_category('༆').is_punct());
        assert!(!Transparent.is_tibetan() && !Latin.is_tibetan());
        assert!(Numeral.is_tibetan());
    }

    #[test]
    fn test_bo_string() {
        let bs = BoString::new("སྒྲ་ a");
        assert_eq!(bs.len(), 6);
        assert_eq!(
            (0..bs.len()).filter_map(|i| bs.get_category(i)).collect::<Vec<_>>(),
            vec![Cons, SubCons, SubCons, Tsek, Transparent, Latin]
        );
        assert_eq!(bs.get_category(6), None);
        assert!(BoString::new("").is_empty());
    }
}
