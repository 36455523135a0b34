//! Part-of-speech tags.
//!
//! The tag set is the Universal Dependencies inventory plus the three
//! markers Tibetan dictionaries use for words without a real tag.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A part-of-speech tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Pos {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    X,
    /// Known word whose tag is not recorded
    NoPos,
    /// Entry that is not a word by itself (e.g. a bound syllable)
    NonWord,
    /// Out-of-vocabulary marker
    Oov,
}

impl Pos {
    /// Every tag, in declaration order.
    pub const ALL: [Pos; 20] = [
        Pos::Adj,
        Pos::Adp,
        Pos::Adv,
        Pos::Aux,
        Pos::Cconj,
        Pos::Det,
        Pos::Intj,
        Pos::Noun,
        Pos::Num,
        Pos::Part,
        Pos::Pron,
        Pos::Propn,
        Pos::Punct,
        Pos::Sconj,
        Pos::Sym,
        Pos::Verb,
        Pos::X,
        Pos::NoPos,
        Pos::NonWord,
        Pos::Oov,
    ];

    /// The tag as written in dictionary files
    pub fn as_str(&self) -> &'static str {
        match self {
            Pos::Adj => "ADJ",
            Pos::Adp => "ADP",
            Pos::Adv => "ADV",
            Pos::Aux => "AUX",
            Pos::Cconj => "CCONJ",
            Pos::Det => "DET",
            Pos::Intj => "INTJ",
            Pos::Noun => "NOUN",
            Pos::Num => "NUM",
            Pos::Part => "PART",
            Pos::Pron => "PRON",
            Pos::Propn => "PROPN",
            Pos::Punct => "PUNCT",
            Pos::Sconj => "SCONJ",
            Pos::Sym => "SYM",
            Pos::Verb => "VERB",
            Pos::X => "X",
            Pos::NoPos => "NO_POS",
            Pos::NonWord => "NON_WORD",
            Pos::Oov => "OOV",
        }
    }
}

/// Returned when a string is not a known tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPos(pub String);

impl FromStr for Pos {
    type Err = UnknownPos;

    /// Tags are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Pos::ALL
            .iter()
            .find(|pos| pos.as_str() == upper)
            .copied()
            .ok_or_else(|| UnknownPos(s.to_string()))
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("NOUN".parse::<Pos>(), Ok(Pos::Noun));
        assert_eq!("verb".parse::<Pos>(), Ok(Pos::Verb));
        assert_eq!("NO_POS".parse::<Pos>(), Ok(Pos::NoPos));
        assert_eq!(
            "PHRASE".parse::<Pos>(),
            Err(UnknownPos("PHRASE".to_string()))
        );
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for pos in Pos::ALL {
            let json = serde_json::to_string(&pos).unwrap();
            assert_eq!(json, format!("\"{}\"", pos.as_str()));
        }
    }
}
