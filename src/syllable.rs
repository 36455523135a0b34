//! Tibetan syllable analysis and affix system.
//!
//! Case and discourse particles can be written fused to the last syllable of a
//! word (རྒྱལ་པོ + ས = རྒྱལ་པོས). This module knows which particles fuse, which
//! syllables can host them, and how to generate every affixed form of a word.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Tsek character
pub const TSEK: char = '་';

/// The fused particle of an affixed form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AffixRule {
    /// ར, terminative/dative
    La,
    /// ས, agentive
    Gis,
    /// འི, genitive
    Gi,
    /// འམ
    Am,
    /// འང
    Ang,
    /// འོ, final particle
    O,
    /// འིའོ
    GiO,
    /// འིའམ
    GiAm,
    /// འིའང
    GiAng,
    /// འོའམ
    OAm,
    /// འོའང
    OAng,
}

impl AffixRule {
    pub const ALL: [AffixRule; 11] = [
        AffixRule::La,
        AffixRule::Gis,
        AffixRule::Gi,
        AffixRule::Am,
        AffixRule::Ang,
        AffixRule::O,
        AffixRule::GiO,
        AffixRule::GiAm,
        AffixRule::GiAng,
        AffixRule::OAm,
        AffixRule::OAng,
    ];

    /// Identifier used in dictionary files
    pub fn name(&self) -> &'static str {
        match self {
            AffixRule::La => "la",
            AffixRule::Gis => "gis",
            AffixRule::Gi => "gi",
            AffixRule::Am => "am",
            AffixRule::Ang => "ang",
            AffixRule::O => "o",
            AffixRule::GiO => "gi+o",
            AffixRule::GiAm => "gi+am",
            AffixRule::GiAng => "gi+ang",
            AffixRule::OAm => "o+am",
            AffixRule::OAng => "o+ang",
        }
    }

    /// The particle as it is written fused to its host
    pub fn suffix(&self) -> &'static str {
        match self {
            AffixRule::La => "ར",
            AffixRule::Gis => "ས",
            AffixRule::Gi => "འི",
            AffixRule::Am => "འམ",
            AffixRule::Ang => "འང",
            AffixRule::O => "འོ",
            AffixRule::GiO => "འིའོ",
            AffixRule::GiAm => "འིའམ",
            AffixRule::GiAng => "འིའང",
            AffixRule::OAm => "འོའམ",
            AffixRule::OAng => "འོའང",
        }
    }

    /// Length of the particle in characters
    pub fn len(&self) -> usize {
        self.suffix().chars().count()
    }

    /// Dictionary form of the particle
    pub fn lemma(&self) -> &'static str {
        match self {
            AffixRule::La => "ལ",
            AffixRule::Gis => "གིས",
            AffixRule::Gi => "གི",
            AffixRule::Am => "འམ",
            AffixRule::Ang => "འང",
            AffixRule::O => "འོ",
            AffixRule::GiO => "གི་འོ",
            AffixRule::GiAm => "གི་འམ",
            AffixRule::GiAng => "གི་འང",
            AffixRule::OAm => "འོ་འམ",
            AffixRule::OAng => "འོ་འང",
        }
    }
}

impl fmt::Display for AffixRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AffixRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        AffixRule::ALL
            .iter()
            .find(|rule| rule.name() == wanted)
            .copied()
            .ok_or_else(|| s.to_string())
    }
}

/// How a dictionary form was affixed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Affixation {
    pub rule: AffixRule,
    /// Whether the host's final འ was dropped before the particle was added
    pub aa: bool,
}

impl Affixation {
    /// Length of the affix in characters
    pub fn len(&self) -> usize {
        self.rule.len()
    }
}

impl FromStr for Affixation {
    type Err = String;

    /// Parses `rule` or `rule:aa`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (rule, aa) = match s.trim().rsplit_once(':') {
            Some((rule, flag)) if flag.eq_ignore_ascii_case("aa") => (rule, true),
            Some(_) => return Err(s.to_string()),
            None => (s, false),
        };
        let rule = rule.parse::<AffixRule>().map_err(|_| s.to_string())?;
        Ok(Affixation { rule, aa })
    }
}

impl fmt::Display for Affixation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.aa {
            write!(f, "{}:aa", self.rule)
        } else {
            write!(f, "{}", self.rule)
        }
    }
}

/// Syllables that can host a fused particle: a bare root (optionally with
/// subjoined letters), anything ending in a vowel sign or subjoined letter,
/// or anything ending in འ.
static THAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[\x{0F40}-\x{0F6C}][\x{0F90}-\x{0FBC}]*|.*[\x{0F71}-\x{0F84}\x{0F90}-\x{0FBC}]|.+\x{0F60})$",
    )
    .expect("static regex")
});

/// Endings that indicate a syllable already carries a particle or a suffix
/// that blocks affixation
static NON_AFFIXABLE_ENDINGS: &[&str] = &["ར", "ས", "འི", "འོ", "མ", "ང"];

/// Dagdra particles (pa/po/ba/bo)
pub static DAGDRA: &[&str] = &["པ", "པོ", "བ", "བོ"];

/// Check if a syllable (without tsek) can take a fused particle
pub fn is_affixable(syl: &str) -> bool {
    if !THAME.is_match(syl) {
        return false;
    }

    for ending in NON_AFFIXABLE_ENDINGS {
        if syl.len() > ending.len() && syl.ends_with(ending) {
            return false;
        }
    }

    true
}

/// Get all affixed forms of a syllable.
///
/// Returns None if the syllable is not affixable. Otherwise returns
/// `(affixed_form, affixation)` pairs in [`AffixRule::ALL`] order.
pub fn get_all_affixed(syl: &str) -> Option<Vec<(String, Affixation)>> {
    if !is_affixable(syl) {
        return None;
    }

    let (base, aa) = match syl.strip_suffix('འ') {
        Some(base) if !base.is_empty() => (base, true),
        _ => (syl, false),
    };

    Some(
        AffixRule::ALL
            .iter()
            .map(|&rule| (format!("{}{}", base, rule.suffix()), Affixation { rule, aa }))
            .collect(),
    )
}

/// Check if a syllable is a dagdra particle (pa/po/ba/bo)
pub fn is_dagdra(syl: &str) -> bool {
    DAGDRA.contains(&syl.trim_end_matches(TSEK))
}
