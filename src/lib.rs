//! # tsheg
//!
//! A dictionary-driven Tibetan word tokenizer.
//!
//! Text is split into syllables (tsheg-bar), punctuation and foreign runs,
//! then segmented into words by longest match against a syllable trie built
//! from TSV dictionaries. Dictionaries ship as versioned dialect packs that
//! are downloaded once and cached locally.
//!
//! ## Quick Start
//!
//! ```rust
//! use tsheg::{TrieBuilder, WordTokenizer};
//!
//! // Build a trie from TSV data
//! let tsv = "བཀྲ་ཤིས\tNOUN\t\t\t1000\nབདེ་ལེགས\tNOUN\t\t\t500";
//! let mut builder = TrieBuilder::new();
//! let diagnostics = builder.load_tsv(tsv);
//! assert!(diagnostics.is_empty());
//!
//! // Create tokenizer and tokenize text
//! let tokenizer = WordTokenizer::new(builder.build());
//! let tokens = tokenizer.tokenize("བཀྲ་ཤིས་བདེ་ལེགས།").unwrap();
//!
//! for token in &tokens {
//!     println!("{}: {:?}", token.text, token.pos);
//! }
//! ```
//!
//! ## Dialect packs
//!
//! ```no_run
//! use tsheg::{PackCache, TokenizerConfig, WordTokenizer};
//!
//! let config = TokenizerConfig::default();
//! let cache = PackCache::from_config(&config)?;
//! let pack = cache.get_dialect_pack(&config.dialect_name)?;
//! let tokenizer = WordTokenizer::from_dialect_pack(pack, config)?;
//! # Ok::<(), tsheg::TokenizerError>(())
//! ```
//!
//! ## Simple Tokenization (No Dictionary)
//!
//! If you just need syllable-level tokenization without a dictionary:
//!
//! ```rust
//! use tsheg::SimpleTokenizer;
//!
//! let tokens = SimpleTokenizer::tokenize("བཀྲ་ཤིས་བདེ་ལེགས།");
//! assert_eq!(tokens.len(), 5);
//! ```

pub mod char_categories;
pub mod chunker;
pub mod config;
pub mod dialect_pack;
pub mod error;
pub mod modifiers;
pub mod pos;
pub mod sentence;
pub mod syllable;
pub mod token;
pub mod tokenizer;
pub mod trie;

// Re-export main types for convenience
pub use char_categories::{get_char_category, BoString, CharCategory};
pub use chunker::{chunk, get_syls, Chunk, Chunker};
pub use config::{TokenizeOptions, TokenizerConfig};
#[cfg(feature = "download")]
pub use dialect_pack::HttpSource;
pub use dialect_pack::{
    default_base_path, MirrorSource, PackCache, PackManifest, PackSource, DEFAULT_DIALECT_PACK,
};
pub use error::{Diagnostic, DiagnosticKind, PackError, Result, TokenizerError};
pub use pos::Pos;
pub use sentence::{paragraph_tokenize, sentence_tokenize, Paragraph, Sentence};
pub use syllable::{AffixRule, Affixation};
pub use token::{ChunkType, Provenance, Token};
pub use tokenizer::{SimpleTokenizer, WordTokenizer};
pub use trie::{LexicalEntry, Trie, TrieBuilder};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
