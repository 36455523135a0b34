//! Dialect pack cache tests, served from a local mirror.

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use sha2::{Digest, Sha256};
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::ZipWriter;

use tsheg::{
    MirrorSource, PackCache, PackError, PackManifest, Pos, TokenizerConfig, TokenizerError,
    WordTokenizer,
};

const WORDS: &str = "བཀྲ་ཤིས\tNOUN\t\t\t1000\nབདེ་ལེགས\tNOUN\t\t\t500\n";

/// Zip `files` (path, content), optionally under a top-level `prefix/`.
fn build_zip(prefix: Option<&str>, files: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();

    if let Some(prefix) = prefix {
        zip.add_directory(format!("{}/", prefix), options).unwrap();
    }
    for (path, content) in files {
        let name = match prefix {
            Some(prefix) => format!("{}/{}", prefix, path),
            None => path.to_string(),
        };
        zip.start_file(name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }

    zip.finish().unwrap().into_inner()
}

fn general_pack() -> Vec<u8> {
    build_zip(Some("general"), &[("dictionary/words.tsv", WORDS)])
}

/// Publish an archive in the mirror, with its checksum file when `sha256` is
/// given.
fn publish(mirror: &Path, version: &str, name: &str, archive: &[u8], sha256: Option<&str>) {
    let dir = mirror.join(version);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{}.zip", name)), archive).unwrap();
    if let Some(sha256) = sha256 {
        fs::write(
            dir.join(format!("{}.zip.sha256", name)),
            format!("{}  {}.zip\n", sha256, name),
        )
        .unwrap();
    }
}

fn sha256(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

struct Fixture {
    mirror: TempDir,
    cache_dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Fixture {
            mirror: tempfile::tempdir().unwrap(),
            cache_dir: tempfile::tempdir().unwrap(),
        };
        let archive = general_pack();
        publish(fixture.mirror.path(), "v1", "general", &archive, Some(&sha256(&archive)));
        fixture
    }

    fn cache(&self) -> PackCache {
        PackCache::new(self.cache_dir.path(), MirrorSource::new(self.mirror.path()))
    }
}

fn dir_is_empty(path: &Path) -> bool {
    fs::read_dir(path).map(|mut d| d.next().is_none()).unwrap_or(true)
}

#[test]
fn test_download_is_idempotent() {
    let fixture = Fixture::new();
    let cache = fixture.cache();

    assert!(!cache.dialect_pack_exists("general"));

    let first = cache.download_dialect_pack("general").unwrap();
    assert!(cache.dialect_pack_exists("general"));
    let manifest = PackManifest::read(&first).unwrap();

    let second = cache.download_dialect_pack("general").unwrap();
    assert_eq!(first, second);
    assert!(cache.dialect_pack_exists("general"));
    assert!(cache.verify_dialect_pack("general").unwrap());
    assert_eq!(PackManifest::read(&second), Some(manifest));

    // Only the pack itself is left in the cache root
    let entries: Vec<_> = fs::read_dir(fixture.cache_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec!["general"]);
    assert_eq!(cache.cached_versions("general"), vec!["v1"]);
}

#[test]
fn test_pack_path_is_deterministic() {
    let fixture = Fixture::new();
    let cache = fixture.cache();

    let expected = fixture.cache_dir.path().join("general").join("v1");
    assert_eq!(cache.dialect_pack_path("general", "v1").unwrap(), expected);
    assert_eq!(cache.download_dialect_pack("general").unwrap(), expected);
}

#[test]
fn test_manifest_contents() {
    let fixture = Fixture::new();
    let path = fixture.cache().download_dialect_pack("general").unwrap();

    let manifest = PackManifest::read(&path).unwrap();
    assert_eq!(manifest.name, "general");
    assert_eq!(manifest.version, "v1");
    assert_eq!(manifest.archive_sha256, sha256(&general_pack()));
    assert_eq!(
        manifest.files.keys().collect::<Vec<_>>(),
        vec!["dictionary/words.tsv"]
    );
}

#[test]
fn test_checksum_mismatch_leaves_nothing() {
    let fixture = Fixture::new();
    publish(
        fixture.mirror.path(),
        "v1",
        "general",
        &general_pack(),
        Some(&"0".repeat(64)),
    );
    let cache = fixture.cache();

    let err = cache.download_dialect_pack("general").unwrap_err();
    assert!(matches!(err, PackError::ChecksumMismatch { .. }));
    assert!(!err.is_retryable());
    assert!(!cache.dialect_pack_exists("general"));
    assert!(dir_is_empty(fixture.cache_dir.path()));
}

#[test]
fn test_archive_without_dictionary_is_rejected() {
    let fixture = Fixture::new();
    let archive = build_zip(None, &[("README.md", "nothing here")]);
    publish(fixture.mirror.path(), "v2", "general", &archive, None);
    let cache = fixture.cache();

    let err = cache.download_dialect_pack("general").unwrap_err();
    assert!(matches!(err, PackError::Archive(_)));
    assert!(dir_is_empty(fixture.cache_dir.path()));
}

#[test]
fn test_corrupt_cache_is_fetched_again() {
    let fixture = Fixture::new();
    let cache = fixture.cache();
    let path = cache.get_dialect_pack("general").unwrap();

    let words = path.join("dictionary").join("words.tsv");
    fs::write(&words, "ཀ\tNOUN\n").unwrap();
    assert!(!cache.verify_dialect_pack("general").unwrap());

    let again = cache.get_dialect_pack("general").unwrap();
    assert_eq!(again, path);
    assert!(cache.verify_dialect_pack("general").unwrap());
    assert_eq!(fs::read_to_string(&words).unwrap(), WORDS);
}

#[test]
fn test_missing_manifest_is_not_a_pack() {
    let fixture = Fixture::new();
    let cache = fixture.cache();

    let dictionary = fixture
        .cache_dir
        .path()
        .join("general")
        .join("v1")
        .join("dictionary");
    fs::create_dir_all(&dictionary).unwrap();
    fs::write(dictionary.join("words.tsv"), "ཀ\tNOUN\n").unwrap();

    assert!(!cache.dialect_pack_exists("general"));
    cache.get_dialect_pack("general").unwrap();
    assert!(cache.verify_dialect_pack("general").unwrap());
}

#[test]
fn test_latest_and_pinned_versions() {
    let fixture = Fixture::new();
    let newer = build_zip(
        None,
        &[("dictionary/words.tsv", "བཀྲ་ཤིས\tNOUN\nཀཀ\tVERB\n")],
    );
    publish(fixture.mirror.path(), "v10", "general", &newer, None);

    let pinned = fixture.cache().with_version("v1");
    let path = pinned.get_dialect_pack("general").unwrap();
    assert_eq!(PackManifest::read(&path).unwrap().version, "v1");

    let latest = fixture.cache();
    let newest = latest.download_dialect_pack("general").unwrap();
    assert_ne!(newest, path);
    assert_eq!(PackManifest::read(&newest).unwrap().version, "v10");

    // Both versions stay cached side by side
    assert_eq!(PackManifest::read(&path).unwrap().version, "v1");
    assert!(pinned.verify_dialect_pack("general").unwrap());
    assert_eq!(latest.cached_versions("general"), vec!["v1", "v10"]);
    assert_eq!(latest.cached_version("general").as_deref(), Some("v10"));
    assert_eq!(pinned.cached_version("general").as_deref(), Some("v1"));
}

#[test]
fn test_reader_keeps_files_while_newer_version_is_published() {
    let fixture = Fixture::new();
    let v2 = build_zip(
        Some("general"),
        &[("dictionary/a.tsv", WORDS), ("dictionary/b.tsv", "ཀཀ\tVERB\n")],
    );
    publish(fixture.mirror.path(), "v2", "general", &v2, None);
    let v3 = build_zip(Some("general"), &[("dictionary/a.tsv", WORDS)]);
    publish(fixture.mirror.path(), "v3", "general", &v3, None);

    // A reader holding v2 has listed its files but read only some of them
    let reader = fixture.cache().with_version("v2");
    let path = reader.get_dialect_pack("general").unwrap();
    let files = tsheg::dialect_pack::list_dictionary_files(&path).unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(fs::read_to_string(&files[0]).unwrap(), WORDS);

    // Another process publishes v3 in the meantime
    let newer = fixture.cache().with_version("v3").get_dialect_pack("general").unwrap();
    assert_ne!(newer, path);
    assert_eq!(tsheg::dialect_pack::list_dictionary_files(&newer).unwrap().len(), 1);

    // The rest of v2 is still there
    assert_eq!(fs::read_to_string(&files[1]).unwrap(), "ཀཀ\tVERB\n");
    assert!(reader.dialect_pack_exists("general"));
    assert!(reader.verify_dialect_pack("general").unwrap());
}

#[test]
fn test_pinned_caches_do_not_evict_each_other() {
    let fixture = Fixture::new();
    let newer = build_zip(None, &[("dictionary/words.tsv", "ཀཀ\tVERB\n")]);
    publish(fixture.mirror.path(), "v2", "general", &newer, None);

    let old = fixture.cache().with_version("v1");
    let new = fixture.cache().with_version("v2");
    let old_path = old.get_dialect_pack("general").unwrap();
    new.get_dialect_pack("general").unwrap();

    // v1 is no longer downloadable, so it must be served from the cache
    fs::remove_dir_all(fixture.mirror.path().join("v1")).unwrap();
    for _ in 0..2 {
        assert_eq!(old.get_dialect_pack("general").unwrap(), old_path);
        new.get_dialect_pack("general").unwrap();
    }
    assert_eq!(fixture.cache().cached_versions("general"), vec!["v1", "v2"]);
}

#[test]
fn test_unpinned_cache_serves_newest_cached_version() {
    let fixture = Fixture::new();
    fixture.cache().with_version("v1").get_dialect_pack("general").unwrap();
    let newer = build_zip(None, &[("dictionary/words.tsv", "ཀཀ\tVERB\n")]);
    publish(fixture.mirror.path(), "v3", "general", &newer, None);
    let v3 = fixture.cache().with_version("v3").get_dialect_pack("general").unwrap();

    // No network access needed once something is cached
    let offline = PackCache::offline(fixture.cache_dir.path());
    assert_eq!(offline.get_dialect_pack("general").unwrap(), v3);
}

#[test]
fn test_prune_keeps_served_version() {
    let fixture = Fixture::new();
    let newer = build_zip(None, &[("dictionary/words.tsv", "ཀཀ\tVERB\n")]);
    publish(fixture.mirror.path(), "v2", "general", &newer, None);

    let old = fixture.cache().with_version("v1");
    let old_path = old.get_dialect_pack("general").unwrap();
    fixture.cache().download_dialect_pack("general").unwrap();

    assert_eq!(old.prune_dialect_pack("general").unwrap(), vec!["v2"]);
    assert_eq!(fixture.cache().cached_versions("general"), vec!["v1"]);
    assert!(old_path.join("dictionary").join("words.tsv").is_file());
}

#[test]
fn test_unknown_pack() {
    let fixture = Fixture::new();
    let err = fixture.cache().download_dialect_pack("classical").unwrap_err();
    assert!(matches!(err, PackError::NotFound(_)));
}

#[test]
fn test_remove_dialect_pack() {
    let fixture = Fixture::new();
    let cache = fixture.cache();
    cache.download_dialect_pack("general").unwrap();

    assert!(cache.remove_dialect_pack("general").unwrap());
    assert!(!cache.dialect_pack_exists("general"));
    assert!(!cache.remove_dialect_pack("general").unwrap());
}

#[test]
fn test_concurrent_downloads() {
    let fixture = Fixture::new();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| fixture.cache().download_dialect_pack("general")))
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
    });

    assert!(fixture.cache().verify_dialect_pack("general").unwrap());
}

#[test]
fn test_tokenizer_downloads_on_first_use() {
    let fixture = Fixture::new();
    let config = TokenizerConfig::default();
    let tokenizer = WordTokenizer::with_cache(config, fixture.cache()).unwrap();

    assert!(tokenizer.trie().is_none());
    let tokens = tokenizer.tokenize("བཀྲ་ཤིས་བདེ་ལེགས།").unwrap();

    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[0].pos, Some(Pos::Noun));
    assert!(fixture.cache().dialect_pack_exists("general"));
}

#[test]
fn test_two_step_construction() {
    let fixture = Fixture::new();
    let path = fixture.cache().get_dialect_pack("general").unwrap();

    let config = TokenizerConfig::default().auto_download(false);
    let tokenizer = WordTokenizer::from_dialect_pack(&path, config).unwrap();
    let tokens = tokenizer.tokenize("བདེ་ལེགས").unwrap();

    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].pos, Some(Pos::Noun));
}

#[test]
fn test_adjustments() {
    let fixture = Fixture::new();
    let archive = build_zip(
        Some("general"),
        &[
            ("dictionary/words.tsv", WORDS),
            ("adjustments/words/extra.tsv", "ཀཀ\tVERB\n"),
            ("adjustments/remove/wrong.tsv", "བདེ་ལེགས\n"),
        ],
    );
    publish(fixture.mirror.path(), "v2", "general", &archive, Some(&sha256(&archive)));

    let path = fixture.cache().get_dialect_pack("general").unwrap();
    let tokenizer = WordTokenizer::from_dialect_pack(&path, TokenizerConfig::default()).unwrap();
    let trie = tokenizer.trie().unwrap();

    assert!(trie.has_word(&["བཀྲ", "ཤིས"]));
    assert!(trie.has_word(&["ཀཀ"]));
    assert!(!trie.has_word(&["བདེ", "ལེགས"]));
}

#[test]
fn test_offline_cache_without_pack() {
    let dir = tempfile::tempdir().unwrap();
    let config = TokenizerConfig::default();
    let tokenizer = WordTokenizer::with_cache(config, PackCache::offline(dir.path())).unwrap();

    let err = tokenizer.tokenize("བཀྲ་ཤིས").unwrap_err();
    assert!(matches!(err, TokenizerError::Pack(PackError::NoSource(_))));
}

#[test]
fn test_auto_download_disabled() {
    let fixture = Fixture::new();
    let config = TokenizerConfig::default().auto_download(false);
    let tokenizer = WordTokenizer::with_cache(config, fixture.cache()).unwrap();

    assert!(matches!(
        tokenizer.tokenize("བཀྲ་ཤིས"),
        Err(TokenizerError::NoDictionary)
    ));
    assert!(!fixture.cache().dialect_pack_exists("general"));
}
