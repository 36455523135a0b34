//! Dialect pack downloading and management.
//!
//! A dialect pack is a versioned zip of TSV dictionaries. Packs are fetched
//! from a [`PackSource`] and cached under `<base>/<name>/<version>/` by a
//! [`PackCache`]. Every published pack carries a manifest with the hash of
//! each file, so a corrupt cache is detected and fetched again.
//!
//! Publishing is atomic: a pack is downloaded and extracted next to the cache
//! directory, verified, and only then renamed into its own version directory.
//! Readers of an older version keep their files.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::{NamedTempFile, TempDir};

use crate::error::{Diagnostic, PackError, Result, TokenizerError};
use crate::trie::TrieBuilder;

/// Default dialect pack name
pub const DEFAULT_DIALECT_PACK: &str = "general";

/// Environment variable that overrides [`default_base_path`]
pub const BASE_PATH_ENV: &str = "TSHEG_DIALECT_PACKS";

/// GitHub repository for dialect packs
#[cfg(feature = "download")]
const BOTOK_DATA_REPO: &str = "Esukhia/botok-data";

#[cfg(feature = "download")]
const GITHUB_URL: &str = "https://github.com";

#[cfg(feature = "download")]
const GITHUB_API_URL: &str = "https://api.github.com";

/// Name of the manifest written into every published pack
pub const MANIFEST_FILE: &str = ".pack-manifest.json";

/// Get the default base path for dialect packs.
///
/// `$TSHEG_DIALECT_PACKS` when set, otherwise `<cache dir>/tsheg/dialect_packs`,
/// otherwise `./dialect_packs`.
pub fn default_base_path() -> PathBuf {
    if let Some(path) = std::env::var_os(BASE_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    dirs::cache_dir()
        .map(|dir| dir.join("tsheg").join("dialect_packs"))
        .unwrap_or_else(|| PathBuf::from("dialect_packs"))
}

fn sha256_hex<R: io::Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    io::copy(reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

fn sha256_file(path: &Path) -> std::result::Result<String, PackError> {
    let mut file = File::open(path).map_err(|e| PackError::io(path, e))?;
    sha256_hex(&mut file).map_err(|e| PackError::io(path, e))
}

/// First token of a `.sha256` file, if it looks like a SHA-256 digest.
fn parse_checksum(text: &str) -> Option<String> {
    text.split_whitespace()
        .next()
        .filter(|digest| digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit()))
        .map(str::to_ascii_lowercase)
}

/// Where dialect pack archives come from.
pub trait PackSource: Send + Sync + fmt::Debug {
    /// The newest published version of a pack
    fn latest_version(&self, name: &str) -> std::result::Result<String, PackError>;

    /// The published SHA-256 of the archive, when the source publishes one
    fn expected_sha256(
        &self,
        name: &str,
        version: &str,
    ) -> std::result::Result<Option<String>, PackError>;

    /// Write the zip archive of a pack to `out`
    fn fetch(
        &self,
        name: &str,
        version: &str,
        out: &mut dyn Write,
    ) -> std::result::Result<(), PackError>;
}

/// Downloads packs from the GitHub releases of the botok-data repository.
#[cfg(feature = "download")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::blocking::Client,
    repo: String,
    download_base: String,
    api_base: String,
}

#[cfg(feature = "download")]
impl HttpSource {
    /// Create a source whose requests fail with [`PackError::Timeout`] after
    /// `timeout`
    pub fn new(timeout: std::time::Duration) -> std::result::Result<Self, PackError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("tsheg/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(HttpSource {
            client,
            repo: BOTOK_DATA_REPO.to_string(),
            download_base: GITHUB_URL.to_string(),
            api_base: GITHUB_API_URL.to_string(),
        })
    }

    /// Read releases from another `owner/repo`
    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = repo.into();
        self
    }

    /// Serve both release downloads and the releases API from `url`
    /// (a GitHub Enterprise host or a local server)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        let url = url.trim_end_matches('/');
        self.download_base = url.to_string();
        self.api_base = url.to_string();
        self
    }

    fn archive_url(&self, name: &str, version: &str) -> String {
        format!(
            "{}/{}/releases/download/{}/{}.zip",
            self.download_base, self.repo, version, name
        )
    }

    fn get(&self, url: &str) -> std::result::Result<reqwest::blocking::Response, PackError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PackError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(PackError::HttpStatus(status.as_u16()));
        }
        Ok(response)
    }
}

#[cfg(feature = "download")]
impl PackSource for HttpSource {
    fn latest_version(&self, _name: &str) -> std::result::Result<String, PackError> {
        #[derive(Deserialize)]
        struct Release {
            tag_name: String,
        }

        let url = format!("{}/repos/{}/releases/latest", self.api_base, self.repo);
        let release: Release = self.get(&url)?.json()?;
        Ok(release.tag_name)
    }

    fn expected_sha256(
        &self,
        name: &str,
        version: &str,
    ) -> std::result::Result<Option<String>, PackError> {
        let url = format!("{}.sha256", self.archive_url(name, version));
        match self.get(&url) {
            Ok(response) => Ok(parse_checksum(&response.text()?)),
            Err(PackError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn fetch(
        &self,
        name: &str,
        version: &str,
        out: &mut dyn Write,
    ) -> std::result::Result<(), PackError> {
        let url = self.archive_url(name, version);
        info!("downloading {} dialect pack (version {}) from {}", name, version, url);
        let mut response = self.get(&url)?;
        response.copy_to(out)?;
        Ok(())
    }
}

/// Serves packs from a local directory laid out as
/// `<root>/<version>/<name>.zip`, with an optional `<name>.zip.sha256`.
#[derive(Debug, Clone)]
pub struct MirrorSource {
    root: PathBuf,
}

impl MirrorSource {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        MirrorSource { root: root.into() }
    }

    fn archive_path(&self, name: &str, version: &str) -> PathBuf {
        self.root.join(version).join(format!("{}.zip", name))
    }
}

/// Orders version strings by their numeric components (`v0.10` > `v0.9`).
fn version_key(version: &str) -> (Vec<u64>, String) {
    let numbers = version
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.parse().ok())
        .collect();
    (numbers, version.to_string())
}

impl PackSource for MirrorSource {
    fn latest_version(&self, name: &str) -> std::result::Result<String, PackError> {
        let entries = fs::read_dir(&self.root).map_err(|e| PackError::io(&self.root, e))?;

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PackError::io(&self.root, e))?;
            let version = entry.file_name().to_string_lossy().into_owned();
            if self.archive_path(name, &version).is_file() {
                versions.push(version);
            }
        }

        versions
            .into_iter()
            .max_by_key(|v| version_key(v))
            .ok_or_else(|| PackError::NotFound(name.to_string()))
    }

    fn expected_sha256(
        &self,
        name: &str,
        version: &str,
    ) -> std::result::Result<Option<String>, PackError> {
        let mut path = self.archive_path(name, version).into_os_string();
        path.push(".sha256");
        let path = PathBuf::from(path);

        match fs::read_to_string(&path) {
            Ok(text) => Ok(parse_checksum(&text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PackError::io(path, e)),
        }
    }

    fn fetch(
        &self,
        name: &str,
        version: &str,
        out: &mut dyn Write,
    ) -> std::result::Result<(), PackError> {
        let path = self.archive_path(name, version);
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(PackError::NotFound(format!("{} {}", name, version)));
            }
            Err(e) => return Err(PackError::io(path, e)),
        };
        io::copy(&mut file, out).map_err(|e| PackError::io(&path, e))?;
        Ok(())
    }
}

/// Record of a published pack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackManifest {
    pub name: String,
    pub version: String,
    /// SHA-256 of the archive the pack was extracted from
    pub archive_sha256: String,
    /// SHA-256 of every extracted file, keyed by `/`-separated relative path
    pub files: BTreeMap<String, String>,
}

impl PackManifest {
    /// Read the manifest of a pack directory
    pub fn read(pack_dir: &Path) -> Option<PackManifest> {
        let content = fs::read_to_string(pack_dir.join(MANIFEST_FILE)).ok()?;
        serde_json::from_str(&content).ok()
    }

    fn write(&self, pack_dir: &Path) -> std::result::Result<(), PackError> {
        let path = pack_dir.join(MANIFEST_FILE);
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| PackError::io(&path, io::Error::new(io::ErrorKind::InvalidData, e)))?;
        fs::write(&path, json).map_err(|e| PackError::io(&path, e))
    }
}

/// Hash every file under `dir` except the manifest.
fn hash_tree(dir: &Path) -> std::result::Result<BTreeMap<String, String>, PackError> {
    let mut files = Vec::new();
    collect_files(dir, &mut files, &|_: &Path| true).map_err(|e| PackError::io(dir, e))?;

    let mut hashes = BTreeMap::new();
    for path in files {
        let relative = match path.strip_prefix(dir) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if key == MANIFEST_FILE {
            continue;
        }
        hashes.insert(key, sha256_file(&path)?);
    }
    Ok(hashes)
}

/// Local cache of dialect packs: a base directory, the source to fetch from
/// and an optional pinned version.
///
/// Each version of a pack is published in its own directory,
/// `<base>/<name>/<version>/`, and is never touched when another version is
/// published. An unpinned cache serves the newest version it holds.
#[derive(Debug, Clone)]
pub struct PackCache {
    base: PathBuf,
    source: Option<Arc<dyn PackSource>>,
    version: Option<String>,
}

/// A pack name or version must be a single plain path component.
fn check_component(component: &str) -> std::result::Result<(), PackError> {
    let mut components = Path::new(component).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !component.starts_with('.');

    if plain {
        Ok(())
    } else {
        Err(PackError::InvalidName(component.to_string()))
    }
}

impl PackCache {
    /// Create a cache under `base` that fetches from `source`
    pub fn new<P: Into<PathBuf>, S: PackSource + 'static>(base: P, source: S) -> Self {
        PackCache {
            base: base.into(),
            source: Some(Arc::new(source)),
            version: None,
        }
    }

    /// Create a cache that only serves packs already on disk
    pub fn offline<P: Into<PathBuf>>(base: P) -> Self {
        PackCache {
            base: base.into(),
            source: None,
            version: None,
        }
    }

    /// Create the cache described by a configuration, downloading over HTTP
    #[cfg(feature = "download")]
    pub fn from_config(config: &crate::config::TokenizerConfig) -> std::result::Result<Self, PackError> {
        let mut cache = PackCache::new(config.resolved_base_path(), HttpSource::new(config.timeout())?);
        cache.version = config.version.clone();
        Ok(cache)
    }

    /// Create the cache described by a configuration; without the `download`
    /// feature it can only serve packs already on disk
    #[cfg(not(feature = "download"))]
    pub fn from_config(config: &crate::config::TokenizerConfig) -> std::result::Result<Self, PackError> {
        let mut cache = PackCache::offline(config.resolved_base_path());
        cache.version = config.version.clone();
        Ok(cache)
    }

    /// Pin the pack version. Other cached versions are then ignored.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base
    }

    /// Directory holding every cached version of a pack
    fn pack_root(&self, name: &str) -> std::result::Result<PathBuf, PackError> {
        check_component(name)?;
        Ok(self.base.join(name))
    }

    /// Get the path of one version of a dialect pack, whether or not it exists
    pub fn dialect_pack_path(&self, name: &str, version: &str) -> std::result::Result<PathBuf, PackError> {
        check_component(version)?;
        Ok(self.pack_root(name)?.join(version))
    }

    /// A manifest for this name and version, a `dictionary/` directory and
    /// every listed file. Does not hash anything.
    fn is_complete(&self, name: &str, version: &str) -> bool {
        let path = match self.dialect_pack_path(name, version) {
            Ok(path) => path,
            Err(_) => return false,
        };
        match PackManifest::read(&path) {
            Some(manifest) if manifest.name == name && manifest.version == version => {
                path.join("dictionary").is_dir()
                    && manifest.files.keys().all(|file| path.join(file).is_file())
            }
            _ => false,
        }
    }

    /// Complete cached versions of a pack, oldest first
    pub fn cached_versions(&self, name: &str) -> Vec<String> {
        let Some(entries) = self.pack_root(name).ok().and_then(|root| fs::read_dir(root).ok()) else {
            return Vec::new();
        };

        let mut versions: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|version| self.is_complete(name, version))
            .collect();
        versions.sort_by_key(|v| version_key(v));
        versions
    }

    /// The cached version this cache serves: the pinned one when it is
    /// cached, otherwise the newest cached version
    pub fn cached_version(&self, name: &str) -> Option<String> {
        match &self.version {
            Some(pinned) => self.is_complete(name, pinned).then(|| pinned.clone()),
            None => self.cached_versions(name).pop(),
        }
    }

    /// Check if a usable dialect pack is cached. Never touches the network.
    pub fn dialect_pack_exists(&self, name: &str) -> bool {
        self.cached_version(name).is_some()
    }

    /// Re-hash every file of the served version against its manifest
    pub fn verify_dialect_pack(&self, name: &str) -> std::result::Result<bool, PackError> {
        match self.cached_version(name) {
            Some(version) => self.verify_version(name, &version),
            None => Ok(false),
        }
    }

    fn verify_version(&self, name: &str, version: &str) -> std::result::Result<bool, PackError> {
        if !self.is_complete(name, version) {
            return Ok(false);
        }
        let path = self.dialect_pack_path(name, version)?;
        match PackManifest::read(&path) {
            Some(manifest) => Ok(hash_tree(&path)? == manifest.files),
            None => Ok(false),
        }
    }

    /// Get a dialect pack, downloading it when it is missing or corrupt
    pub fn get_dialect_pack(&self, name: &str) -> std::result::Result<PathBuf, PackError> {
        if let Some(version) = self.cached_version(name) {
            let path = self.dialect_pack_path(name, &version)?;
            if self.verify_version(name, &version)? {
                debug!("using cached dialect pack {}", path.display());
                return Ok(path);
            }
            warn!("cached dialect pack {} is corrupt, fetching again", path.display());
        }
        self.download_dialect_pack(name)
    }

    /// Fetch the pinned, or else the latest, version of a pack and publish it
    /// at its [`dialect_pack_path`](Self::dialect_pack_path).
    ///
    /// Does nothing when that version is already cached and verifies. On
    /// failure nothing is left behind and every cached version is untouched.
    pub fn download_dialect_pack(&self, name: &str) -> std::result::Result<PathBuf, PackError> {
        check_component(name)?;
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| PackError::NoSource(name.to_string()))?;

        let version = match &self.version {
            Some(version) => version.clone(),
            None => source.latest_version(name)?,
        };
        let path = self.dialect_pack_path(name, &version)?;

        if self.verify_version(name, &version)? {
            debug!("dialect pack {} {} is already cached", name, version);
            return Ok(path);
        }

        fs::create_dir_all(&self.base).map_err(|e| PackError::io(&self.base, e))?;

        // Download into a temporary file next to the cache
        let mut archive = NamedTempFile::new_in(&self.base).map_err(|e| PackError::io(&self.base, e))?;
        let archive_path = archive.path().to_path_buf();
        source.fetch(name, &version, archive.as_file_mut())?;

        let archive_file = archive.as_file_mut();
        archive_file
            .seek(SeekFrom::Start(0))
            .map_err(|e| PackError::io(&archive_path, e))?;
        let archive_sha256 = sha256_hex(archive_file).map_err(|e| PackError::io(&archive_path, e))?;

        if let Some(expected) = source.expected_sha256(name, &version)? {
            if expected != archive_sha256 {
                return Err(PackError::ChecksumMismatch {
                    expected,
                    actual: archive_sha256,
                });
            }
        }

        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.base)
            .map_err(|e| PackError::io(&self.base, e))?;
        let pack_root = extract(archive.as_file_mut(), &staging, name)?;

        let manifest = PackManifest {
            name: name.to_string(),
            version: version.clone(),
            archive_sha256,
            files: hash_tree(&pack_root)?,
        };
        manifest.write(&pack_root)?;

        self.publish(name, &version, &pack_root, &path)?;
        info!("published dialect pack {} {} at {}", name, version, path.display());
        Ok(path)
    }

    /// Rename a verified pack into its version directory.
    ///
    /// A valid copy already there, published by a concurrent download, is
    /// kept. A corrupt or partial one is moved aside first.
    fn publish(
        &self,
        name: &str,
        version: &str,
        staged: &Path,
        path: &Path,
    ) -> std::result::Result<(), PackError> {
        let root = self.pack_root(name)?;
        fs::create_dir_all(&root).map_err(|e| PackError::io(&root, e))?;

        let mut _aside = None;
        if path.exists() {
            if self.verify_version(name, version)? {
                debug!("dialect pack {} {} was published concurrently", name, version);
                return Ok(());
            }
            let stale = tempfile::Builder::new()
                .prefix(".stale-")
                .tempdir_in(&self.base)
                .map_err(|e| PackError::io(&self.base, e))?;
            // Another process may have moved it already
            let _ = fs::rename(path, stale.path().join(version));
            _aside = Some(stale);
        }

        match fs::rename(staged, path) {
            Ok(()) => Ok(()),
            Err(_) if self.verify_version(name, version)? => {
                debug!("dialect pack {} {} was published concurrently", name, version);
                Ok(())
            }
            Err(e) => Err(PackError::io(path, e)),
        }
    }

    /// Remove every cached version of a pack. Returns whether there was one.
    pub fn remove_dialect_pack(&self, name: &str) -> std::result::Result<bool, PackError> {
        let root = self.pack_root(name)?;
        if !root.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&root).map_err(|e| PackError::io(&root, e))?;
        Ok(true)
    }

    /// Remove every cached version of a pack except the one this cache
    /// serves. Returns the removed versions.
    ///
    /// Unlike publishing, this may pull files from under a reader of an
    /// older version.
    pub fn prune_dialect_pack(&self, name: &str) -> std::result::Result<Vec<String>, PackError> {
        let keep = self.cached_version(name);
        let root = self.pack_root(name)?;
        let entries = match fs::read_dir(&root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PackError::io(root, e)),
        };

        let mut removed = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PackError::io(&root, e))?;
            let version = entry.file_name().to_string_lossy().into_owned();
            if Some(&version) == keep.as_ref() || !entry.path().is_dir() {
                continue;
            }
            fs::remove_dir_all(entry.path()).map_err(|e| PackError::io(entry.path(), e))?;
            removed.push(version);
        }
        removed.sort_by_key(|v| version_key(v));
        Ok(removed)
    }
}

/// Extract a zip into `staging/extract` and return the pack root: either
/// the extraction directory itself or a single `<name>/` folder inside it.
fn extract(
    archive: &mut File,
    staging: &TempDir,
    name: &str,
) -> std::result::Result<PathBuf, PackError> {
    let target = staging.path().join("extract");
    archive
        .seek(SeekFrom::Start(0))
        .map_err(|e| PackError::io(staging.path(), e))?;
    let mut zip = zip::ZipArchive::new(archive)?;

    for i in 0..zip.len() {
        let mut file = zip.by_index(i)?;

        let outpath = match file.enclosed_name() {
            Some(path) => target.join(path),
            None => continue,
        };

        if file.is_dir() {
            fs::create_dir_all(&outpath).map_err(|e| PackError::io(&outpath, e))?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent).map_err(|e| PackError::io(parent, e))?;
            }
            let mut outfile = File::create(&outpath).map_err(|e| PackError::io(&outpath, e))?;
            io::copy(&mut file, &mut outfile).map_err(|e| PackError::io(&outpath, e))?;
        }
    }

    [target.clone(), target.join(name)]
        .into_iter()
        .find(|root| root.join("dictionary").is_dir())
        .ok_or_else(|| PackError::Archive(format!("{} has no dictionary/ directory", name)))
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>, keep: &dyn Fn(&Path) -> bool) -> io::Result<()> {
    if dir.is_dir() {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                collect_files(&path, files, keep)?;
            } else if keep(&path) {
                files.push(path);
            }
        }
    }
    Ok(())
}

fn is_tsv(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "tsv")
}

/// Files under a `rules/` directory hold adjustment rules, not word lists
fn is_rule_file(dir: &Path, file: &Path) -> bool {
    file.strip_prefix(dir)
        .ok()
        .is_some_and(|relative| relative.components().any(|c| c.as_os_str() == "rules"))
}

fn list_tsv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_files(dir, &mut files, &is_tsv).map_err(|e| TokenizerError::io(dir, e))?;

    let (rules, mut files): (Vec<_>, Vec<_>) =
        files.into_iter().partition(|file| is_rule_file(dir, file));
    if !rules.is_empty() {
        debug!("skipping {} rule files under {}", rules.len(), dir.display());
    }
    files.sort();
    Ok(files)
}

/// List all TSV files in a dialect pack's dictionary, in path order
pub fn list_dictionary_files(dialect_pack_path: &Path) -> Result<Vec<PathBuf>> {
    list_tsv_files(&dialect_pack_path.join("dictionary"))
}

/// List all TSV files in a dialect pack's adjustments, in path order
pub fn list_adjustment_files(dialect_pack_path: &Path) -> Result<Vec<PathBuf>> {
    list_tsv_files(&dialect_pack_path.join("adjustments"))
}

/// Whether an adjustment file lists words to remove
fn is_removal(adjustments: &Path, file: &Path) -> bool {
    file.strip_prefix(adjustments)
        .ok()
        .and_then(|relative| relative.components().next())
        .is_some_and(|first| first.as_os_str() == "remove")
}

/// Load a dialect pack into `builder`: dictionary files first, then
/// adjustments. Files under `adjustments/remove/` deactivate their words.
pub fn load_dialect_pack(builder: &mut TrieBuilder, pack_path: &Path) -> Result<Vec<Diagnostic>> {
    let dictionary = list_dictionary_files(pack_path)?;
    if dictionary.is_empty() {
        return Err(PackError::Archive(format!(
            "{} has no dictionary files",
            pack_path.display()
        ))
        .into());
    }

    let mut diagnostics = Vec::new();
    for file in &dictionary {
        diagnostics.extend(builder.load_tsv_file(file)?);
    }

    let adjustments_dir = pack_path.join("adjustments");
    for file in list_adjustment_files(pack_path)? {
        if is_removal(&adjustments_dir, &file) {
            let removed = builder.remove_tsv_file(&file)?;
            debug!("{} removed {} words", file.display(), removed);
        } else {
            diagnostics.extend(builder.load_tsv_file(&file)?);
        }
    }

    info!(
        "loaded dialect pack {} ({} files, {} words)",
        pack_path.display(),
        dictionary.len(),
        builder.trie().len()
    );
    Ok(diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_pack_path() {
        let cache = PackCache::offline("/tmp/packs");
        let path = cache.dialect_pack_path("general", "v1").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/packs/general/v1"));
    }

    #[test]
    fn test_invalid_pack_names() {
        let cache = PackCache::offline("/tmp/packs");
        for name in ["", "..", "a/b", ".hidden", "/abs"] {
            assert!(
                matches!(cache.dialect_pack_path(name, "v1"), Err(PackError::InvalidName(_))),
                "{:?} should be rejected",
                name
            );
            assert!(
                matches!(cache.dialect_pack_path("general", name), Err(PackError::InvalidName(_))),
                "version {:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_parse_checksum() {
        let digest = "A".repeat(64);
        assert_eq!(
            parse_checksum(&format!("{}  general.zip\n", digest)),
            Some("a".repeat(64))
        );
        assert_eq!(parse_checksum("not-a-digest"), None);
        assert_eq!(parse_checksum(""), None);
    }

    #[test]
    fn test_version_order() {
        let mut versions = vec!["v0.9", "v0.10", "v0.2"];
        versions.sort_by_key(|v| version_key(v));
        assert_eq!(versions, vec!["v0.2", "v0.9", "v0.10"]);
    }

    #[test]
    fn test_is_removal() {
        let adjustments = Path::new("/p/adjustments");
        assert!(is_removal(adjustments, Path::new("/p/adjustments/remove/a.tsv")));
        assert!(!is_removal(adjustments, Path::new("/p/adjustments/words/a.tsv")));
    }

    #[test]
    fn test_rule_files_are_not_dictionaries() {
        let dir = tempfile::tempdir().unwrap();
        let pack = dir.path();
        for (path, content) in [
            ("dictionary/words.tsv", "ཀཀ\tNOUN\n"),
            ("dictionary/rules/merge.tsv", "[\"ལ\"] [\"ས\"]\t1-2\t::\t[pos=\"NOUN\"]\n"),
            ("adjustments/rules/split.tsv", "[pos=\"VERB\"]\t1\t-\t1-1\n"),
        ] {
            let path = pack.join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        assert_eq!(
            list_dictionary_files(pack).unwrap(),
            vec![pack.join("dictionary/words.tsv")]
        );
        assert!(list_adjustment_files(pack).unwrap().is_empty());

        let mut builder = TrieBuilder::new();
        let diagnostics = load_dialect_pack(&mut builder, pack).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(builder.trie().len(), 1);
    }

    #[test]
    fn test_missing_pack_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PackCache::offline(dir.path());
        assert!(!cache.dialect_pack_exists("general"));
        assert!(!cache.verify_dialect_pack("general").unwrap());
        assert!(matches!(
            cache.get_dialect_pack("general"),
            Err(PackError::NoSource(_))
        ));
    }
}
