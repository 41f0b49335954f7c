// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Content-addressed artifact cache.
//!
//! Entries live as `<cache dir>/<key>.json`. Keys are derived from the source set and the
//! compiler settings, so an entry never changes once written. Writers go through a temporary
//! file and an atomic rename, which lets separate processes share a cache directory: readers
//! either see a complete entry or none at all. Unreadable entries are treated as misses.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use alloy::primitives::B256;
use serde::{Deserialize, Serialize};
use tiny_keccak::{Hasher, Keccak};

use crate::{
    core::{artifact::Artifact, build::CompilerSettings, source::SourceSet},
    utils::write_atomic,
};

const ENTRY_EXTENSION: &str = "json";
const KEY_DOMAIN: &[u8] = b"solbuild-artifact-cache-v1";

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to write cache entry {0}: {1}")]
    Write(PathBuf, #[source] io::Error),
    #[error("failed to serialize cache entry: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to clear cache directory {0}: {1}")]
    Clear(PathBuf, #[source] io::Error),
}

/// Hash of a source set together with the compiler settings used to build it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(pub B256);

impl CacheKey {
    pub fn compute(sources: &SourceSet, settings: &CompilerSettings) -> Self {
        let mut keccak = Keccak::v256();
        keccak.update(KEY_DOMAIN);
        settings.hash_into(&mut keccak);
        keccak.update(&(sources.len() as u64).to_be_bytes());
        for file in sources.files() {
            keccak.update(&(file.path.len() as u64).to_be_bytes());
            keccak.update(file.path.as_bytes());
            keccak.update(file.hash.as_slice());
        }
        let mut key = [0u8; 32];
        keccak.finalize(&mut key);
        Self(B256::from(key))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// A stored build result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactCacheEntry {
    pub key: CacheKey,
    pub settings: CompilerSettings,
    pub sources: Vec<SourceRecord>,
    pub artifacts: Vec<Artifact>,
    /// Unix timestamp in seconds.
    pub built_at: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub path: String,
    pub hash: B256,
}

impl From<&SourceSet> for Vec<SourceRecord> {
    fn from(sources: &SourceSet) -> Self {
        sources
            .files()
            .iter()
            .map(|file| SourceRecord {
                path: file.path.clone(),
                hash: file.hash,
            })
            .collect()
    }
}

/// On-disk cache rooted at a single directory.
#[derive(Clone, Debug)]
pub struct ArtifactCache {
    dir: PathBuf,
}

impl ArtifactCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{key}.{ENTRY_EXTENSION}"))
    }

    /// Look up an entry. Missing, unreadable and corrupt entries are all misses.
    pub fn get(&self, key: &CacheKey) -> Option<ArtifactCacheEntry> {
        let path = self.entry_path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(@yellow, "ignoring unreadable cache entry {}: {err}", path.display());
                return None;
            }
        };
        match serde_json::from_slice::<ArtifactCacheEntry>(&bytes) {
            Ok(entry) if entry.key == *key => Some(entry),
            Ok(_) => {
                warn!(@yellow, "cache entry {} has a mismatched key, rebuilding", path.display());
                None
            }
            Err(err) => {
                warn!(@yellow, "cache entry {} is corrupt ({err}), rebuilding", path.display());
                None
            }
        }
    }

    /// Store an entry. Storing bytes identical to the existing entry does nothing.
    pub fn put(&self, key: &CacheKey, entry: &ArtifactCacheEntry) -> Result<(), CacheError> {
        let path = self.entry_path(key);
        let bytes = serde_json::to_vec_pretty(entry)?;
        if fs::read(&path).is_ok_and(|existing| existing == bytes) {
            debug!(@grey, "cache entry {key} already stored");
            return Ok(());
        }
        fs::create_dir_all(&self.dir).map_err(|err| CacheError::Write(path.clone(), err))?;
        write_atomic(&path, &bytes).map_err(|err| CacheError::Write(path.clone(), err))?;
        debug!(@grey, "stored cache entry {key}");
        Ok(())
    }

    /// Keys of all entries currently on disk. Other files in the directory are ignored.
    pub fn keys(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut keys: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .filter(|stem| is_entry_stem(stem))
            .collect();
        keys.sort();
        keys
    }

    /// Remove every entry, returning how many were removed.
    pub fn clear(&self) -> Result<usize, CacheError> {
        let keys = self.keys();
        for key in &keys {
            let path = self.dir.join(format!("{key}.{ENTRY_EXTENSION}"));
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(CacheError::Clear(path, err)),
            }
        }
        Ok(keys.len())
    }
}

fn is_entry_stem(stem: &str) -> bool {
    stem.len() == 64 && stem.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::source::SourceFile;
    use tempfile::tempdir;

    fn settings(runs: u32) -> CompilerSettings {
        CompilerSettings {
            language_version: "0.8.12".parse().unwrap(),
            optimizer_enabled: true,
            optimizer_runs: runs,
            evm_version: None,
        }
    }

    fn sources(body: &str) -> SourceSet {
        SourceSet::from_files(vec![SourceFile::new("Lock.sol", body)])
    }

    fn entry(key: CacheKey) -> ArtifactCacheEntry {
        ArtifactCacheEntry {
            key,
            settings: settings(200),
            sources: (&sources("contract Lock {}")).into(),
            artifacts: vec![],
            built_at: 1_700_000_000,
        }
    }

    #[test]
    fn key_depends_on_every_input() {
        let base = CacheKey::compute(&sources("contract Lock {}"), &settings(200));
        assert_eq!(base, CacheKey::compute(&sources("contract Lock {}"), &settings(200)));
        assert_ne!(base, CacheKey::compute(&sources("contract Lock {}"), &settings(300)));
        assert_ne!(base, CacheKey::compute(&sources("contract Lock { }"), &settings(200)));

        let mut no_optimizer = settings(200);
        no_optimizer.optimizer_enabled = false;
        assert_ne!(base, CacheKey::compute(&sources("contract Lock {}"), &no_optimizer));

        let renamed = SourceSet::from_files(vec![SourceFile::new("Vault.sol", "contract Lock {}")]);
        assert_ne!(base, CacheKey::compute(&renamed, &settings(200)));
    }

    #[test]
    fn put_then_get() {
        let tmp = tempdir().unwrap();
        let cache = ArtifactCache::new(tmp.path().join("cache"));
        let key = CacheKey::compute(&sources("contract Lock {}"), &settings(200));
        assert!(cache.get(&key).is_none());

        cache.put(&key, &entry(key)).unwrap();
        assert_eq!(cache.get(&key), Some(entry(key)));
        assert_eq!(cache.keys(), vec![key.to_string()]);

        // identical put leaves the file untouched
        let before = fs::read(cache.entry_path(&key)).unwrap();
        cache.put(&key, &entry(key)).unwrap();
        assert_eq!(fs::read(cache.entry_path(&key)).unwrap(), before);
    }

    #[test]
    fn corrupt_entry_is_a_miss() {
        let tmp = tempdir().unwrap();
        let cache = ArtifactCache::new(tmp.path());
        let key = CacheKey::compute(&sources("contract Lock {}"), &settings(200));
        fs::write(cache.entry_path(&key), b"{\"key\": tru").unwrap();
        assert!(cache.get(&key).is_none());

        // the rebuild overwrites the corrupt file
        cache.put(&key, &entry(key)).unwrap();
        assert!(cache.get(&key).is_some());
    }

    #[test]
    fn mismatched_key_is_a_miss() {
        let tmp = tempdir().unwrap();
        let cache = ArtifactCache::new(tmp.path());
        let key = CacheKey::compute(&sources("contract Lock {}"), &settings(200));
        let other = CacheKey::compute(&sources("contract Lock {}"), &settings(300));
        fs::write(
            cache.entry_path(&key),
            serde_json::to_vec(&entry(other)).unwrap(),
        )
        .unwrap();
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn clear_removes_entries() {
        let tmp = tempdir().unwrap();
        let cache = ArtifactCache::new(tmp.path());
        for runs in [200, 300] {
            let key = CacheKey::compute(&sources("contract Lock {}"), &settings(runs));
            cache.put(&key, &entry(key)).unwrap();
        }
        assert_eq!(cache.clear().unwrap(), 2);
        assert!(cache.keys().is_empty());
    }

    #[test]
    fn clear_leaves_foreign_files() {
        let tmp = tempdir().unwrap();
        let cache = ArtifactCache::new(tmp.path());
        let key = CacheKey::compute(&sources("contract Lock {}"), &settings(200));
        cache.put(&key, &entry(key)).unwrap();
        fs::write(tmp.path().join("package.json"), "{}").unwrap();
        fs::write(tmp.path().join("tsconfig.json"), "{}").unwrap();

        assert_eq!(cache.keys(), vec![key.to_string()]);
        assert_eq!(cache.clear().unwrap(), 1);
        assert!(tmp.path().join("package.json").exists());
        assert!(tmp.path().join("tsconfig.json").exists());
    }
}
