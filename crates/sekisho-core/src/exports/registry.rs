//! Export map cache
//!
//! Maps are keyed by (absolute path, settings fingerprint). A cached map is reused
//! while the file's modification time is unchanged; when the time moves the file is
//! re-read and the map is only rebuilt if its content hash changed as well.
//! Specifier resolutions are cached separately for the configured lifetime.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Instant, SystemTime};

use regex::Regex;
use sha2::{Digest, Sha256};

use super::builder::BuildContext;
use super::{Dependency, ExportMap, NamespaceLink};
use crate::config::Settings;
use crate::fs::{FileSystem, OsFileSystem};
use crate::parser::{SourceParser, SwcParser};
use crate::resolve::{NodeResolver, ResolveContext, Resolver};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub hits: usize,
    pub misses: usize,
    pub rebuilds: usize,
    pub resolutions: usize,
}

#[derive(Debug)]
struct CacheEntry {
    mtime: SystemTime,
    content_hash: String,
    map: Rc<ExportMap>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ResolveKey {
    fingerprint: String,
    specifier: String,
    dir: PathBuf,
}

#[derive(Debug)]
struct CachedResolution {
    resolved: Option<PathBuf>,
    at: Instant,
}

pub struct ExportMapRegistry {
    settings: Settings,
    fingerprint: String,
    ignore: Vec<Regex>,
    fs: Rc<dyn FileSystem>,
    resolver: Box<dyn Resolver>,
    parser: Box<dyn SourceParser>,
    maps: RefCell<HashMap<(PathBuf, String), CacheEntry>>,
    resolutions: RefCell<HashMap<ResolveKey, CachedResolution>>,
    stats: Cell<RegistryStats>,
}

impl std::fmt::Debug for ExportMapRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportMapRegistry")
            .field("fingerprint", &self.fingerprint)
            .field("cached_maps", &self.maps.borrow().len())
            .field("stats", &self.stats.get())
            .finish()
    }
}

impl ExportMapRegistry {
    pub fn new(settings: Settings) -> Self {
        Self::with_file_system(settings, Rc::new(OsFileSystem))
    }

    pub fn with_file_system(settings: Settings, fs: Rc<dyn FileSystem>) -> Self {
        Self::with_collaborators(settings, fs, Box::new(NodeResolver), Box::new(SwcParser))
    }

    pub fn with_collaborators(
        settings: Settings,
        fs: Rc<dyn FileSystem>,
        resolver: Box<dyn Resolver>,
        parser: Box<dyn SourceParser>,
    ) -> Self {
        Self {
            fingerprint: settings.fingerprint(),
            ignore: settings.ignore_patterns(),
            settings,
            fs,
            resolver,
            parser,
            maps: RefCell::new(HashMap::new()),
            resolutions: RefCell::new(HashMap::new()),
            stats: Cell::new(RegistryStats::default()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Switches the active settings. Maps built under other settings stay cached
    /// but are never returned for this fingerprint.
    pub fn set_settings(&mut self, settings: Settings) {
        self.fingerprint = settings.fingerprint();
        self.ignore = settings.ignore_patterns();
        self.settings = settings;
    }

    pub fn file_system(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn stats(&self) -> RegistryStats {
        self.stats.get()
    }

    pub fn cached_maps(&self) -> usize {
        self.maps.borrow().len()
    }

    /// Export map for `specifier` as imported from `from_file`. `None` means the
    /// module cannot be analysed (unresolved, builtin, ignored or unreadable).
    pub fn get(&self, specifier: &str, from_file: &Path) -> Option<Rc<ExportMap>> {
        let path = self.resolve(specifier, from_file)?;
        self.load(&path)
    }

    pub fn resolve(&self, specifier: &str, from_file: &Path) -> Option<PathBuf> {
        let key = ResolveKey {
            fingerprint: self.fingerprint.clone(),
            specifier: specifier.to_string(),
            dir: from_file.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        let lifetime = self.settings.cache.lifetime.as_duration();

        if let Some(cached) = self.resolutions.borrow().get(&key)
            && lifetime.is_none_or(|ttl| cached.at.elapsed() < ttl)
        {
            return cached.resolved.clone();
        }

        let ctx = ResolveContext {
            from_file,
            settings: &self.settings,
            fs: self.fs.as_ref(),
        };
        let resolved = self.resolver.resolve(specifier, &ctx);
        self.bump(|stats| stats.resolutions += 1);
        if resolved.is_none() {
            tracing::debug!(specifier, from = %from_file.display(), "unresolved specifier");
        }

        self.resolutions.borrow_mut().insert(
            key,
            CachedResolution {
                resolved: resolved.clone(),
                at: Instant::now(),
            },
        );
        resolved
    }

    /// Export map for an already resolved path.
    pub fn load(&self, path: &Path) -> Option<Rc<ExportMap>> {
        let shown = path.to_string_lossy();
        if self.ignore.iter().any(|pattern| pattern.is_match(&shown)) {
            tracing::debug!(path = %shown, "ignored by settings");
            return None;
        }

        let mtime = match self.fs.modified(path) {
            Ok(mtime) => mtime,
            Err(err) => {
                tracing::warn!(path = %shown, error = %err, "cannot stat module");
                return None;
            }
        };

        let key = (path.to_path_buf(), self.fingerprint.clone());
        if let Some(entry) = self.maps.borrow().get(&key)
            && entry.mtime == mtime
        {
            self.bump(|stats| stats.hits += 1);
            tracing::debug!(path = %shown, "export map cache hit");
            return Some(Rc::clone(&entry.map));
        }

        let source = match self.fs.read_to_string(path) {
            Ok(source) => Some(source),
            // Kept as a broken map so importers report it.
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                tracing::warn!(path = %shown, error = %err, "module is not valid UTF-8");
                None
            }
            Err(err) => {
                tracing::warn!(path = %shown, error = %err, "cannot read module");
                return None;
            }
        };
        let content_hash = source
            .as_deref()
            .map(|source| format!("{:x}", Sha256::digest(source.as_bytes())))
            .unwrap_or_default();

        let mut maps = self.maps.borrow_mut();
        let stale = match maps.get_mut(&key) {
            Some(entry) if entry.content_hash == content_hash => {
                entry.mtime = mtime;
                self.bump(|stats| stats.hits += 1);
                tracing::debug!(path = %shown, "export map cache hit (content unchanged)");
                return Some(Rc::clone(&entry.map));
            }
            Some(_) => true,
            None => false,
        };
        drop(maps);

        let resolve = |specifier: &str| self.resolve(specifier, path);
        let ctx = BuildContext {
            settings: &self.settings,
            parser: self.parser.as_ref(),
            resolve: &resolve,
        };
        let map = Rc::new(match &source {
            Some(source) => ExportMap::build(path, source, &ctx),
            None => ExportMap::unreadable(path, "File is not valid UTF-8"),
        });

        if stale {
            self.bump(|stats| stats.rebuilds += 1);
            tracing::debug!(path = %shown, "export map rebuilt");
        } else {
            self.bump(|stats| stats.misses += 1);
            tracing::debug!(path = %shown, "export map cache miss");
        }

        self.maps.borrow_mut().insert(
            key,
            CacheEntry {
                mtime,
                content_hash,
                map: Rc::clone(&map),
            },
        );
        Some(map)
    }

    /// Loads the target of an `export *` dependency.
    pub fn dependency(&self, dependency: &Dependency) -> Option<Rc<ExportMap>> {
        dependency.resolved.as_deref().and_then(|path| self.load(path))
    }

    /// Loads the module a namespace-valued export points at.
    pub fn follow(&self, link: &NamespaceLink) -> Option<Rc<ExportMap>> {
        link.resolved.as_deref().and_then(|path| self.load(path))
    }

    /// Drops every cached map and resolution.
    pub fn clear_cache(&self) {
        let maps = self.maps.borrow().len();
        self.maps.borrow_mut().clear();
        self.resolutions.borrow_mut().clear();
        tracing::debug!(maps, "export map cache cleared");
    }

    fn bump(&self, update: impl FnOnce(&mut RegistryStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }
}
