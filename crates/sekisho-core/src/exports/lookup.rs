//! Transitive lookups across re-exports and `export *` chains

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::rc::Rc;

use super::{DEFAULT_EXPORT, ExportEntry, ExportMap, ExportMapRegistry};

/// Outcome of [`ExportMap::has_deep`].
#[derive(Debug, Clone)]
pub struct DeepLookup {
    pub found: bool,
    /// Maps walked, starting with the queried one. On a miss this is the path to a
    /// module that failed to parse if there was one, otherwise the longest chain tried.
    pub path: Vec<Rc<ExportMap>>,
    /// Re-export or `export *` specifiers on the way that could not be loaded.
    pub unresolved: Vec<String>,
    /// The name as it is known in the last map of `path`.
    pub name: String,
}

impl DeepLookup {
    fn miss(map: &Rc<ExportMap>, name: &str) -> Self {
        Self {
            found: false,
            path: vec![Rc::clone(map)],
            unresolved: Vec::new(),
            name: name.to_string(),
        }
    }

    /// The entry that satisfied the lookup.
    pub fn entry(&self) -> Option<&ExportEntry> {
        if !self.found {
            return None;
        }
        self.path.last()?.get(&self.name)
    }

    /// First map on the path that failed to parse.
    pub fn broken(&self) -> Option<&Rc<ExportMap>> {
        self.path.iter().find(|map| map.is_broken())
    }

    /// First map on the path whose exports cannot be read statically.
    pub fn opaque(&self) -> Option<&Rc<ExportMap>> {
        self.path.iter().find(|map| map.exports_unknown())
    }

    /// Whether a miss can be trusted: nothing on the way was broken, unresolvable
    /// or a script with unknown exports.
    pub fn is_conclusive(&self) -> bool {
        self.found
            || (self.unresolved.is_empty() && self.broken().is_none() && self.opaque().is_none())
    }

    /// Module paths of the walk joined as `a -> b -> c`, each relative to the first.
    pub fn describe_path(&self) -> String {
        let base = self
            .path
            .first()
            .and_then(|map| map.path().parent())
            .map(PathBuf::from)
            .unwrap_or_default();
        self.path
            .iter()
            .map(|map| {
                map.path()
                    .strip_prefix(&base)
                    .unwrap_or(map.path())
                    .display()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    fn rank(&self) -> (bool, usize) {
        (self.broken().is_some(), self.path.len())
    }
}

/// A deep `get`: the entry and the map that declares it.
#[derive(Debug, Clone)]
pub struct ResolvedExport {
    pub map: Rc<ExportMap>,
    pub entry: ExportEntry,
}

impl ExportMap {
    /// Looks `name` up in this module, then its explicit re-exports, then each
    /// `export *` dependency in source order. Cycles terminate: a (module, name)
    /// pair is never visited twice in one lookup.
    pub fn has_deep(self: &Rc<Self>, name: &str, registry: &ExportMapRegistry) -> DeepLookup {
        let mut visited = HashSet::new();
        self.deep(name, registry, &mut visited)
    }

    /// Deep `get`, following the same order as [`ExportMap::has_deep`].
    pub fn resolve(self: &Rc<Self>, name: &str, registry: &ExportMapRegistry) -> Option<ResolvedExport> {
        let lookup = self.has_deep(name, registry);
        let entry = lookup.entry()?.clone();
        let map = lookup.path.last().map(Rc::clone)?;
        Some(ResolvedExport { map, entry })
    }

    /// Every name reachable from this module. The first source wins and
    /// `default` never comes through `export *`.
    pub fn all_exports(self: &Rc<Self>, registry: &ExportMapRegistry) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        let mut visited = HashSet::new();
        self.collect_exports(registry, &mut visited, &mut names, true);
        names
    }

    /// False when some module reachable through `export *` is a script with
    /// unknown exports, so [`ExportMap::all_exports`] may be missing names.
    pub fn exports_known(self: &Rc<Self>, registry: &ExportMapRegistry) -> bool {
        let mut visited = HashSet::new();
        self.known(registry, &mut visited)
    }

    fn known(self: &Rc<Self>, registry: &ExportMapRegistry, visited: &mut HashSet<PathBuf>) -> bool {
        if !visited.insert(self.path().to_path_buf()) {
            return true;
        }
        if self.exports_unknown() {
            return false;
        }
        self.dependencies().iter().all(|dependency| {
            registry
                .dependency(dependency)
                .is_none_or(|target| target.known(registry, visited))
        })
    }

    fn collect_exports(
        self: &Rc<Self>,
        registry: &ExportMapRegistry,
        visited: &mut HashSet<PathBuf>,
        names: &mut BTreeSet<String>,
        include_default: bool,
    ) {
        if !visited.insert(self.path().to_path_buf()) {
            return;
        }
        for name in self.exported_names() {
            if include_default || name != DEFAULT_EXPORT {
                names.insert(name.to_string());
            }
        }
        for dependency in self.dependencies() {
            if let Some(target) = registry.dependency(dependency) {
                target.collect_exports(registry, visited, names, false);
            }
        }
    }

    fn deep(
        self: &Rc<Self>,
        name: &str,
        registry: &ExportMapRegistry,
        visited: &mut HashSet<(PathBuf, String)>,
    ) -> DeepLookup {
        if !visited.insert((self.path().to_path_buf(), name.to_string())) {
            tracing::trace!(path = %self.path().display(), name, "deep lookup: already visited");
            return DeepLookup::miss(self, name);
        }

        if self.is_broken() || self.namespace().contains_key(name) {
            return DeepLookup {
                found: !self.is_broken(),
                ..DeepLookup::miss(self, name)
            };
        }

        if let Some(reexport) = self.reexports().get(name) {
            let target = reexport
                .resolved
                .as_deref()
                .and_then(|path| registry.load(path));
            let Some(target) = target else {
                return DeepLookup {
                    unresolved: vec![reexport.specifier.clone()],
                    ..DeepLookup::miss(self, name)
                };
            };
            if target.path() == self.path() && reexport.imported == name {
                return DeepLookup::miss(self, name);
            }
            tracing::trace!(
                from = %self.path().display(),
                to = %target.path().display(),
                name = %reexport.imported,
                "deep lookup: following re-export"
            );
            let mut lookup = target.deep(&reexport.imported, registry, visited);
            lookup.path.insert(0, Rc::clone(self));
            return lookup;
        }

        if name == DEFAULT_EXPORT {
            return DeepLookup::miss(self, name);
        }

        let mut unresolved = Vec::new();
        let mut best: Option<DeepLookup> = None;

        for dependency in self.dependencies() {
            let Some(target) = registry.dependency(dependency) else {
                unresolved.push(dependency.specifier.clone());
                continue;
            };
            tracing::trace!(
                from = %self.path().display(),
                to = %target.path().display(),
                name,
                "deep lookup: entering export *"
            );
            let mut lookup = target.deep(name, registry, visited);
            lookup.path.insert(0, Rc::clone(self));
            if lookup.found {
                return lookup;
            }
            unresolved.append(&mut lookup.unresolved);
            if best.as_ref().is_none_or(|current| lookup.rank() > current.rank()) {
                best = Some(lookup);
            }
        }

        let mut result = best.unwrap_or_else(|| DeepLookup::miss(self, name));
        result.unresolved = unresolved;
        result
    }
}
