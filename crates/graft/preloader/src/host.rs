//! Unit hosts: where units are read from and written to.
//!
//! [`JsonUnitStore`] keeps one `*.json` file per unit under a directory
//! tree; [`MemoryUnitStore`] is the in-process equivalent used by tests
//! and embedders that already hold their units.

use std::fs;
use std::path::{Path, PathBuf};

use graft_model::Unit;
use indexmap::IndexMap;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{HostError, HostResult};

/// Extension of unit files in a [`JsonUnitStore`].
pub const UNIT_FILE_EXTENSION: &str = "json";

// ── Traits ─────────────────────────────────────────────────────────────

/// Candidate plugin units.
pub trait UnitSource {
    /// Every candidate unit, in a stable order. Unreadable candidates
    /// yield [`HostError::MalformedInput`].
    fn enumerate(&self) -> Box<dyn Iterator<Item = HostResult<Unit>> + '_>;
}

/// Target units, loaded by name for patching.
pub trait UnitResolver {
    fn resolve(&self, unit_name: &str) -> HostResult<Unit>;
}

/// Destination for patched units.
pub trait UnitSink {
    fn persist(&self, unit: &Unit, path: &Path) -> HostResult<()>;
}

// ── JSON store ─────────────────────────────────────────────────────────

/// Units stored as JSON files below `root`.
#[derive(Debug, Clone)]
pub struct JsonUnitStore {
    root: PathBuf,
}

impl JsonUnitStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the unit named `unit_name`.
    pub fn path_for(&self, unit_name: &str) -> PathBuf {
        self.root.join(format!("{unit_name}.{UNIT_FILE_EXTENSION}"))
    }

    /// Read one unit file.
    ///
    /// Contents that do not decode as a unit, binary files included, are
    /// [`HostError::MalformedInput`]; only failures to read the file are
    /// [`HostError::Io`].
    pub fn read(path: &Path) -> HostResult<Unit> {
        let bytes = fs::read(path).map_err(|e| HostError::io(path, e))?;
        serde_json::from_slice(&bytes).map_err(|e| HostError::MalformedInput {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// All unit files below the root, sorted by file name per directory.
    fn unit_files(&self) -> HostResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|err| {
                let path = err.path().unwrap_or(&self.root).to_path_buf();
                HostError::io(path, err.into())
            })?;
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == UNIT_FILE_EXTENSION)
            {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

impl UnitSource for JsonUnitStore {
    fn enumerate(&self) -> Box<dyn Iterator<Item = HostResult<Unit>> + '_> {
        match self.unit_files() {
            Ok(files) => {
                debug!(root = %self.root.display(), count = files.len(), "Enumerating units");
                Box::new(files.into_iter().map(|path| Self::read(&path)))
            }
            Err(err) => Box::new(std::iter::once(Err(err))),
        }
    }
}

impl UnitResolver for JsonUnitStore {
    fn resolve(&self, unit_name: &str) -> HostResult<Unit> {
        let path = self.path_for(unit_name);
        if !path.is_file() {
            return Err(HostError::UnitNotFound(unit_name.to_string()));
        }
        Self::read(&path)
    }
}

impl UnitSink for JsonUnitStore {
    fn persist(&self, unit: &Unit, path: &Path) -> HostResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| HostError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(unit)?;
        fs::write(path, json).map_err(|e| HostError::io(path, e))?;
        debug!(unit = %unit.name, path = %path.display(), "Persisted unit");
        Ok(())
    }
}

// ── In-memory store ────────────────────────────────────────────────────

/// Units held in memory, keyed by name in insertion order.
#[derive(Debug, Default)]
pub struct MemoryUnitStore {
    units: IndexMap<String, Unit>,
    persisted: std::cell::RefCell<Vec<(PathBuf, Unit)>>,
}

impl MemoryUnitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.insert(unit);
        self
    }

    pub fn insert(&mut self, unit: Unit) {
        self.units.insert(unit.name.clone(), unit);
    }

    /// Units written through [`UnitSink::persist`], in write order.
    pub fn persisted(&self) -> Vec<(PathBuf, Unit)> {
        self.persisted.borrow().clone()
    }
}

impl UnitSource for MemoryUnitStore {
    fn enumerate(&self) -> Box<dyn Iterator<Item = HostResult<Unit>> + '_> {
        Box::new(self.units.values().cloned().map(Ok))
    }
}

impl UnitResolver for MemoryUnitStore {
    fn resolve(&self, unit_name: &str) -> HostResult<Unit> {
        self.units
            .get(unit_name)
            .cloned()
            .ok_or_else(|| HostError::UnitNotFound(unit_name.to_string()))
    }
}

impl UnitSink for MemoryUnitStore {
    fn persist(&self, unit: &Unit, path: &Path) -> HostResult<()> {
        self.persisted
            .borrow_mut()
            .push((path.to_path_buf(), unit.clone()));
        Ok(())
    }
}
