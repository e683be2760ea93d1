use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::discovery::{find_archetype_files, DiscoveryError};
use crate::core::archetype::Archetype;
use crate::core::types::SpectralClass;
use crate::parsing::archetype_file::FormatError;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("Failed to load {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error("Class {class} is defined by both {} and {}", first.display(), second.display())]
    Conflict {
        class: SpectralClass,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Failed to export catalog: {0}")]
    Export(#[from] serde_json::Error),
}

/// What to do when two files define the same spectral class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicateClassPolicy {
    /// Fail the load with `CatalogError::Conflict`
    #[default]
    Reject,
    /// Keep the file that sorts last and log a warning
    LastWins,
}

/// One row of the catalog summary
#[derive(Debug, Clone, Serialize)]
pub struct ClassSummary {
    pub class: SpectralClass,
    pub narch: usize,
    pub nwave: usize,
    pub version: String,
    pub source: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct CatalogSummary {
    created_at: String,
    classes: Vec<ClassSummary>,
}

/// All loaded archetypes, keyed by spectral class
#[derive(Debug, Default)]
pub struct ArchetypeCatalog {
    archetypes: BTreeMap<SpectralClass, Archetype>,
    sources: BTreeMap<SpectralClass, PathBuf>,
}

impl ArchetypeCatalog {
    /// Create an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discover and load every archetype file.
    ///
    /// `directory` takes precedence over `$RR_ARCHETYPE_DIR` and the
    /// packaged archetypes.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails, any file is invalid, or two
    /// files define the same class under `DuplicateClassPolicy::Reject`.
    pub fn load(directory: Option<&Path>, policy: DuplicateClassPolicy) -> Result<Self, CatalogError> {
        let files = find_archetype_files(directory)?;
        Self::load_files(&files, policy)
    }

    /// Load one archetype store per file. Nothing is returned unless every
    /// file loads.
    ///
    /// # Errors
    ///
    /// Returns `Format` for the first invalid file, or `Conflict` for a
    /// duplicated class under `DuplicateClassPolicy::Reject`.
    pub fn load_files<P: AsRef<Path>>(
        paths: &[P],
        policy: DuplicateClassPolicy,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();

        for path in paths {
            let path = path.as_ref();
            let archetype = Archetype::load(path).map_err(|source| CatalogError::Format {
                path: path.to_path_buf(),
                source,
            })?;
            debug!(
                "Found {} archetypes for class {} in file {}",
                archetype.narch(),
                archetype.class(),
                path.display()
            );

            let class = archetype.class().clone();
            if let Some(first) = catalog.sources.get(&class) {
                match policy {
                    DuplicateClassPolicy::Reject => {
                        return Err(CatalogError::Conflict {
                            class,
                            first: first.clone(),
                            second: path.to_path_buf(),
                        });
                    }
                    DuplicateClassPolicy::LastWins => {
                        warn!(
                            "Class {} from {} replaces {}",
                            class,
                            path.display(),
                            first.display()
                        );
                    }
                }
            }

            catalog.sources.insert(class.clone(), path.to_path_buf());
            catalog.archetypes.insert(class, archetype);
        }

        info!("Loaded archetypes for {} classes", catalog.len());
        Ok(catalog)
    }

    /// Add an in-memory archetype, returning the one it replaces
    pub fn insert(&mut self, archetype: Archetype) -> Option<Archetype> {
        let class = archetype.class().clone();
        self.sources.remove(&class);
        match self.archetypes.entry(class) {
            Entry::Occupied(mut entry) => Some(entry.insert(archetype)),
            Entry::Vacant(entry) => {
                entry.insert(archetype);
                None
            }
        }
    }

    /// Get the archetypes of a class
    #[must_use]
    pub fn get(&self, class: &SpectralClass) -> Option<&Archetype> {
        self.archetypes.get(class)
    }

    /// The file a class was loaded from, if any
    #[must_use]
    pub fn source(&self, class: &SpectralClass) -> Option<&Path> {
        self.sources.get(class).map(PathBuf::as_path)
    }

    /// Loaded classes in sorted order
    pub fn classes(&self) -> impl Iterator<Item = &SpectralClass> {
        self.archetypes.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SpectralClass, &Archetype)> {
        self.archetypes.iter()
    }

    /// Number of classes in catalog
    #[must_use]
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Check if catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    #[must_use]
    pub fn summaries(&self) -> Vec<ClassSummary> {
        self.iter()
            .map(|(class, archetype)| ClassSummary {
                class: class.clone(),
                narch: archetype.narch(),
                nwave: archetype.nwave(),
                version: archetype.version().to_string(),
                source: self.sources.get(class).cloned(),
            })
            .collect()
    }

    /// Export a summary of the catalog to JSON
    ///
    /// # Errors
    ///
    /// Returns `Export` if serialization fails.
    pub fn summary_json(&self) -> Result<String, CatalogError> {
        let summary = CatalogSummary {
            created_at: chrono::Utc::now().to_rfc3339(),
            classes: self.summaries(),
        };
        Ok(serde_json::to_string_pretty(&summary)?)
    }
}
