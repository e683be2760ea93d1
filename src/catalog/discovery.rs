use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable pointing at a directory of archetype files
pub const ARCHETYPE_DIR_ENV: &str = "RR_ARCHETYPE_DIR";

/// File name prefix of archetype files
pub const ARCHETYPE_FILE_PREFIX: &str = "rrarchetype-";

/// File name extension of archetype files
pub const ARCHETYPE_FILE_EXTENSION: &str = ".json";

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Archetype directory not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read archetype directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where to look for archetype files.
///
/// Sources are consulted in order: an explicit directory, then the
/// environment override, then the directory shipped with the crate. The
/// first source that is set is used even if it does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchetypeDiscovery {
    pub explicit: Option<PathBuf>,
    pub env_override: Option<PathBuf>,
    pub packaged_default: PathBuf,
}

impl ArchetypeDiscovery {
    /// Build the lookup chain from an optional explicit directory and the
    /// current process environment
    #[must_use]
    pub fn from_env(explicit: Option<&Path>) -> Self {
        let env_override = std::env::var_os(ARCHETYPE_DIR_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self {
            explicit: explicit.map(Path::to_path_buf),
            env_override,
            packaged_default: packaged_archetype_dir(),
        }
    }

    /// The directory that will be searched
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the selected source is not a directory.
    pub fn resolve_dir(&self) -> Result<PathBuf, DiscoveryError> {
        let dir = self
            .explicit
            .as_ref()
            .or(self.env_override.as_ref())
            .unwrap_or(&self.packaged_default);

        if dir.is_dir() {
            Ok(dir.clone())
        } else {
            Err(DiscoveryError::NotFound(dir.clone()))
        }
    }

    /// All archetype files in the resolved directory, sorted by path
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no directory to search, or `Io` if it
    /// cannot be listed.
    pub fn find_files(&self) -> Result<Vec<PathBuf>, DiscoveryError> {
        let dir = self.resolve_dir()?;
        let io_error = |source| DiscoveryError::Io {
            path: dir.clone(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.is_file() && is_archetype_file_name(&path) {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            warn!("No archetype files found in {}", dir.display());
        } else {
            debug!("Found {} archetype files in {}", files.len(), dir.display());
        }
        Ok(files)
    }
}

/// Archetype files from `explicit`, `$RR_ARCHETYPE_DIR`, or the packaged
/// directory, in that order of preference
///
/// # Errors
///
/// See [`ArchetypeDiscovery::find_files`].
pub fn find_archetype_files(explicit: Option<&Path>) -> Result<Vec<PathBuf>, DiscoveryError> {
    ArchetypeDiscovery::from_env(explicit).find_files()
}

/// Directory of archetype files shipped alongside the crate
#[must_use]
pub fn packaged_archetype_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("archetypes")
}

fn is_archetype_file_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| {
            name.starts_with(ARCHETYPE_FILE_PREFIX) && name.ends_with(ARCHETYPE_FILE_EXTENSION)
        })
}
