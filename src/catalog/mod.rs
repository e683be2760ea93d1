//! Archetype discovery and the catalog of loaded classes.
//!
//! Archetype files are JSON documents named `rrarchetype-*.json`. They are
//! looked up in, by order of preference:
//!
//! 1. a directory given explicitly (`--dir` on the command line)
//! 2. the directory named by `$RR_ARCHETYPE_DIR`
//! 3. the `archetypes/` directory shipped with the crate
//!
//! Each file holds every archetype of one spectral class and becomes one
//! [`Archetype`](crate::core::archetype::Archetype) in the catalog.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rr_archetype::{ArchetypeCatalog, DuplicateClassPolicy, SpectralClass};
//!
//! let catalog = ArchetypeCatalog::load(None, DuplicateClassPolicy::default()).unwrap();
//! for class in catalog.classes() {
//!     println!("{class}");
//! }
//!
//! let galaxy = catalog.get(&SpectralClass::new("GALAXY"));
//! ```

pub mod discovery;
pub mod store;
