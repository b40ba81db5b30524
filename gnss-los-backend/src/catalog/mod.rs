///! Orbital element catalogs: OMM JSON and three-line TLE files

pub mod loader;
pub mod omm;
pub mod tle;

pub use loader::{load_elements, CatalogFormat};
pub use omm::OmmRecord;
pub use tle::{convert_file, tle_to_omm};
