//! # bdsource
//!
//! Lecture des sources géospatiales utilisées par `forest-pg`:
//! documents GeoJSON (FeatureCollection) et résolution des schémas
//! variables de la BD Forêt.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bdsource::{read_feature_collection, schema};
//! use std::path::Path;
//!
//! let features = read_feature_collection(Path::new("regions.geojson"))?;
//! for f in &features {
//!     println!("{}", f.prop_or_empty("code"));
//! }
//!
//! let mapping = schema::resolve(schema::FOREST_FIELDS, &available_fields);
//! let sql = schema::forest_select(&mapping, "78");
//! ```

pub mod error;
pub mod reader;
pub mod schema;
pub mod types;

pub use error::SourceError;
pub use reader::read_feature_collection;
pub use types::Feature;
