//! Lecture des documents GeoJSON sources (FeatureCollection)

use std::path::Path;

use geojson::FeatureCollection;
use serde_json::Value;
use tracing::debug;

use crate::{Feature, SourceError};

/// Lit une FeatureCollection GeoJSON depuis un fichier.
///
/// Les téléchargements ratés laissent parfois un tableau JSON nu à la
/// place du document: ce cas est signalé par `NotAFeatureCollection`
/// plutôt que par une erreur de parsing.
///
/// # Errors
///
/// Retourne `SourceError` si le fichier est illisible, si le JSON est
/// invalide, ou si le document n'est pas une FeatureCollection.
pub fn read_feature_collection(path: &Path) -> Result<Vec<Feature>, SourceError> {
    let file = path.display().to_string();
    let content = std::fs::read_to_string(path)?;

    let value: Value = serde_json::from_str(&content)
        .map_err(|e| SourceError::invalid_json(&file, e.to_string()))?;

    if !value
        .as_object()
        .map_or(false, |obj| obj.contains_key("features"))
    {
        return Err(SourceError::NotAFeatureCollection { file });
    }

    let collection = FeatureCollection::try_from(value)
        .map_err(|e| SourceError::invalid_json(&file, e.to_string()))?;

    let features: Vec<Feature> = collection
        .features
        .into_iter()
        .map(|f| Feature {
            geometry: f.geometry,
            properties: f.properties.unwrap_or_default(),
        })
        .collect();

    debug!(file = %file, count = features.len(), "Read feature collection");
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_read_feature_collection() {
        let f = write_temp(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"code":"78"},
                 "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}},
                {"type":"Feature","properties":{"code":"91"},
                 "geometry":{"type":"Polygon","coordinates":[[[2,2],[3,2],[3,3],[2,2]]]}}
            ]}"#,
        );

        let features = read_feature_collection(f.path()).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].prop_str("code"), Some("78"));
        assert_eq!(features[1].prop_str("code"), Some("91"));
        assert!(features[0].geometry.is_some());
    }

    #[test]
    fn test_read_missing_geometry() {
        let f = write_temp(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"code":"01"},"geometry":null}
            ]}"#,
        );

        let features = read_feature_collection(f.path()).unwrap();
        assert_eq!(features.len(), 1);
        assert!(features[0].geometry.is_none());
    }

    #[test]
    fn test_read_bare_array_is_not_a_collection() {
        let f = write_temp(r#"[{"error": "download failed"}]"#);
        let err = read_feature_collection(f.path()).unwrap_err();
        assert!(matches!(err, SourceError::NotAFeatureCollection { .. }));
    }

    #[test]
    fn test_read_object_without_features() {
        let f = write_temp(r#"{"type":"Topology"}"#);
        let err = read_feature_collection(f.path()).unwrap_err();
        assert!(matches!(err, SourceError::NotAFeatureCollection { .. }));
    }

    #[test]
    fn test_read_invalid_json() {
        let f = write_temp("{not json");
        let err = read_feature_collection(f.path()).unwrap_err();
        assert!(matches!(err, SourceError::InvalidJson { .. }));
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_feature_collection(Path::new("/nonexistent/x.geojson")).unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
