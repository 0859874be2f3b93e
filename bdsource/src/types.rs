//! Types de données pour le crate bdsource

use serde_json::{Map, Value};

/// Une feature géographique lue depuis un document source.
///
/// Éphémère: construite à la lecture, normalisée en ligne canonique,
/// jamais persistée telle quelle.
#[derive(Debug, Clone)]
pub struct Feature {
    /// Géométrie GeoJSON (absente sur certaines features dégradées)
    pub geometry: Option<geojson::Geometry>,

    /// Attributs de la feature (sac de propriétés JSON)
    pub properties: Map<String, Value>,
}

impl Feature {
    /// Lit une propriété texte, `None` si absente ou non-texte
    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Lit une propriété texte avec défaut vide (lecture-ou-repli
    /// résolue une seule fois à la normalisation)
    pub fn prop_or_empty(&self, key: &str) -> String {
        self.prop_str(key).unwrap_or_default().to_string()
    }

    /// Lit un code dans une référence imbriquée: `properties.<key>.code`.
    ///
    /// La référence peut être un objet, `null`, ou absente.
    pub fn nested_code(&self, key: &str) -> Option<String> {
        self.properties
            .get(key)
            .and_then(Value::as_object)
            .and_then(|obj| obj.get("code"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Sérialise la géométrie en texte GeoJSON (pour `ST_GeomFromGeoJSON`)
    pub fn geometry_json(&self) -> Option<String> {
        self.geometry.as_ref().map(|g| g.to_string())
    }
}
