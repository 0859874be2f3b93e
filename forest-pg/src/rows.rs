//! Lignes canoniques des entités cibles
//!
//! Chaque type connaît sa requête INSERT et le binding de ses paramètres.
//! La géométrie voyage en texte GeoJSON: c'est le store qui force le
//! multipolygone et le système de référence cible
//! (`ST_Multi(ST_GeomFromGeoJSON(...))::geometry(MultiPolygon,4326)`).
//!
//! Le filtrage pré-batch vit dans les constructeurs `from_feature`: une
//! feature sans champ identifiant obligatoire ou sans géométrie donne
//! `None` et n'est jamais bufferisée (ni comptée comme échec).

use bdsource::Feature;
use tokio_postgres::types::ToSql;

/// Une ligne canonique insérable par lots
pub trait StoreRow: Send + Sync {
    /// Table cible
    const TABLE: &'static str;

    /// Requête INSERT, préparée une fois par batch
    const INSERT_SQL: &'static str;

    /// Paramètres dans l'ordre des placeholders de `INSERT_SQL`
    fn params(&self) -> Vec<&(dyn ToSql + Sync)>;
}

/// Région administrative
#[derive(Debug, Clone)]
pub struct RegionRow {
    pub code: String,
    pub nom: String,
    pub geom: String,
}

impl RegionRow {
    /// Normalise une feature; `None` sans géométrie
    pub fn from_feature(feature: &Feature) -> Option<Self> {
        Some(Self {
            code: feature.prop_or_empty("code"),
            nom: feature.prop_or_empty("nom"),
            geom: feature.geometry_json()?,
        })
    }
}

impl StoreRow for RegionRow {
    const TABLE: &'static str = "regions";
    const INSERT_SQL: &'static str = "INSERT INTO regions (code, nom, geom) VALUES \
         ($1, $2, ST_Multi(ST_GeomFromGeoJSON($3))::geometry(MultiPolygon,4326))";

    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        vec![&self.code, &self.nom, &self.geom]
    }
}

/// Département administratif; `region_code` peut manquer à l'import et
/// être réparé ensuite par contenance spatiale
#[derive(Debug, Clone)]
pub struct DepartementRow {
    pub code: String,
    pub nom: String,
    pub region_code: Option<String>,
    pub geom: String,
}

impl DepartementRow {
    /// Normalise une feature; la référence région imbriquée
    /// (`properties.region.code`) peut être un objet, null, ou absente
    pub fn from_feature(feature: &Feature) -> Option<Self> {
        Some(Self {
            code: feature.prop_or_empty("code"),
            nom: feature.prop_or_empty("nom"),
            region_code: feature.nested_code("region"),
            geom: feature.geometry_json()?,
        })
    }
}

impl StoreRow for DepartementRow {
    const TABLE: &'static str = "departements";
    const INSERT_SQL: &'static str =
        "INSERT INTO departements (code, nom, region_code, geom) VALUES \
         ($1, $2, $3, ST_Multi(ST_GeomFromGeoJSON($4))::geometry(MultiPolygon,4326))";

    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        vec![&self.code, &self.nom, &self.region_code, &self.geom]
    }
}

/// Commune; le code département vient de la configuration du run,
/// pas du fichier
#[derive(Debug, Clone)]
pub struct CommuneRow {
    pub code: String,
    pub nom: String,
    pub departement_code: String,
    pub geom: String,
}

impl CommuneRow {
    pub fn from_feature(feature: &Feature, departement: &str) -> Option<Self> {
        Some(Self {
            code: feature.prop_or_empty("code"),
            nom: feature.prop_or_empty("nom"),
            departement_code: departement.to_string(),
            geom: feature.geometry_json()?,
        })
    }
}

impl StoreRow for CommuneRow {
    const TABLE: &'static str = "communes";
    const INSERT_SQL: &'static str =
        "INSERT INTO communes (code, nom, departement_code, geom) VALUES \
         ($1, $2, $3, ST_Multi(ST_GeomFromGeoJSON($4))::geometry(MultiPolygon,4326))";

    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        vec![&self.code, &self.nom, &self.departement_code, &self.geom]
    }
}

/// Parcelle cadastrale; le pipeline n'impose aucune contrainte d'unicité,
/// seule la troncature initiale évite les doublons entre runs
#[derive(Debug, Clone)]
pub struct ParcelleRow {
    pub commune: String,
    pub departement: String,
    pub section: String,
    pub numero: String,
    pub geom: String,
}

impl ParcelleRow {
    /// Normalise une feature; `None` sans identifiant commune ou sans
    /// géométrie (filtrage silencieux pré-batch)
    pub fn from_feature(feature: &Feature, departement: &str) -> Option<Self> {
        let commune = feature.prop_str("commune")?;
        if commune.is_empty() {
            return None;
        }
        Some(Self {
            commune: commune.to_string(),
            departement: departement.to_string(),
            section: feature.prop_or_empty("section"),
            numero: feature.prop_or_empty("numero"),
            geom: feature.geometry_json()?,
        })
    }
}

impl StoreRow for ParcelleRow {
    const TABLE: &'static str = "cadastre_parcelles";
    const INSERT_SQL: &'static str =
        "INSERT INTO cadastre_parcelles (commune, departement, section, numero, geom) VALUES \
         ($1, $2, $3, $4, ST_Multi(ST_GeomFromGeoJSON($5))::geometry(MultiPolygon,4326))";

    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        vec![
            &self.commune,
            &self.departement,
            &self.section,
            &self.numero,
            &self.geom,
        ]
    }
}
