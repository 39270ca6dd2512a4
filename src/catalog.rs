use std::path::Path;

use anyhow::Context;
use itertools::Itertools;
use serde::Deserialize;

use crate::units::UnitScale;

/// One row of the model metadata table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelMetadata {
    pub name: String,
    #[serde(default)]
    pub institution: String,
    /// Location of the model file, relative to the viewer unless absolute.
    pub path: String,
    /// Page describing the original object.
    #[serde(default)]
    pub url: String,
    #[serde(default, deserialize_with = "UnitScale::deserialize_lenient")]
    pub scale: UnitScale,
    #[serde(default)]
    pub dimensions: Option<String>,
}

/// The metadata table, `{"model": [...]}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelCatalog {
    #[serde(rename = "model", default)]
    models: Vec<ModelMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLink {
    pub name: String,
    pub href: String,
    pub debug_href: String,
}

impl ModelCatalog {
    pub fn new(models: Vec<ModelMetadata>) -> Self {
        Self { models }
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Failed to parse model catalog")
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model catalog {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn models(&self) -> &[ModelMetadata] {
        &self.models
    }

    /// Looks up a model by its 1-based number.
    pub fn get(&self, number: usize) -> Option<&ModelMetadata> {
        number.checked_sub(1).and_then(|index| self.models.get(index))
    }

    /// Viewer links for every model, optionally limited to one institution.
    pub fn links(&self, page: &str, institution: Option<&str>) -> Vec<ModelLink> {
        self.models
            .iter()
            .enumerate()
            .filter(|(_, model)| institution.map_or(true, |wanted| model.institution == wanted))
            .map(|(index, model)| {
                let href = format!("{}?model={}", page, index + 1);
                ModelLink {
                    name: model.name.clone(),
                    debug_href: format!("{}&debug=true", href),
                    href,
                }
            })
            .collect()
    }

    pub fn institutions(&self) -> Vec<&str> {
        self.models
            .iter()
            .map(|model| model.institution.as_str())
            .filter(|institution| !institution.is_empty())
            .unique()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "model": [
            {"name": "Avocado", "institution": "Khronos", "path": "models/avocado/Avocado.gltf",
             "url": "https://example.org/avocado", "scale": "m"},
            {"name": "Side Chair", "institution": "UC Merced", "path": "models/side-chair/chair.gltf",
             "scale": "cm", "dimensions": "96.5 x 52 x 47 cm"},
            {"name": "Blue Crab", "institution": "UC Merced", "path": "models/blue-crab/crab.gltf",
             "scale": "unspecified"}
        ]
    }"#;

    #[test]
    fn parses_rows_and_scales() {
        let catalog = ModelCatalog::from_json(CATALOG).unwrap();
        assert_eq!(catalog.models().len(), 3);
        assert_eq!(catalog.get(1).unwrap().scale, UnitScale::Meters);
        assert_eq!(catalog.get(2).unwrap().dimensions.as_deref(), Some("96.5 x 52 x 47 cm"));
        assert_eq!(catalog.get(3).unwrap().scale, UnitScale::Unknown);
    }

    #[test]
    fn model_numbers_are_one_based() {
        let catalog = ModelCatalog::from_json(CATALOG).unwrap();
        assert!(catalog.get(0).is_none());
        assert_eq!(catalog.get(1).unwrap().name, "Avocado");
        assert!(catalog.get(4).is_none());
    }

    #[test]
    fn links_filter_by_institution() {
        let catalog = ModelCatalog::from_json(CATALOG).unwrap();
        let links = catalog.links("currentviewer.html", Some("UC Merced"));

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].href, "currentviewer.html?model=2");
        assert_eq!(links[1].debug_href, "currentviewer.html?model=3&debug=true");
        assert_eq!(catalog.institutions(), vec!["Khronos", "UC Merced"]);
    }
}
