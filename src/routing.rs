use reqwest::Url;

use crate::catalog::{ModelCatalog, ModelMetadata};
use crate::error::ViewerError;
use crate::fetch::ModelSource;
use crate::units::UnitScale;

pub const INVALID_MODEL: &str = "Invalid model parameter or number in URL query string.";

/// What a viewer page was asked to show.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewerRoute {
    /// 1-based catalog row.
    pub model: Option<usize>,
    pub debug: bool,
    /// Replaces the catalog's unit for this model.
    pub scale: Option<UnitScale>,
}

impl ViewerRoute {
    /// Reads `model`, `debug` and `scale` from a page URL's query string.
    pub fn from_url(url: &Url) -> Self {
        let mut route = ViewerRoute::default();

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "model" => route.model = value.parse().ok(),
                "debug" => route.debug = value == "true",
                "scale" => route.scale = Some(UnitScale::parse_or_unknown(&value)),
                _ => {}
            }
        }

        route
    }
}

/// Everything a viewer session needs to know about its model. Built once per
/// session and never changed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub metadata: ModelMetadata,
    pub source: ModelSource,
    pub scale: UnitScale,
    pub debug: bool,
}

impl ModelConfig {
    /// Resolves `route` against the catalog. Relative model paths are
    /// resolved against `base`.
    pub fn resolve(
        catalog: &ModelCatalog,
        route: &ViewerRoute,
        base: &ModelSource,
    ) -> Result<Self, ViewerError> {
        let metadata = route
            .model
            .and_then(|number| catalog.get(number))
            .ok_or_else(|| ViewerError::Route(INVALID_MODEL.to_string()))?;

        Ok(Self {
            source: base.join(&metadata.path),
            scale: route.scale.unwrap_or(metadata.scale),
            debug: route.debug,
            metadata: metadata.clone(),
        })
    }

    /// A model given directly by location, without catalog metadata.
    pub fn direct(source: ModelSource, route: &ViewerRoute) -> Self {
        let name = match &source {
            ModelSource::Http(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .unwrap_or_default()
                .to_string(),
            ModelSource::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };

        Self {
            metadata: ModelMetadata {
                name,
                institution: String::new(),
                path: source.to_string(),
                url: String::new(),
                scale: UnitScale::Unknown,
                dimensions: None,
            },
            scale: route.scale.unwrap_or(UnitScale::Unknown),
            debug: route.debug,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn catalog() -> ModelCatalog {
        ModelCatalog::from_json(
            r#"{"model": [
                {"name": "George Washington", "institution": "Smithsonian",
                 "path": "models/george-washington/statue.gltf", "scale": "mm"}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn reads_query_parameters() {
        let url = Url::parse("https://example.org/currentviewer.html?model=1&debug=true&scale=ft").unwrap();
        let route = ViewerRoute::from_url(&url);

        assert_eq!(route.model, Some(1));
        assert!(route.debug);
        assert_eq!(route.scale, Some(UnitScale::Feet));

        let plain = ViewerRoute::from_url(&Url::parse("https://example.org/currentviewer.html?model=x").unwrap());
        assert_eq!(plain, ViewerRoute::default());
    }

    #[test]
    fn resolves_relative_paths_and_overrides() {
        let route = ViewerRoute {
            model: Some(1),
            debug: false,
            scale: Some(UnitScale::Centimeters),
        };
        let config = ModelConfig::resolve(&catalog(), &route, &ModelSource::parse("site")).unwrap();

        assert_eq!(
            config.source,
            ModelSource::File(PathBuf::from("site/models/george-washington/statue.gltf"))
        );
        assert_eq!(config.scale, UnitScale::Centimeters);
        assert_eq!(config.metadata.scale, UnitScale::Millimeters);
    }

    #[test]
    fn unknown_model_number_is_rejected() {
        let route = ViewerRoute {
            model: Some(9),
            ..ViewerRoute::default()
        };
        let err = ModelConfig::resolve(&catalog(), &route, &ModelSource::parse(".")).unwrap_err();
        assert_eq!(err.to_string(), INVALID_MODEL);

        let err = ModelConfig::resolve(&catalog(), &ViewerRoute::default(), &ModelSource::parse(".")).unwrap_err();
        assert!(matches!(err, ViewerError::Route(_)));
    }

    #[test]
    fn direct_sources_are_named_after_the_file() {
        let config = ModelConfig::direct(
            ModelSource::parse("https://example.org/models/Avocado.gltf"),
            &ViewerRoute::default(),
        );
        assert_eq!(config.metadata.name, "Avocado.gltf");
        assert_eq!(config.scale, UnitScale::Unknown);
    }
}
