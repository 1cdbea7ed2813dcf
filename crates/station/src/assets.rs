//! Portal model resolution with a fallback chain and a shared cache.
//!
//! A model is tried from its primary URL, then its fallback URL, then the
//! library-wide default. If all fail the portal keeps a placeholder; the
//! failure is logged and never surfaced as an error.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("failed to read {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Model attached to a portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRef {
    pub url: String,
    #[serde(default)]
    pub fallback_url: Option<String>,
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Whether the model carries animations (gets an animation mixer).
    #[serde(default)]
    pub animated: bool,
}

fn default_scale() -> f32 {
    1.0
}

impl ModelRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            fallback_url: None,
            scale: 1.0,
            animated: false,
        }
    }

    pub fn with_fallback(mut self, url: impl Into<String>) -> Self {
        self.fallback_url = Some(url.into());
        self
    }

    pub fn animated(mut self) -> Self {
        self.animated = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModel {
    pub url: String,
    pub byte_len: usize,
}

/// Where a model's bytes come from.
pub trait ModelFetcher {
    fn fetch(&mut self, url: &str) -> Result<LoadedModel, AssetError>;
}

/// Reads models from a local directory. URLs are resolved by file name.
pub struct LocalFetcher {
    root: PathBuf,
}

impl LocalFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ModelFetcher for LocalFetcher {
    fn fetch(&mut self, url: &str) -> Result<LoadedModel, AssetError> {
        let file_name = url.rsplit('/').next().unwrap_or(url);
        let path = self.root.join(file_name);
        if !path.exists() {
            return Err(AssetError::NotFound(url.to_string()));
        }
        let bytes = std::fs::read(&path).map_err(|source| AssetError::Io {
            url: url.to_string(),
            source,
        })?;
        Ok(LoadedModel {
            url: url.to_string(),
            byte_len: bytes.len(),
        })
    }
}

/// Which link of the fallback chain produced the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource {
    Primary,
    Fallback,
    Default,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedModel {
    pub source: ModelSource,
    pub model: Option<LoadedModel>,
}

pub struct ModelLibrary {
    fetcher: Box<dyn ModelFetcher>,
    default_url: Option<String>,
    cache: HashMap<String, LoadedModel>,
    fetch_count: usize,
}

impl ModelLibrary {
    pub fn new(fetcher: Box<dyn ModelFetcher>, default_url: Option<String>) -> Self {
        Self {
            fetcher,
            default_url,
            cache: HashMap::new(),
            fetch_count: 0,
        }
    }

    /// Library reading from `./assets`.
    pub fn offline() -> Self {
        Self::new(Box::new(LocalFetcher::new("assets")), Some("portal_default.glb".to_string()))
    }

    /// Number of fetches that actually hit the fetcher.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count
    }

    pub fn is_cached(&self, url: &str) -> bool {
        self.cache.contains_key(url)
    }

    /// Resolve `model` for `owner` through the fallback chain.
    pub fn resolve(&mut self, owner: &str, model: &ModelRef) -> ResolvedModel {
        let default_url = self.default_url.clone();
        let chain = [
            (ModelSource::Primary, Some(model.url.as_str())),
            (ModelSource::Fallback, model.fallback_url.as_deref()),
            (ModelSource::Default, default_url.as_deref()),
        ];
        for (source, url) in chain {
            let Some(url) = url else { continue };
            match self.load(url) {
                Ok(loaded) => {
                    if source != ModelSource::Primary {
                        log::warn!("Portal '{}' using {:?} model {}", owner, source, url);
                    }
                    return ResolvedModel {
                        source,
                        model: Some(loaded),
                    };
                }
                Err(e) => log::debug!("Portal '{}': {}", owner, e),
            }
        }
        log::error!("Portal '{}' has no loadable model, keeping placeholder", owner);
        ResolvedModel {
            source: ModelSource::Placeholder,
            model: None,
        }
    }

    fn load(&mut self, url: &str) -> Result<LoadedModel, AssetError> {
        if let Some(cached) = self.cache.get(url) {
            return Ok(cached.clone());
        }
        self.fetch_count += 1;
        let loaded = self.fetcher.fetch(url)?;
        self.cache.insert(url.to_string(), loaded.clone());
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Serves a fixed set of URLs.
    struct Catalog(HashSet<&'static str>);

    impl ModelFetcher for Catalog {
        fn fetch(&mut self, url: &str) -> Result<LoadedModel, AssetError> {
            if self.0.contains(url) {
                Ok(LoadedModel {
                    url: url.to_string(),
                    byte_len: 64,
                })
            } else {
                Err(AssetError::NotFound(url.to_string()))
            }
        }
    }

    fn library(available: &[&'static str]) -> ModelLibrary {
        ModelLibrary::new(
            Box::new(Catalog(available.iter().copied().collect())),
            Some("default.glb".to_string()),
        )
    }

    #[test]
    fn fallback_chain_order() {
        let model = ModelRef::new("a.glb").with_fallback("b.glb");

        let mut lib = library(&["a.glb", "b.glb", "default.glb"]);
        assert_eq!(lib.resolve("p", &model).source, ModelSource::Primary);

        let mut lib = library(&["b.glb", "default.glb"]);
        assert_eq!(lib.resolve("p", &model).source, ModelSource::Fallback);

        let mut lib = library(&["default.glb"]);
        assert_eq!(lib.resolve("p", &model).source, ModelSource::Default);

        let mut lib = library(&[]);
        let resolved = lib.resolve("p", &model);
        assert_eq!(resolved.source, ModelSource::Placeholder);
        assert!(resolved.model.is_none());
    }

    #[test]
    fn cached_models_are_fetched_once() {
        let mut lib = library(&["a.glb"]);
        let model = ModelRef::new("a.glb");
        lib.resolve("one", &model);
        lib.resolve("two", &model);
        assert_eq!(lib.fetch_count(), 1);
        assert!(lib.is_cached("a.glb"));
    }

    #[test]
    fn local_fetcher_reports_missing_files() {
        let mut fetcher = LocalFetcher::new("/nonexistent-station-assets");
        assert!(matches!(
            fetcher.fetch("https://cdn.example/models/ring.glb"),
            Err(AssetError::NotFound(_))
        ));
    }
}
