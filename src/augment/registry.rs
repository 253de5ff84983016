use std::collections::BTreeMap;

use crate::augment::{DynAugmentation, RandomBrightness, RandomBrightnessConfig, RandomFlip, RandomFlipConfig};
use crate::error::BvrError;
use crate::Result;

pub type AugmentationFactory =
    Box<dyn Fn(&serde_json::Value) -> Result<Box<dyn DynAugmentation>> + Send + Sync>;

/// Name to constructor map for augmentations built from serialized parameters.
///
/// Populated explicitly by its owner; there is no process-wide instance.
#[derive(Default)]
pub struct AugmentationRegistry {
    factories: BTreeMap<String, AugmentationFactory>,
}

impl std::fmt::Debug for AugmentationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AugmentationRegistry")
            .field("names", &self.names())
            .finish()
    }
}

fn params<T: serde::de::DeserializeOwned>(name: &str, value: &serde_json::Value) -> Result<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| BvrError::InvalidConfig(format!("bad parameters for `{}`: {}", name, e)))
}

impl AugmentationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `random_flip` and `random_brightness`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("random_flip", |value| {
            let config: RandomFlipConfig = params("random_flip", value)?;
            Ok(Box::new(RandomFlip::from_config(config)?) as Box<dyn DynAugmentation>)
        });
        registry.register("random_brightness", |value| {
            let config: RandomBrightnessConfig = params("random_brightness", value)?;
            Ok(Box::new(RandomBrightness::from_config(config)?) as Box<dyn DynAugmentation>)
        });
        registry
    }

    /// Adds or replaces the constructor for `name`.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&serde_json::Value) -> Result<Box<dyn DynAugmentation>> + Send + Sync + 'static,
    {
        log::trace!("Registering augmentation `{}`", name);
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    pub fn build(&self, name: &str, params: &serde_json::Value) -> Result<Box<dyn DynAugmentation>> {
        match self.factories.get(name) {
            Some(factory) => factory(params),
            None => {
                log::warn!("Unknown augmentation `{}`, registered: {:?}", name, self.names());
                Err(BvrError::UnknownAugmentation(name.to_string()))
            }
        }
    }
}
