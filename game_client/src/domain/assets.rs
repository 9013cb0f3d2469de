// Loaded presentation resources keyed by kind and url.

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Font,
    Texture,
    Audio,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Font => write!(f, "font"),
            AssetKind::Texture => write!(f, "texture"),
            AssetKind::Audio => write!(f, "audio"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub kind: AssetKind,
    pub url: String,
    pub bytes: Vec<u8>,
}

/// Lookup of a resource that was never loaded.
///
/// This is a configuration mistake (the url was not passed to the loader), so callers
/// propagate it instead of substituting a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNotFound {
    pub kind: AssetKind,
    pub url: String,
}

impl fmt::Display for ResourceNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} not found: {} (check the url is listed in the {} urls passed to the loader)",
            self.kind, self.url, self.kind
        )
    }
}

impl std::error::Error for ResourceNotFound {}

#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    assets: HashMap<(AssetKind, String), Asset>,
}

impl AssetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset: Asset) {
        self.assets.insert((asset.kind, asset.url.clone()), asset);
    }

    pub fn get(&self, kind: AssetKind, url: &str) -> Result<&Asset, ResourceNotFound> {
        self.assets
            .get(&(kind, url.to_string()))
            .ok_or_else(|| ResourceNotFound {
                kind,
                url: url.to_string(),
            })
    }

    pub fn font(&self, url: &str) -> Result<&Asset, ResourceNotFound> {
        self.get(AssetKind::Font, url)
    }

    pub fn texture(&self, url: &str) -> Result<&Asset, ResourceNotFound> {
        self.get(AssetKind::Texture, url)
    }

    pub fn audio(&self, url: &str) -> Result<&Asset, ResourceNotFound> {
        self.get(AssetKind::Audio, url)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
