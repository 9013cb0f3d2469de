// HTTP asset loader: fetches every configured resource before the session starts.

use crate::domain::{Asset, AssetCatalog, AssetKind};

use futures::future::try_join_all;
use std::fmt;
use tracing::{debug, info};
use url::Url;

#[derive(Debug)]
pub enum AssetLoadError {
    InvalidUrl { url: String, source: url::ParseError },
    Transport { url: String, source: reqwest::Error },
    Status { url: String, status: reqwest::StatusCode },
}

impl fmt::Display for AssetLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetLoadError::InvalidUrl { url, source } => {
                write!(f, "invalid asset url {url}: {source}")
            }
            AssetLoadError::Transport { url, source } => {
                write!(f, "failed to fetch {url}: {source}")
            }
            AssetLoadError::Status { url, status } => {
                write!(f, "unexpected status {status} for {url}")
            }
        }
    }
}

impl std::error::Error for AssetLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetLoadError::InvalidUrl { source, .. } => Some(source),
            AssetLoadError::Transport { source, .. } => Some(source),
            AssetLoadError::Status { .. } => None,
        }
    }
}

/// Fetches all `requests` concurrently and fails on the first error.
///
/// Urls are resolved against `base`; the catalog keys assets by the url as requested.
pub async fn load_assets<I>(
    client: &reqwest::Client,
    base: &Url,
    requests: I,
) -> Result<AssetCatalog, AssetLoadError>
where
    I: IntoIterator<Item = (AssetKind, String)>,
{
    let fetches = requests
        .into_iter()
        .map(|(kind, url)| fetch_asset(client, base, kind, url));
    let assets = try_join_all(fetches).await?;

    let mut catalog = AssetCatalog::new();
    for asset in assets {
        catalog.insert(asset);
    }
    info!(count = catalog.len(), "assets loaded");
    Ok(catalog)
}

async fn fetch_asset(
    client: &reqwest::Client,
    base: &Url,
    kind: AssetKind,
    url: String,
) -> Result<Asset, AssetLoadError> {
    let resolved = base
        .join(&url)
        .map_err(|source| AssetLoadError::InvalidUrl {
            url: url.clone(),
            source,
        })?;

    let response = client
        .get(resolved.clone())
        .send()
        .await
        .map_err(|source| AssetLoadError::Transport {
            url: url.clone(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(AssetLoadError::Status { url, status });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|source| AssetLoadError::Transport {
            url: url.clone(),
            source,
        })?;
    debug!(%kind, %resolved, bytes = bytes.len(), "asset fetched");

    Ok(Asset {
        kind,
        url,
        bytes: bytes.to_vec(),
    })
}
