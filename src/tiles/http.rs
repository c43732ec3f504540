use super::cache::TileCache;
use super::source::CachingTileSource;
use crate::core::constants::TILE_SIZE;
use crate::core::geo::TileCoord;
use crate::{MapError, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Shared async HTTP client with a custom User-Agent so that public tile
/// servers (e.g. OpenStreetMap) don't reject the request. Building the client
/// once avoids the cost of TLS and connection pool setup for every tile.
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("overzoom/", env!("CARGO_PKG_VERSION")))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(16)
        .build()
        .unwrap_or_else(|e| {
            log::warn!("falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSourceOptions {
    /// URL with `{s}`, `{z}`, `{x}`, `{y}` and `{r}` (retina suffix) placeholders
    pub url_template: String,
    pub subdomains: Vec<String>,
    pub tile_size: u32,
    pub cache_capacity: usize,
    pub timeout_ms: u64,
}

impl Default for HttpSourceOptions {
    fn default() -> Self {
        Self {
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            subdomains: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            tile_size: TILE_SIZE,
            cache_capacity: 1024,
            timeout_ms: 10_000,
        }
    }
}

/// Tile source that serves an in-memory LRU cache and fills it over HTTP.
///
/// A single attempt is made per `load_tile`; the renderer's next draw pass
/// asks again if the tile is still missing.
pub struct HttpTileSource {
    options: HttpSourceOptions,
    cache: TileCache,
}

impl HttpTileSource {
    pub fn new(options: HttpSourceOptions) -> std::result::Result<Self, MapError> {
        if options.tile_size == 0 {
            return Err(MapError::Config("tile_size must be non-zero".to_string()));
        }
        let cache = TileCache::new(options.cache_capacity);
        Ok(Self { options, cache })
    }

    pub fn openstreetmap() -> Self {
        Self {
            cache: TileCache::new(HttpSourceOptions::default().cache_capacity),
            options: HttpSourceOptions::default(),
        }
    }

    pub fn options(&self) -> &HttpSourceOptions {
        &self.options
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    /// Build the request URL for `coord`
    pub fn url(&self, coord: &TileCoord) -> String {
        let subdomain = if self.options.subdomains.is_empty() {
            ""
        } else {
            let idx = ((coord.x as u64 + coord.y as u64) % self.options.subdomains.len() as u64) as usize;
            self.options.subdomains[idx].as_str()
        };
        let retina = if coord.scale >= 2.0 { "@2x" } else { "" };

        self.options
            .url_template
            .replace("{s}", subdomain)
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
            .replace("{r}", retina)
    }
}

#[async_trait]
impl CachingTileSource for HttpTileSource {
    fn cached_data(&self, coord: &TileCoord) -> Option<Arc<Vec<u8>>> {
        self.cache.get(coord)
    }

    async fn load_tile(&self, coord: &TileCoord) -> Result<Arc<Vec<u8>>> {
        if let Some(data) = self.cache.get(coord) {
            return Ok(data);
        }

        let url = self.url(coord);
        log::debug!("fetch tile {} from {}", coord, url);

        let response = HTTP_CLIENT
            .get(&url)
            .timeout(Duration::from_millis(self.options.timeout_ms))
            .send()
            .await
            .map_err(MapError::from)?;

        if !response.status().is_success() {
            return Err(format!("HTTP {} for tile {}", response.status(), coord).into());
        }

        let data = Arc::new(response.bytes().await.map_err(MapError::from)?.to_vec());
        log::info!("downloaded tile {} ({} bytes)", coord, data.len());
        self.cache.put(coord, Arc::clone(&data));
        Ok(data)
    }

    fn tile_size(&self) -> (f64, f64) {
        let size = self.options.tile_size as f64;
        (size, size)
    }
}
