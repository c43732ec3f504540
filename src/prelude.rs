//! Prelude module for common overzoom types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use overzoom::prelude::*;`

pub use crate::core::{
    bounds::Bounds,
    config::{OverlayConfig, OverlayProfile},
    geo::{Point, TileCoord, TileKey},
    zoom::ZoomLevelEstimator,
};

pub use crate::tiles::{
    cache::TileCache,
    fallback::{Fallback, FallbackResolver},
    http::{HttpSourceOptions, HttpTileSource},
    in_flight::{InFlightGuard, InFlightSet},
    source::CachingTileSource,
};

pub use crate::rendering::renderer::{CachingTileRenderer, DrawStats, RedrawRequest};

#[cfg(feature = "render")]
pub use crate::rendering::context::{DrawCommand, RenderContext};

pub use crate::runtime::{AsyncHandle, AsyncSpawner, ThreadSpawner};

#[cfg(feature = "tokio-runtime")]
pub use crate::runtime::TokioSpawner;

pub use crate::traits::{DrawingBackend, RasterImage};

pub use crate::{Error as MapError, Result};

pub use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};
