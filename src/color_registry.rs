//! Line-color registry: an external collaborator the core never
//! consults. Interface-only, styled after `platy-transit-radar`'s
//! `color_for_type`/`load_colors` but data-driven — a JSON
//! `{routeId: "#hex"}` map instead of a hardcoded match on
//! `route_type` or a semicolon-delimited CSV keyed by display name.

use std::collections::HashMap;
use std::path::Path;

use access_core::ids::RouteId;

use crate::error::LoadError;

pub trait RouteColorRegistry {
    fn color_for(&self, route_id: RouteId) -> Option<&str>;
}

#[derive(Debug, Default)]
pub struct JsonColorRegistry {
    colors: HashMap<RouteId, String>,
}

impl JsonColorRegistry {
    pub fn load(path: &Path) -> Result<JsonColorRegistry, LoadError> {
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io { path: path.to_owned(), source })?;
        let colors: HashMap<RouteId, String> = serde_json::from_slice(&bytes).map_err(|source| LoadError::Json { file: path.to_owned(), source })?;
        Ok(JsonColorRegistry { colors })
    }

    pub fn empty() -> JsonColorRegistry {
        JsonColorRegistry::default()
    }
}

impl RouteColorRegistry for JsonColorRegistry {
    fn color_for(&self, route_id: RouteId) -> Option<&str> {
        self.colors.get(&route_id).map(String::as_str)
    }
}
