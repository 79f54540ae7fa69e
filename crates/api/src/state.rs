//! Application state shared across handlers.

use dashboard_core::{Error, ValidationErrorCode};
use rollup_engine::Dashboard;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::response::ApiError;

/// Bounds for `limit` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiLimits {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

fn default_limit() -> usize {
    10
}

fn default_max_limit() -> usize {
    1000
}

impl Default for ApiLimits {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl ApiLimits {
    /// The requested limit, or the default when absent.
    pub fn resolve(&self, requested: Option<usize>) -> Result<usize, ApiError> {
        match requested {
            None => Ok(self.default_limit),
            Some(n) if n <= self.max_limit => Ok(n),
            Some(n) => Err(Error::invalid(
                ValidationErrorCode::InvalidValue,
                format!("limit {} exceeds maximum of {}", n, self.max_limit),
            )
            .into()),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub limits: ApiLimits,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Self {
        Self::with_limits(dashboard, ApiLimits::default())
    }

    pub fn with_limits(dashboard: Dashboard, limits: ApiLimits) -> Self {
        Self {
            dashboard: Arc::new(dashboard),
            limits,
        }
    }
}
