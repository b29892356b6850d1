//! Handler configuration loaded from JSON.
//!
//! The common request parameters sit at the top level next to `host`:
//!
//! ```json
//! { "host": "https://api.example.com", "content_type": "application/json",
//!   "headers": [["Accept", "application/json"]], "transport_options": { "timeout": 30 } }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::KnockError;
use crate::types::RequestParams;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Bare host or `scheme://host`.
    pub host: String,
    #[serde(flatten)]
    pub common: RequestParams,
}

impl HandlerConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            common: RequestParams::default(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, KnockError> {
        serde_json::from_str(raw).map_err(|e| KnockError::Config(e.to_string()))
    }
}
