//! Advertisement endpoints: banner/popup ads, scheduling, display feeds and
//! tablet ads.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::item_path;
use crate::client::ApiClient;
use crate::error::SessionResult;

/// Lifecycle status of an ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdStatus {
    Active,
    Inactive,
    Pending,
    Paused,
}

impl AdStatus {
    /// Parses a status string; unknown values count as inactive.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "active" => Self::Active,
            "pending" => Self::Pending,
            "paused" => Self::Paused,
            _ => Self::Inactive,
        }
    }

    /// Human-readable label for listings.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Running",
            Self::Inactive => "Ended",
            Self::Pending => "Pending",
            Self::Paused => "Paused",
        }
    }
}

impl fmt::Display for AdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
            Self::Pending => write!(f, "pending"),
            Self::Paused => write!(f, "paused"),
        }
    }
}

#[derive(Clone)]
pub struct AdService {
    api: ApiClient,
}

impl AdService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self, params: &[(String, String)]) -> SessionResult<Value> {
        self.api.get_json_with_query("/api/ads", params).await
    }

    pub async fn search(&self, params: &[(String, String)]) -> SessionResult<Value> {
        self.api.get_json_with_query("/api/ads/search", params).await
    }

    /// Ads shown on the public customer portal.
    pub async fn public(&self, params: &[(String, String)]) -> SessionResult<Value> {
        self.api.get_json_with_query("/api/public/ads", params).await
    }

    /// Paginated listing across all salons.
    pub async fn list_paged(&self, params: &[(String, String)]) -> SessionResult<Value> {
        self.api.get_json_with_query("/api/ads/list", params).await
    }

    pub async fn get(&self, id: &str) -> SessionResult<Value> {
        self.api.get_json(&item_path("/api/ads", id)?).await
    }

    pub async fn create(&self, body: &Value) -> SessionResult<Value> {
        self.api.post_json("/api/ads", body).await
    }

    pub async fn update(&self, id: &str, body: &Value) -> SessionResult<Value> {
        self.api.put_json(&item_path("/api/ads", id)?, body).await
    }

    pub async fn delete(&self, id: &str) -> SessionResult<Value> {
        self.api.delete(&item_path("/api/ads", id)?).await
    }

    /// Ads currently eligible for display screens.
    pub async fn display(&self) -> SessionResult<Value> {
        self.api.get_json("/api/display/ads").await
    }

    pub async fn schedule(&self, body: &Value) -> SessionResult<Value> {
        self.api.post_json("/api/ads/schedule", body).await
    }

    pub async fn set_active(&self, id: &str, active: bool) -> SessionResult<Value> {
        self.api
            .put_json(&item_path("/api/ads", id)?, &json!({ "is_active": active }))
            .await
    }

    pub async fn tablet_list(&self) -> SessionResult<Value> {
        self.api.get_json("/api/ads/tablet").await
    }

    pub async fn tablet_create(&self, body: &Value) -> SessionResult<Value> {
        self.api.post_json("/api/ads/tablet/size", body).await
    }

    /// Tablet ads currently eligible for display.
    pub async fn tablet_active(&self) -> SessionResult<Value> {
        self.api.get_json("/api/display/tablet-ads").await
    }

    pub async fn tablet_get(&self, id: &str) -> SessionResult<Value> {
        self.api.get_json(&item_path("/api/ads/tablet", id)?).await
    }

    pub async fn tablet_update(&self, id: &str, body: &Value) -> SessionResult<Value> {
        self.api
            .patch_json(&item_path("/api/ads/tablet", id)?, body)
            .await
    }

    pub async fn tablet_delete(&self, id: &str) -> SessionResult<Value> {
        self.api.delete(&item_path("/api/ads/tablet", id)?).await
    }
}
