use serde_json::Value;

use super::item_path;
use crate::client::ApiClient;
use crate::error::SessionResult;

/// Salon directory and administration endpoints.
#[derive(Clone)]
pub struct SalonService {
    api: ApiClient,
}

impl SalonService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// All salons visible to the signed-in administrator.
    pub async fn list(&self) -> SessionResult<Value> {
        self.api.get_json("/api/admin/salons").await
    }

    /// One page of the salon directory; the body carries `salons` and
    /// `pagination`.
    pub async fn list_paged(&self, params: &[(String, String)]) -> SessionResult<Value> {
        self.api.get_json_with_query("/api/salons", params).await
    }

    pub async fn delete(&self, id: &str) -> SessionResult<Value> {
        self.api.delete(&item_path("/api/salons", id)?).await
    }
}
