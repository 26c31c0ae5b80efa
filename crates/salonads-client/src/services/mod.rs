//! Resource services over the intercepting client.
//!
//! Each call goes through [`crate::ApiClient::send`], so an expired access
//! token is refreshed and the call replayed transparently.

pub mod ads;
pub mod salons;

pub use ads::{AdService, AdStatus};
pub use salons::SalonService;

use url::Url;

use crate::error::{SessionError, SessionResult};

/// `{collection}/{id}` with `id` percent-encoded as a single path segment.
pub(crate) fn item_path(collection: &str, id: &str) -> SessionResult<String> {
    let mut url = Url::parse("http://localhost")?;
    url.set_path(collection);
    url.path_segments_mut()
        .map_err(|()| SessionError::configuration(format!("invalid resource path {collection}")))?
        .push(id);
    Ok(url.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_path_encodes_id() {
        assert_eq!(item_path("/api/ads", "42").unwrap(), "/api/ads/42");
        assert_eq!(
            item_path("/api/ads/tablet", "7?admin=1").unwrap(),
            "/api/ads/tablet/7%3Fadmin=1"
        );
        assert_eq!(item_path("/api/salons", "a/b").unwrap(), "/api/salons/a%2Fb");
    }
}
