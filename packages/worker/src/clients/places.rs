//! Places API client.

use std::time::Duration;

use async_trait::async_trait;
use audit::grid::GeoPoint;
use audit::AuditError;
use serde_json::Value;

/// One raw search result, ready to become a RawBusinessRecord.
#[derive(Debug, Clone)]
pub struct DiscoveredPlace {
    /// Provider-stable identifier, the `external_id` half of the dedupe key.
    pub external_id: String,
    /// The provider payload, stored untouched.
    pub payload: Value,
}

#[async_trait]
pub trait PlacesClient: Send + Sync {
    /// Search for businesses around `center` within `radius_m` meters.
    async fn search(
        &self,
        center: GeoPoint,
        radius_m: u32,
        category: Option<&str>,
    ) -> Result<Vec<DiscoveredPlace>, AuditError>;
}

pub struct GooglePlacesClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GooglePlacesClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(20))
                .build()
                .unwrap_or_default(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl PlacesClient for GooglePlacesClient {
    async fn search(
        &self,
        center: GeoPoint,
        radius_m: u32,
        category: Option<&str>,
    ) -> Result<Vec<DiscoveredPlace>, AuditError> {
        let url = format!("{}/place/nearbysearch/json", self.base_url);
        let mut query = vec![
            ("location".to_string(), format!("{},{}", center.lat, center.lng)),
            ("radius".to_string(), radius_m.to_string()),
            ("key".to_string(), self.api_key.clone()),
        ];
        if let Some(category) = category {
            query.push(("type".to_string(), category.to_string()));
        }

        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| AuditError::Network(format!("places request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuditError::Network(format!(
                "places API returned HTTP {status}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AuditError::Network(format!("places response was not JSON: {e}")))?;

        match body.get("status").and_then(Value::as_str) {
            Some("OK") | Some("ZERO_RESULTS") => {}
            other => {
                return Err(AuditError::Network(format!(
                    "places API status: {}",
                    other.unwrap_or("missing")
                )))
            }
        }

        let results = body
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        tracing::debug!(count = results.len(), lat = center.lat, lng = center.lng, "places search complete");

        Ok(results
            .into_iter()
            .filter_map(|payload| {
                let external_id = payload.get("place_id")?.as_str()?.to_string();
                Some(DiscoveredPlace {
                    external_id,
                    payload,
                })
            })
            .collect())
    }
}
