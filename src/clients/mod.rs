/// External API clients module
use crate::errors::UpstreamError;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

/// HTTP client wrapper with common configuration
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(user_agent: &str) -> Result<Self, UpstreamError> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }

    pub fn get_client(&self) -> &Client {
        &self.client
    }
}

/// Body of a geojson query response. Only the feature list is read.
#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Value>,
}

/// USGS FDSN event query client
pub struct UsgsClient {
    http_client: HttpClient,
    base_url: String,
}

impl UsgsClient {
    pub fn new(base_url: String, user_agent: &str) -> Result<Self, UpstreamError> {
        Ok(Self {
            http_client: HttpClient::new(user_agent)?,
            base_url,
        })
    }

    /// Run one event query and return the raw `features` array.
    ///
    /// Exactly one attempt is made. Anything other than a 200 is reported
    /// as [`UpstreamError::Status`] without reading the body.
    pub async fn fetch_features(
        &self,
        params: &[(&'static str, String)],
    ) -> Result<Vec<Value>, UpstreamError> {
        let resp = self
            .http_client
            .get_client()
            .get(&self.base_url)
            .query(params)
            .send()
            .await?;

        if resp.status() != StatusCode::OK {
            return Err(UpstreamError::Status(resp.status().as_u16()));
        }

        let collection: FeatureCollection = resp.json().await?;
        Ok(collection.features)
    }
}
