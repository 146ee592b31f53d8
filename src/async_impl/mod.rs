use async_trait::async_trait;
pub use geo_types::Point;
use num_traits::Float;
use serde_json::Value;

use crate::opendatafrance::{ForwardQuery, Params, ResultSet, ReverseQuery};
use crate::{default_headers, GeocodingError};

pub mod opendatafrance;

/// The async HTTP capability a geocoder relies on: one GET, returning the parsed JSON body.
///
/// Transport-level failures are surfaced as errors and handed back to the
/// geocoder's caller unchanged.
#[async_trait]
pub trait HttpAdapter: Send + Sync {
    async fn get(&self, url: &str, params: &Params) -> Result<Value, GeocodingError>;
}

/// The default async [`HttpAdapter`](trait.HttpAdapter.html), backed by a reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestAdapter {
    client: reqwest::Client,
}

impl ReqwestAdapter {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .default_headers(default_headers())
            .build()
            .expect("Couldn't build a client!");
        ReqwestAdapter { client }
    }

    /// Use a pre-configured client, e.g. one with a timeout or a proxy
    pub fn with_client(client: reqwest::Client) -> Self {
        ReqwestAdapter { client }
    }
}

impl Default for ReqwestAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpAdapter for ReqwestAdapter {
    async fn get(&self, url: &str, params: &Params) -> Result<Value, GeocodingError> {
        let res = self
            .client
            .get(url)
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(res)
    }
}

#[async_trait]
pub trait GeocoderBackend {
    async fn geocode(&self, query: &ForwardQuery) -> Result<ResultSet, GeocodingError>;
    async fn reverse_geocode(&self, query: &ReverseQuery) -> Result<ResultSet, GeocodingError>;
}

#[async_trait(?Send)]
pub trait Reverse<T>
where
    T: Float + Send,
{
    // NOTE TO IMPLEMENTERS: Point coordinates are lon, lat (x, y)
    // You may have to provide these coordinates in reverse order,
    // depending on the provider's requirements
    async fn reverse(&self, point: &Point<T>) -> Result<Option<String>, GeocodingError>;
}

#[async_trait]
pub trait Forward<T>
where
    T: Float,
{
    // NOTE TO IMPLEMENTERS: while returned provider point data may not be in
    // lon, lat (x, y) order, Geocoding requires this order in its output Point
    // data. Please pay attention when using returned data to construct Points
    async fn forward(&self, address: &str) -> Result<Vec<Point<T>>, GeocodingError>;
}
