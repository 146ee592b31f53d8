pub mod opendatafrance;

use crate::opendatafrance::{ForwardQuery, Params, ResultSet, ReverseQuery};
use crate::{default_headers, GeocodingError, Point};
use num_traits::Float;
use serde_json::Value;

/// The HTTP capability a geocoder relies on: one GET, returning the parsed JSON body.
///
/// Implementations surface transport-level failures (network, DNS, non-2xx, ...)
/// as errors. Geocoders hand those errors back to their caller unchanged.
pub trait HttpAdapter {
    fn get(&self, url: &str, params: &Params) -> Result<Value, GeocodingError>;
}

/// The default [`HttpAdapter`](trait.HttpAdapter.html), backed by a blocking reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestAdapter {
    client: reqwest::blocking::Client,
}

impl ReqwestAdapter {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .default_headers(default_headers())
            .build()
            .expect("Couldn't build a client!");
        ReqwestAdapter { client }
    }

    /// Use a pre-configured client, e.g. one with a timeout or a proxy
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        ReqwestAdapter { client }
    }
}

impl Default for ReqwestAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpAdapter for ReqwestAdapter {
    fn get(&self, url: &str, params: &Params) -> Result<Value, GeocodingError> {
        let resp = self
            .client
            .get(url)
            .query(params)
            .send()?
            .error_for_status()?;
        let res: Value = resp.json()?;
        Ok(res)
    }
}

/// A geocoding backend returning normalized results.
///
/// Every call issues exactly one request and either fails or yields a
/// [`ResultSet`](../struct.ResultSet.html), in the order the service returned them.
///
/// Examples
///
/// ```no_run
/// use geocoding_opendatafrance::blocking::GeocoderBackend;
/// use geocoding_opendatafrance::{Opendatafrance, ReverseQuery};
///
/// let odf = Opendatafrance::new();
/// let res = odf.geocode(&"8 bd du Port, Amiens".into()).unwrap();
/// assert_eq!(res[0].city.as_deref(), Some("Amiens"));
///
/// let query = ReverseQuery::new().with_param("lat", 49.8974).with_param("lon", 2.2901);
/// let res = odf.reverse_geocode(&query).unwrap();
/// assert_eq!(res[0].country_code, "FR");
/// ```
pub trait GeocoderBackend {
    fn geocode(&self, query: &ForwardQuery) -> Result<ResultSet, GeocodingError>;
    fn reverse_geocode(&self, query: &ReverseQuery) -> Result<ResultSet, GeocodingError>;
}

/// Reverse-geocode a coordinate.
///
/// This trait represents the most simple and minimal implementation
/// available from a given geocoding provider: some address formatted as Option<String>.
///
/// Examples
///
/// ```no_run
/// use geocoding_opendatafrance::{Opendatafrance, Point};
/// use geocoding_opendatafrance::blocking::Reverse;
///
/// let p = Point::new(2.290084, 49.897443);
/// let odf = Opendatafrance::new();
/// let res = odf.reverse(&p).unwrap();
/// assert_eq!(res, Some("8 Boulevard du Port 80000 Amiens".to_string()));
/// ```
pub trait Reverse<T>
where
    T: Float,
{
    // NOTE TO IMPLEMENTERS: Point coordinates are lon, lat (x, y)
    // You may have to provide these coordinates in reverse order,
    // depending on the provider's requirements
    fn reverse(&self, point: &Point<T>) -> Result<Option<String>, GeocodingError>;
}

/// Forward-geocode a coordinate.
///
/// This trait represents the most simple and minimal implementation available
/// from a given geocoding provider: It returns a `Vec` of zero or more `Points`.
///
/// Examples
///
/// ```no_run
/// use geocoding_opendatafrance::{Opendatafrance, Point};
/// use geocoding_opendatafrance::blocking::Forward;
///
/// let odf = Opendatafrance::new();
/// let res: Vec<Point<f64>> = odf.forward("8 bd du Port, Amiens").unwrap();
/// assert_eq!(res[0], Point::new(2.290084, 49.897443));
/// ```
pub trait Forward<T>
where
    T: Float,
{
    // NOTE TO IMPLEMENTERS: while returned provider point data may not be in
    // lon, lat (x, y) order, Geocoding requires this order in its output Point
    // data. Please pay attention when using returned data to construct Points
    fn forward(&self, address: &str) -> Result<Vec<Point<T>>, GeocodingError>;
}
