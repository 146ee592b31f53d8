//! The [api-adresse](https://adresse.data.gouv.fr/api-doc/adresse) provider for geocoding in France exclusively.
//!
//! Geocoding methods are implemented on the [`Opendatafrance`](struct.Opendatafrance.html) struct.
//! Results always carry `countryCode = "FR"` and `country = "France"`.
//!
//! While api-adresse is free and keyless, please respect its fair usage policy.
//!
//! ### Example
//!
//! ```no_run
//! use geocoding_opendatafrance::{Opendatafrance, OpendatafranceOptions};
//! use geocoding_opendatafrance::blocking::GeocoderBackend;
//!
//! let odf = Opendatafrance::new().with_options(OpendatafranceOptions::new().with_language("fr"));
//! let res = odf.geocode(&"8 bd du Port, Amiens".into()).unwrap();
//! assert_eq!(res[0].zipcode.as_deref(), Some("80000"));
//! ```
use crate::blocking::{Forward, GeocoderBackend, HttpAdapter, ReqwestAdapter, Reverse};
use crate::opendatafrance::{
    forward_params, into_display_name, into_full_response, into_result_set, reverse_params,
    ForwardQuery, OpendatafranceOptions, OpendatafranceResponse, ResultSet, ReverseQuery,
    DEFAULT_ENDPOINT,
};
use crate::{Deserialize, GeocodingError, Point};
use num_traits::Float;
use tracing::debug;

/// An instance of the api-adresse geocoding service
#[derive(Debug)]
pub struct Opendatafrance<A = ReqwestAdapter> {
    adapter: A,
    endpoint: String,
    options: OpendatafranceOptions,
}

impl Opendatafrance {
    /// Create a new api-adresse geocoding instance using the default endpoint
    pub fn new() -> Self {
        Opendatafrance::new_with_endpoint(DEFAULT_ENDPOINT.to_string())
    }

    /// Create a new api-adresse geocoding instance with a custom endpoint.
    ///
    /// Endpoint should include a trailing slash (i.e. "http://api-adresse.data.gouv.fr/")
    pub fn new_with_endpoint(endpoint: String) -> Self {
        Opendatafrance::with_adapter(ReqwestAdapter::new()).with_endpoint(&endpoint)
    }
}

impl Default for Opendatafrance {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Opendatafrance<A>
where
    A: HttpAdapter,
{
    /// Create a new api-adresse geocoding instance issuing its requests through `adapter`
    pub fn with_adapter(adapter: A) -> Self {
        Opendatafrance {
            adapter,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            options: OpendatafranceOptions::default(),
        }
    }

    /// Set a custom endpoint, with a trailing slash
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_owned();
        self
    }

    /// Set the options applied to every request
    pub fn with_options(mut self, options: OpendatafranceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &OpendatafranceOptions {
        &self.options
    }

    /// A forward-geocoding lookup, returning the full typed response
    ///
    /// Please see [the documentation](https://adresse.data.gouv.fr/api-doc/adresse) for details.
    ///
    /// This method passes the `limit` parameter to the API.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use geocoding_opendatafrance::Opendatafrance;
    /// use geocoding_opendatafrance::opendatafrance::OpendatafranceResponse;
    ///
    /// let odf = Opendatafrance::new();
    /// let res: OpendatafranceResponse<f64> = odf.forward_full(&"8 bd du Port, Amiens".into()).unwrap();
    /// let result = &res.features[0];
    /// assert_eq!(result.properties.citycode.as_deref(), Some("80021"));
    /// ```
    pub fn forward_full<T>(
        &self,
        query: &ForwardQuery,
    ) -> Result<OpendatafranceResponse<T>, GeocodingError>
    where
        T: Float,
        for<'de> T: Deserialize<'de>,
    {
        let params = forward_params(&self.options, query);
        let res = self.adapter.get(&format!("{}search", self.endpoint), &params)?;
        into_full_response(res)
    }

    /// A reverse lookup, returning the full typed response
    ///
    /// This method passes the `limit` parameter to the API.
    pub fn reverse_full<T>(
        &self,
        query: &ReverseQuery,
    ) -> Result<OpendatafranceResponse<T>, GeocodingError>
    where
        T: Float,
        for<'de> T: Deserialize<'de>,
    {
        let params = reverse_params(&self.options, query);
        let res = self
            .adapter
            .get(&format!("{}reverse", self.endpoint), &params)?;
        into_full_response(res)
    }
}

impl<A> GeocoderBackend for Opendatafrance<A>
where
    A: HttpAdapter,
{
    /// A forward-geocoding lookup of an address, against the `search` endpoint.
    fn geocode(&self, query: &ForwardQuery) -> Result<ResultSet, GeocodingError> {
        let params = forward_params(&self.options, query);
        let url = format!("{}search", self.endpoint);
        debug!(%url, params = params.len(), "api-adresse forward request");
        let res = self.adapter.get(&url, &params)?;
        into_result_set(res)
    }

    /// A reverse lookup, against the `reverse` endpoint. The query keys are sent as they are.
    fn reverse_geocode(&self, query: &ReverseQuery) -> Result<ResultSet, GeocodingError> {
        let params = reverse_params(&self.options, query);
        let url = format!("{}reverse", self.endpoint);
        debug!(%url, params = params.len(), "api-adresse reverse request");
        let res = self.adapter.get(&url, &params)?;
        into_result_set(res)
    }
}

impl<A, T> Forward<T> for Opendatafrance<A>
where
    A: HttpAdapter,
    T: Float,
{
    /// A forward-geocoding lookup of an address. Results without coordinates are left out.
    fn forward(&self, place: &str) -> Result<Vec<Point<T>>, GeocodingError> {
        let res = self.geocode(&place.into())?;
        Ok(res
            .iter()
            .filter_map(|result| {
                let point = result.point()?;
                Some(Point::new(T::from(point.x())?, T::from(point.y())?))
            })
            .collect())
    }
}

impl<A, T> Reverse<T> for Opendatafrance<A>
where
    A: HttpAdapter,
    T: Float,
{
    /// A reverse lookup of a point, returning the label of the closest address.
    fn reverse(&self, point: &Point<T>) -> Result<Option<String>, GeocodingError> {
        let params = reverse_params(&self.options, &point.into());
        let res = self
            .adapter
            .get(&format!("{}reverse", self.endpoint), &params)?;
        into_display_name(res)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::opendatafrance::Params;
    use serde_json::{json, Value};
    use std::cell::RefCell;

    struct MockAdapter {
        response: Result<Value, String>,
        calls: RefCell<Vec<(String, Params)>>,
    }

    impl MockAdapter {
        fn ok(response: Value) -> Self {
            MockAdapter {
                response: Ok(response),
                calls: RefCell::new(vec![]),
            }
        }

        fn failing(message: &str) -> Self {
            MockAdapter {
                response: Err(message.to_string()),
                calls: RefCell::new(vec![]),
            }
        }
    }

    impl HttpAdapter for MockAdapter {
        fn get(&self, url: &str, params: &Params) -> Result<Value, GeocodingError> {
            self.calls
                .borrow_mut()
                .push((url.to_string(), params.clone()));
            self.response.clone().map_err(GeocodingError::Transport)
        }
    }

    fn rivoli_response() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [2.35, 48.85]},
                "properties": {
                    "label": "1 Rue de Rivoli 75001 Paris",
                    "city": "Paris",
                    "postcode": "75001",
                    "street": "Rue de Rivoli",
                    "housenumber": "1",
                    "context": "Île-de-France"
                }
            }]
        })
    }

    #[test]
    fn geocode_request_test() {
        let odf = Opendatafrance::with_adapter(MockAdapter::ok(json!({"features": []})))
            .with_options(OpendatafranceOptions::new().with_language("fr"));
        odf.geocode(&"1 rue de Rivoli, Paris".into()).unwrap();
        let calls = odf.adapter.calls.borrow();
        assert_eq!(calls.len(), 1);
        let (url, params) = &calls[0];
        assert_eq!(url, "http://api-adresse.data.gouv.fr/search");
        assert_eq!(params["q"], "1 rue de Rivoli, Paris");
        assert_eq!(params["limit"], "20");
        assert_eq!(params["accept-language"], "fr");
    }

    #[test]
    fn reverse_geocode_request_test() {
        let odf = Opendatafrance::with_adapter(MockAdapter::ok(json!({"features": []})))
            .with_endpoint("http://localhost:7878/");
        let query = ReverseQuery::new()
            .with_param("lat", 48.85)
            .with_param("lon", 2.35)
            .with_param("limit", 100);
        odf.reverse_geocode(&query).unwrap();
        let calls = odf.adapter.calls.borrow();
        let (url, params) = &calls[0];
        assert_eq!(url, "http://localhost:7878/reverse");
        let mut expected = Params::new();
        expected.insert("lat".to_string(), "48.85".to_string());
        expected.insert("lon".to_string(), "2.35".to_string());
        expected.insert("limit".to_string(), "20".to_string());
        assert_eq!(params, &expected);
    }

    #[test]
    fn geocode_test() {
        let odf = Opendatafrance::with_adapter(MockAdapter::ok(rivoli_response()));
        let res = odf.geocode(&"1 rue de Rivoli, Paris".into()).unwrap();
        assert_eq!(res.len(), 1);
        let result = &res[0];
        assert_eq!(result.latitude, Some(48.85));
        assert_eq!(result.longitude, Some(2.35));
        assert_eq!(result.state.as_deref(), Some("Île-de-France"));
        assert_eq!(result.street_name.as_deref(), Some("Rue de Rivoli"));
        assert_eq!(result.country_code, "FR");
        assert_eq!(res.raw(), &rivoli_response());
    }

    #[test]
    fn geocode_idempotent_test() {
        let odf = Opendatafrance::with_adapter(MockAdapter::ok(rivoli_response()));
        let query = ForwardQuery::from("1 rue de Rivoli, Paris");
        assert_eq!(odf.geocode(&query).unwrap(), odf.geocode(&query).unwrap());
    }

    #[test]
    fn geocode_api_error_test() {
        let odf =
            Opendatafrance::with_adapter(MockAdapter::ok(json!({"error": "Invalid query"})));
        let err = odf.geocode(&"".into()).unwrap_err();
        assert!(matches!(err, GeocodingError::Api(_)));
        assert_eq!(err.to_string(), "Invalid query");
    }

    #[test]
    fn transport_error_test() {
        let odf = Opendatafrance::with_adapter(MockAdapter::failing("connection refused"));
        let err = odf.geocode(&"Paris".into()).unwrap_err();
        assert!(matches!(err, GeocodingError::Transport(ref m) if m == "connection refused"));
        let err = odf.reverse_geocode(&ReverseQuery::new()).unwrap_err();
        assert!(matches!(err, GeocodingError::Transport(ref m) if m == "connection refused"));
    }

    #[test]
    fn forward_test() {
        let odf = Opendatafrance::with_adapter(MockAdapter::ok(rivoli_response()));
        let res: Vec<Point<f64>> = odf.forward("1 rue de Rivoli, Paris").unwrap();
        assert_eq!(res, vec![Point::new(2.35, 48.85)]);
    }

    #[test]
    fn reverse_test() {
        let odf = Opendatafrance::with_adapter(MockAdapter::ok(rivoli_response()));
        let res = odf.reverse(&Point::new(2.35, 48.85)).unwrap();
        assert_eq!(res, Some("1 Rue de Rivoli 75001 Paris".to_string()));
        let calls = odf.adapter.calls.borrow();
        assert_eq!(calls[0].1["lat"], "48.85");
        assert_eq!(calls[0].1["lon"], "2.35");
    }

    #[test]
    fn reverse_skips_malformed_feature_test() {
        let mut response = rivoli_response();
        response["features"]
            .as_array_mut()
            .unwrap()
            .insert(0, json!({"type": "Feature", "properties": {"label": "broken"}}));
        let odf = Opendatafrance::with_adapter(MockAdapter::ok(response));
        let res = odf.reverse(&Point::new(2.35, 48.85)).unwrap();
        assert_eq!(res, Some("1 Rue de Rivoli 75001 Paris".to_string()));
    }

    #[test]
    fn reverse_empty_test() {
        let odf = Opendatafrance::with_adapter(MockAdapter::ok(json!({"features": []})));
        assert_eq!(odf.reverse(&Point::new(0.5, 0.5)).unwrap(), None);
    }
}
