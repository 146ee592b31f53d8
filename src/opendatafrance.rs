//! Transport-independent building blocks of the
//! [api-adresse](https://adresse.data.gouv.fr/api-doc/adresse) provider.
//!
//! Both the [blocking](../blocking/opendatafrance/index.html) and the async flavours
//! of the provider assemble their requests and shape their results with the items
//! in this module.
use crate::{Deserialize, Float, GeocodingError, Point, Serialize};
use serde::Deserializer;
use serde_json::Value;
use std::collections::BTreeMap;
use std::iter::FromIterator;
use std::ops::Deref;
use tracing::{debug, warn};

macro_rules! add_optional_param {
    ($params:expr, $param:expr, $name:expr) => {
        if let Some(p) = $param {
            $params.insert($name.to_string(), p.to_string());
        }
    };
}

/// Default base endpoint of the service. `search` and `reverse` are appended to it.
pub static DEFAULT_ENDPOINT: &str = "http://api-adresse.data.gouv.fr/";

/// Page-size cap sent with every request, whatever the caller asked for
pub const RESULT_LIMIT: u32 = 20;

/// api-adresse only covers France
pub const COUNTRY_CODE: &str = "FR";
pub const COUNTRY: &str = "France";

/// Outgoing query parameters, ordered by name
pub type Params = BTreeMap<String, String>;

/// Adapter-wide options, applied to every request
///
/// Absent or empty values are left out of the request. `api_key` is accepted
/// for uniformity with other providers but is never sent: api-adresse is keyless.
///
/// ```
/// use geocoding_opendatafrance::OpendatafranceOptions;
///
/// let options = OpendatafranceOptions::new()
///     .with_language("fr")
///     .with_email("dev@example.org");
/// assert_eq!(options.language.as_deref(), Some("fr"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpendatafranceOptions {
    pub language: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "apiKey", alias = "api_key")]
    pub api_key: Option<String>,
}

impl OpendatafranceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `language` option, sent as `accept-language`
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the `email` option
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the `api_key` option
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Parameters derived from the adapter-wide options
pub fn common_params(options: &OpendatafranceOptions) -> Params {
    let mut params = Params::new();
    add_optional_param!(params, non_empty(&options.language), "accept-language");
    add_optional_param!(params, non_empty(&options.email), "email");
    params
}

/// Hard-set parameters, overriding anything already present under the same name
pub fn force_params(params: &mut Params) {
    params.insert("limit".to_string(), RESULT_LIMIT.to_string());
}

/// The input of a forward-geocoding request
///
/// ```
/// use geocoding_opendatafrance::{AddressQuery, ForwardQuery};
///
/// let plain = ForwardQuery::from("8 bd du Port, Cergy");
/// let structured = ForwardQuery::from(AddressQuery {
///     address: Some("8 bd du Port, Cergy".to_string()),
/// });
/// assert_eq!(plain.address(), structured.address());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ForwardQuery {
    Address(String),
    Structured(AddressQuery),
}

/// Structured forward query. Unknown fields are ignored when deserializing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressQuery {
    pub address: Option<String>,
}

impl ForwardQuery {
    /// The address to search for, if the query carries a usable one
    pub fn address(&self) -> Option<&str> {
        let address = match self {
            ForwardQuery::Address(address) => Some(address.as_str()),
            ForwardQuery::Structured(query) => query.address.as_deref(),
        };
        address.filter(|a| !a.is_empty())
    }
}

impl From<&str> for ForwardQuery {
    fn from(address: &str) -> Self {
        ForwardQuery::Address(address.to_string())
    }
}

impl From<String> for ForwardQuery {
    fn from(address: String) -> Self {
        ForwardQuery::Address(address)
    }
}

impl From<AddressQuery> for ForwardQuery {
    fn from(query: AddressQuery) -> Self {
        ForwardQuery::Structured(query)
    }
}

/// The input of a reverse-geocoding request: parameters forwarded verbatim
///
/// ```
/// use geocoding_opendatafrance::{Point, ReverseQuery};
///
/// let query = ReverseQuery::from(&Point::new(2.35, 48.85)).with_param("type", "street");
/// assert_eq!(query.params()["lat"], "48.85");
/// assert_eq!(query.params()["lon"], "2.35");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReverseQuery {
    params: Params,
}

impl ReverseQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, replacing any previous value of the same name
    pub fn with_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

impl<T> From<&Point<T>> for ReverseQuery
where
    T: Float,
{
    fn from(point: &Point<T>) -> Self {
        // Point is lon, lat (x, y)
        let mut params = Params::new();
        add_optional_param!(params, point.y().to_f64(), "lat");
        add_optional_param!(params, point.x().to_f64(), "lon");
        ReverseQuery { params }
    }
}

impl<T> From<Point<T>> for ReverseQuery
where
    T: Float,
{
    fn from(point: Point<T>) -> Self {
        ReverseQuery::from(&point)
    }
}

impl From<Params> for ReverseQuery {
    fn from(params: Params) -> Self {
        ReverseQuery { params }
    }
}

impl<K, V> FromIterator<(K, V)> for ReverseQuery
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let params = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.to_string()))
            .collect();
        ReverseQuery { params }
    }
}

/// Parameters of a `search` request
pub fn forward_params(options: &OpendatafranceOptions, query: &ForwardQuery) -> Params {
    let mut params = common_params(options);
    add_optional_param!(params, query.address(), "q");
    force_params(&mut params);
    params
}

/// Parameters of a `reverse` request. Caller keys win over the common params.
pub fn reverse_params(options: &OpendatafranceOptions, query: &ReverseQuery) -> Params {
    let mut params = common_params(options);
    params.extend(
        query
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string())),
    );
    force_params(&mut params);
    params
}

pub fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Int(i64),
        Float(f64),
    }

    Ok(
        Option::<StringOrNumber>::deserialize(deserializer)?.map(|v| match v {
            StringOrNumber::String(s) => s,
            StringOrNumber::Int(i) => i.to_string(),
            StringOrNumber::Float(f) => f.to_string(),
        }),
    )
}

/// The top-level GeoJSON response of both the `search` and the `reverse` endpoints
///
/// See [the documentation](https://adresse.data.gouv.fr/api-doc/adresse) for more details
///
///```json
///{
///  "type": "FeatureCollection",
///  "version": "draft",
///  "features": [
///    {
///      "type": "Feature",
///      "geometry": {
///        "type": "Point",
///        "coordinates": [2.290084, 49.897443]
///      },
///      "properties": {
///        "label": "8 Boulevard du Port 80000 Amiens",
///        "score": 0.49159121588068583,
///        "housenumber": "8",
///        "id": "80021_6590_00008",
///        "type": "housenumber",
///        "name": "8 Boulevard du Port",
///        "postcode": "80000",
///        "citycode": "80021",
///        "x": 648952.58,
///        "y": 6977867.25,
///        "city": "Amiens",
///        "context": "80, Somme, Hauts-de-France",
///        "importance": 0.6706612694243868,
///        "street": "Boulevard du Port"
///      }
///    }
///  ],
///  "attribution": "BAN",
///  "licence": "ETALAB-2.0",
///  "query": "8 bd du port",
///  "limit": 1
///}
///```
#[derive(Debug, Serialize, Deserialize)]
pub struct OpendatafranceResponse<T>
where
    T: Float,
{
    pub r#type: Option<String>,
    pub version: Option<String>,
    #[serde(default = "Vec::new")]
    pub features: Vec<OpendatafranceResult<T>>,
    pub attribution: Option<String>,
    pub licence: Option<String>,
    pub query: Option<String>,
    pub limit: Option<u32>,
}

/// A geocoding result
#[derive(Debug, Serialize, Deserialize)]
pub struct OpendatafranceResult<T>
where
    T: Float,
{
    pub r#type: Option<String>,
    pub geometry: ResultGeometry<T>,
    pub properties: ResultProperties,
}

/// A geocoding result geometry, in lon, lat order
#[derive(Debug, Serialize, Deserialize)]
pub struct ResultGeometry<T>
where
    T: Float,
{
    pub r#type: Option<String>,
    pub coordinates: (T, T),
}

/// Geocoding result properties
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultProperties {
    pub label: Option<String>,
    pub score: Option<f64>,
    pub id: Option<String>,
    pub r#type: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    pub postcode: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    pub citycode: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub context: Option<String>,
    pub importance: Option<f64>,
    pub street: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    pub housenumber: Option<String>,
}

impl ResultProperties {
    /// A one-line description of the result: the API label, or one assembled
    /// from the address parts when the label is missing.
    pub fn display_name(&self) -> Option<String> {
        if let Some(label) = non_empty(&self.label) {
            return Some(label.to_string());
        }
        let street = [self.housenumber.as_deref(), self.street.as_deref()]
            .iter()
            .flatten()
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        let locality = [self.postcode.as_deref(), self.city.as_deref()]
            .iter()
            .flatten()
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        let parts: Vec<String> = vec![street, locality]
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// The common result record shared by every provider backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub zipcode: Option<String>,
    pub street_name: Option<String>,
    pub street_number: Option<String>,
    pub country_code: String,
    pub country: String,
}

impl GeocodeResult {
    /// The result position, in lon, lat order, when both coordinates are known
    pub fn point(&self) -> Option<Point<f64>> {
        Some(Point::new(self.longitude?, self.latitude?))
    }
}

/// Formatted results, in API order, along with the untouched API response
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultSet {
    results: Vec<GeocodeResult>,
    raw: Value,
}

impl ResultSet {
    pub fn new(results: Vec<GeocodeResult>, raw: Value) -> Self {
        ResultSet { results, raw }
    }

    /// The parsed API response the results were formatted from
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn results(&self) -> &[GeocodeResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<GeocodeResult> {
        self.results
    }
}

impl Deref for ResultSet {
    type Target = [GeocodeResult];

    fn deref(&self) -> &Self::Target {
        &self.results
    }
}

impl IntoIterator for ResultSet {
    type Item = GeocodeResult;
    type IntoIter = std::vec::IntoIter<GeocodeResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a GeocodeResult;
    type IntoIter = std::slice::Iter<'a, GeocodeResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

// The lenient view of a feature used for formatting: only the nested
// objects are required, the address leaves are read when usable and any
// other key is left alone.
#[derive(Deserialize)]
struct FeatureView {
    geometry: GeometryView,
    properties: PropertiesView,
}

#[derive(Deserialize)]
struct GeometryView {
    coordinates: Vec<Value>,
}

#[derive(Deserialize)]
struct PropertiesView {
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    label: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    context: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    city: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    postcode: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    street: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    housenumber: Option<String>,
}

// Strings and numbers are kept, any other JSON value reads as absent
fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

// parseFloat-like: falsy raw values (0, null, "", missing) stay absent
fn coordinate(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64().filter(|c| *c != 0.0),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|c| !c.is_nan())
}

impl FeatureView {
    fn into_result(self) -> GeocodeResult {
        let coordinates = &self.geometry.coordinates;
        let properties = self.properties;
        GeocodeResult {
            latitude: coordinate(coordinates.get(1)),
            longitude: coordinate(coordinates.get(0)),
            state: properties.context,
            city: properties.city,
            zipcode: properties.postcode,
            street_name: properties.street,
            street_number: properties.housenumber,
            country_code: COUNTRY_CODE.to_string(),
            country: COUNTRY.to_string(),
        }
    }

    fn display_name(&self) -> Option<String> {
        let properties = &self.properties;
        ResultProperties {
            label: properties.label.clone(),
            housenumber: properties.housenumber.clone(),
            street: properties.street.clone(),
            postcode: properties.postcode.clone(),
            city: properties.city.clone(),
            ..Default::default()
        }
        .display_name()
    }
}

/// Map one API feature into a [`GeocodeResult`](struct.GeocodeResult.html)
///
/// Fails when the feature lacks `geometry.coordinates` or `properties`.
pub fn format_feature(feature: &Value) -> Result<GeocodeResult, GeocodingError> {
    let feature = FeatureView::deserialize(feature)?;
    Ok(feature.into_result())
}

fn api_error(response: &Value) -> Option<String> {
    match response.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) => Some(s.to_string()),
        other => Some(other.to_string()),
    }
}

// Well-formed features of a response, in order. Malformed ones are skipped
// with a warning.
fn feature_views(response: &Value) -> Vec<FeatureView> {
    let features = match response.get("features").and_then(Value::as_array) {
        Some(features) => features,
        None => return vec![],
    };
    features
        .iter()
        .enumerate()
        .filter_map(|(index, feature)| match FeatureView::deserialize(feature) {
            Ok(view) => Some(view),
            Err(error) => {
                warn!(index, %error, "skipping malformed api-adresse feature");
                None
            }
        })
        .collect()
}

/// Shape a parsed API response into a [`ResultSet`](struct.ResultSet.html)
///
/// An `error` field in the body fails the whole call. A missing `features`
/// array yields an empty set. Malformed features are skipped with a warning.
pub fn into_result_set(response: Value) -> Result<ResultSet, GeocodingError> {
    if let Some(message) = api_error(&response) {
        return Err(GeocodingError::Api(message));
    }
    let results: Vec<GeocodeResult> = feature_views(&response)
        .into_iter()
        .map(FeatureView::into_result)
        .collect();
    debug!(results = results.len(), "formatted api-adresse response");
    Ok(ResultSet::new(results, response))
}

/// The one-line description of the first well-formed feature of a response
///
/// Same error and skipping rules as [`into_result_set`](fn.into_result_set.html).
pub fn into_display_name(response: Value) -> Result<Option<String>, GeocodingError> {
    if let Some(message) = api_error(&response) {
        return Err(GeocodingError::Api(message));
    }
    Ok(feature_views(&response)
        .first()
        .and_then(FeatureView::display_name))
}

/// Decode a parsed API response into the full typed
/// [`OpendatafranceResponse`](struct.OpendatafranceResponse.html)
pub fn into_full_response<T>(response: Value) -> Result<OpendatafranceResponse<T>, GeocodingError>
where
    T: Float,
    for<'de> T: Deserialize<'de>,
{
    if let Some(message) = api_error(&response) {
        return Err(GeocodingError::Api(message));
    }
    let res: OpendatafranceResponse<T> = serde_json::from_value(response)?;
    Ok(res)
}
