use crate::async_impl::{Forward, GeocoderBackend, HttpAdapter, ReqwestAdapter, Reverse};
use crate::opendatafrance::{
    forward_params, into_display_name, into_full_response, into_result_set, reverse_params,
    ForwardQuery, OpendatafranceOptions, OpendatafranceResponse, ResultSet, ReverseQuery,
    DEFAULT_ENDPOINT,
};
use crate::Deserialize;
use crate::Point;
use crate::GeocodingError;
use async_trait::async_trait;
use num_traits::Float;
use tracing::{debug, instrument};

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
    /// This method passes the `limit` parameter to the API.
    pub async fn forward_full<T>(
        &self,
        query: &ForwardQuery,
    ) -> Result<OpendatafranceResponse<T>, GeocodingError>
    where
        T: Float,
        for<'de> T: Deserialize<'de>,
    {
        let params = forward_params(&self.options, query);
        let res = self
            .adapter
            .get(&format!("{}search", self.endpoint), &params)
            .await?;
        into_full_response(res)
    }

    /// A reverse lookup, returning the full typed response
    ///
    /// This method passes the `limit` parameter to the API.
    pub async fn reverse_full<T>(
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
            .get(&format!("{}reverse", self.endpoint), &params)
            .await?;
        into_full_response(res)
    }
}

#[async_trait]
impl<A> GeocoderBackend for Opendatafrance<A>
where
    A: HttpAdapter,
{
    #[instrument(skip(self))]
    async fn geocode(&self, query: &ForwardQuery) -> Result<ResultSet, GeocodingError> {
        let params = forward_params(&self.options, query);
        let url = format!("{}search", self.endpoint);
        debug!(%url, params = params.len(), "api-adresse forward request");
        let res = self.adapter.get(&url, &params).await?;
        into_result_set(res)
    }

    #[instrument(skip(self))]
    async fn reverse_geocode(&self, query: &ReverseQuery) -> Result<ResultSet, GeocodingError> {
        let params = reverse_params(&self.options, query);
        let url = format!("{}reverse", self.endpoint);
        debug!(%url, params = params.len(), "api-adresse reverse request");
        let res = self.adapter.get(&url, &params).await?;
        into_result_set(res)
    }
}

#[async_trait]
impl<A, T> Forward<T> for Opendatafrance<A>
where
    A: HttpAdapter,
    T: Float + Send,
{
    async fn forward(&self, place: &str) -> Result<Vec<Point<T>>, GeocodingError> {
        let query = ForwardQuery::from(place);
        let res = self.geocode(&query).await?;
        Ok(res
            .iter()
            .filter_map(|result| {
                let point = result.point()?;
                Some(Point::new(T::from(point.x())?, T::from(point.y())?))
            })
            .collect())
    }
}

#[async_trait(?Send)]
impl<A, T> Reverse<T> for Opendatafrance<A>
where
    A: HttpAdapter,
    T: Float + Send,
{
    async fn reverse(&self, point: &Point<T>) -> Result<Option<String>, GeocodingError> {
        let params = reverse_params(&self.options, &ReverseQuery::from(point));
        let res = self
            .adapter
            .get(&format!("{}reverse", self.endpoint), &params)
            .await?;
        into_display_name(res)
    }
}
