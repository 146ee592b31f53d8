//! HTTP-level tests of the reqwest-backed adapters against a wiremock server

use geocoding_opendatafrance::async_impl::opendatafrance::Opendatafrance;
use geocoding_opendatafrance::async_impl::{GeocoderBackend, Reverse};
use geocoding_opendatafrance::{GeocodingError, OpendatafranceOptions, Point, ReverseQuery};
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn amiens_response() -> serde_json::Value {
    serde_json::json!({
        "type": "FeatureCollection",
        "version": "draft",
        "features": [{
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [2.290084, 49.897443]},
            "properties": {
                "label": "8 Boulevard du Port 80000 Amiens",
                "score": 0.49159121588068583,
                "housenumber": "8",
                "id": "80021_6590_00008",
                "type": "housenumber",
                "name": "8 Boulevard du Port",
                "postcode": "80000",
                "citycode": "80021",
                "x": 648952.58,
                "y": 6977867.25,
                "city": "Amiens",
                "context": "80, Somme, Hauts-de-France",
                "importance": 0.6706612694243868,
                "street": "Boulevard du Port"
            }
        }],
        "attribution": "BAN",
        "licence": "ETALAB-2.0",
        "query": "8 bd du port",
        "limit": 20
    })
}

fn geocoder(server: &MockServer) -> Opendatafrance {
    Opendatafrance::new_with_endpoint(format!("{}/", server.uri()))
}

#[tokio::test]
async fn test_geocode_sends_query_and_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "8 bd du port"))
        .and(query_param("limit", "20"))
        .and(query_param("accept-language", "fr"))
        .and(header("user-agent", "Rust-Geocoding"))
        .respond_with(ResponseTemplate::new(200).set_body_json(amiens_response()))
        .expect(1)
        .mount(&server)
        .await;

    let odf = geocoder(&server).with_options(OpendatafranceOptions::new().with_language("fr"));
    let res = odf.geocode(&"8 bd du port".into()).await.unwrap();

    assert_eq!(res.len(), 1);
    let result = &res[0];
    assert_eq!(result.latitude, Some(49.897443));
    assert_eq!(result.longitude, Some(2.290084));
    assert_eq!(result.state.as_deref(), Some("80, Somme, Hauts-de-France"));
    assert_eq!(result.zipcode.as_deref(), Some("80000"));
    assert_eq!(result.country, "France");
    assert_eq!(res.raw()["attribution"], "BAN");
}

#[tokio::test]
async fn test_reverse_geocode_forwards_query_keys() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("lat", "49.897443"))
        .and(query_param("lon", "2.290084"))
        .and(query_param("type", "housenumber"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(amiens_response()))
        .expect(1)
        .mount(&server)
        .await;

    let odf = geocoder(&server);
    let query =
        ReverseQuery::from(Point::new(2.290084, 49.897443)).with_param("type", "housenumber");
    let res = odf.reverse_geocode(&query).await.unwrap();

    assert_eq!(res.len(), 1);
    assert_eq!(res[0].street_name.as_deref(), Some("Boulevard du Port"));
}

#[tokio::test]
async fn test_reverse_returns_label() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(amiens_response()))
        .mount(&server)
        .await;

    let odf = geocoder(&server);
    let res = odf.reverse(&Point::new(2.290084, 49.897443)).await.unwrap();

    assert_eq!(res, Some("8 Boulevard du Port 80000 Amiens".to_string()));
}

#[tokio::test]
async fn test_empty_collection_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"type": "FeatureCollection", "features": []})),
        )
        .mount(&server)
        .await;

    let odf = geocoder(&server);
    let res = odf.geocode(&"nowhere".into()).await.unwrap();

    assert!(res.is_empty());
}

#[tokio::test]
async fn test_api_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"error": "Invalid query"})),
        )
        .mount(&server)
        .await;

    let odf = geocoder(&server);
    let err = odf.geocode(&"".into()).await.unwrap_err();

    assert!(matches!(err, GeocodingError::Api(_)));
    assert_eq!(err.to_string(), "Invalid query");
}

#[tokio::test]
async fn test_server_error_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let odf = geocoder(&server);
    let err = odf.geocode(&"Amiens".into()).await.unwrap_err();

    match err {
        GeocodingError::Request(e) => assert_eq!(e.status().map(|s| s.as_u16()), Some(503)),
        other => panic!("expected a request error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_blocking_geocode() {
    use geocoding_opendatafrance::blocking::GeocoderBackend as _;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "8 bd du port"))
        .respond_with(ResponseTemplate::new(200).set_body_json(amiens_response()))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = format!("{}/", server.uri());
    let res = tokio::task::spawn_blocking(move || {
        let odf = geocoding_opendatafrance::Opendatafrance::new_with_endpoint(endpoint);
        odf.geocode(&"8 bd du port".into())
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(res[0].city.as_deref(), Some("Amiens"));
}
