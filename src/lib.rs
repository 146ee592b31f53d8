//! This crate provides forward– and reverse-geocoding against the French
//! [api-adresse](https://adresse.data.gouv.fr/api-doc/adresse) service (Base Adresse Nationale).
//!
//! The provider implements the [`GeocoderBackend`](blocking/trait.GeocoderBackend.html) trait,
//! returning a [`ResultSet`](struct.ResultSet.html) of normalized
//! [`GeocodeResult`](struct.GeocodeResult.html)s along with the raw API response, as well as the
//! minimal `Forward` and `Reverse` traits shared with the other georust providers.
//! Each trait comes in a blocking flavour (feature `blocking`) and an async flavour
//! (feature `async`, under [`async_impl`](async_impl/index.html)).
//!
//! HTTP is delegated to an [`HttpAdapter`](blocking/trait.HttpAdapter.html); the default one is
//! backed by reqwest, and any other implementation can be plugged in with `with_adapter`.
//!
//! ### A note on Coordinate Order
//! api-adresse returns coordinates in `[Longitude, Latitude]` order, and so does
//! [`Point`](struct.Point.html) (`x, y`). `GeocodeResult` carries them as named fields.
//!
//! ### Usage of rustls
//!
//! If you like to use [rustls](https://github.com/ctz/rustls) instead of OpenSSL
//! you can enable the `rustls-tls` feature in your `Cargo.toml`:
//!
//!```toml
//![dependencies]
//!geocoding-opendatafrance = { version = "*", default-features = false, features = ["rustls-tls", "blocking"] }
//!```

static UA_STRING: &str = "Rust-Geocoding";

pub use geo_types::{Coordinate, Point};
use num_traits::Float;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};

mod error;
pub use crate::error::GeocodingError;

#[cfg(feature = "async")]
pub mod async_impl;
#[cfg(feature = "blocking")]
pub mod blocking;

// The api-adresse (Base Adresse Nationale) geocoding provider
pub mod opendatafrance;
pub use crate::opendatafrance::{
    AddressQuery, ForwardQuery, GeocodeResult, OpendatafranceOptions, Params, ResultSet,
    ReverseQuery,
};
#[cfg(feature = "blocking")]
pub use crate::blocking::opendatafrance::Opendatafrance;

#[cfg(any(feature = "blocking", feature = "async"))]
fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(UA_STRING));
    headers
}
