//! # Daedalus Test
//!
//! In-memory HTTP testing for Daedalus controller trees.
//!
//! Requests are answered by the synthesized [`RouteTable`] directly, so they
//! pass through route matching, the middleware chain and parameter binding
//! exactly as they would behind the server, with no port bound.
//!
//! ## Example
//!
//! ```ignore
//! use daedalus_test::TestClient;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_create_pet() {
//!     let client = TestClient::build::<Api>(Launcher::new(WebConfig::new())).unwrap();
//!
//!     let response = client
//!         .post_json("/api/pets", &json!({ "name": "Rex" }))
//!         .send()
//!         .await;
//!
//!     response
//!         .assert_status(StatusCode::CREATED)
//!         .assert_json_field("name", &json!("Rex"));
//! }
//! ```
//!
//! [`RouteTable`]: daedalus_core::RouteTable

#![doc(html_root_url = "https://docs.rs/daedalus-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
