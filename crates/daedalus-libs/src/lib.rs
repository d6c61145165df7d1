//! # Daedalus Libs
//!
//! Ready-made controllers to mount into a Daedalus tree.
//!
//! | Controller | Kind | Name |
//! |------------|------|------|
//! | [`CorsMiddleware`] | middleware | `cors` |
//! | [`LogMiddleware`] | middleware | `log` |
//! | [`BasicAuthMiddleware`] | middleware | `basic_auth` |
//! | [`DocController`] | controller | serves the API document |

#![doc(html_root_url = "https://docs.rs/daedalus-libs/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod basic_auth;
pub mod cors;
pub mod doc;
pub mod log;

pub use basic_auth::{
    encode_credential, AccountForBasicAuth, BasicAuthAccounts, BasicAuthMiddleware, BasicAuthParams,
    StaticAccounts, BASIC_AUTH_USER_KEY,
};
pub use cors::{CorsConfig, CorsMiddleware};
pub use doc::DocController;
pub use log::{LogMiddleware, REQUEST_ID_HEADER, REQUEST_ID_KEY};
