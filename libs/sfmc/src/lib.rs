//! Marketing Cloud side of the relay.
//!
//! [`TokenCache`] holds the client-credentials bearer token and refreshes it
//! through a [`TokenFetcher`]; [`Forwarder`] upserts each normalized event as
//! a Data Extension row and classifies failures for operators.

pub mod error;
pub mod forwarder;
pub mod rows;
pub mod token;

pub use error::{ForwardError, TokenError};
pub use forwarder::Forwarder;
pub use rows::DataExtensionRow;
pub use token::{
    AccessToken, CachedToken, HttpTokenFetcher, REFRESH_MARGIN, TokenCache, TokenFetcher,
};
