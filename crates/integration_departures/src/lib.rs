//! Departure API clients
//!
//! Two backends are supported:
//! - [Motis](https://github.com/motis-project/motis) (e.g. the public Transitous
//!   API) via [`MotisClient`]
//! - EFA instances with rapidJSON output via [`EfaClient`]
//!
//! Both sit on top of [`ApiClient`], a JSON GET wrapper with a bounded retry
//! loop (see [`retry`]). Responses are parsed into the domain's
//! [`Departure`](domain::Departure), [`Stop`](domain::Stop) and
//! [`Line`](domain::Line) at this boundary; a body missing required keys
//! surfaces as [`ApiError::MalformedResponse`].
//!
//! # Example
//!
//! ```rust,ignore
//! use integration_departures::{ApiConfig, MotisClient};
//!
//! let client = MotisClient::new(&ApiConfig::default())?;
//! let departures = client.stop_times("de:09564:704", 10, Some(100)).await?;
//! ```

mod cache;
mod config;
pub mod efa;
mod error;
mod http;
pub mod motis;
pub mod retry;

pub use config::{ApiConfig, DEFAULT_MOTIS_URL, default_user_agent};
pub use efa::{EFA_ENDPOINTS, EfaClient, efa_endpoint};
pub use error::ApiError;
pub use http::{ApiClient, QueryParams, query};
pub use motis::{MotisClient, MotisCommand};
pub use retry::{RetryOutcome, RetryPolicy, RetryState, Retryable, with_retry};
