//! Service layer for the poller.
//!
//! This module contains the business logic for:
//! - Places text search (`PlacesSource`, `HttpPlacesClient`)
//! - Fetch retry and backoff (`RetryPolicy`, `Sleeper`)
//! - The fetch-and-publish cycle (`PlacesPoller`)

mod places;
mod poller;
mod retry;

pub use places::{HttpPlacesClient, PLACES_QUERY, PlacesQuery, PlacesSource};
pub use poller::{PlacesPoller, TaskFailure};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
