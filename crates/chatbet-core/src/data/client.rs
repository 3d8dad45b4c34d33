//! SportsDataClient trait definition.
//!
//! The raw external data source is consumed as a capability returning typed
//! records. Retries are not part of the contract; the data cache owns the
//! staleness fallback.

use chatbet_types::error::DataError;
use chatbet_types::sports::{DataRecords, DataRequest};

/// Trait for sports data backends (the ChatBet HTTP API, in-memory fakes).
///
/// Uses native async fn in traits (RPITIT). Implementations live in
/// chatbet-infra; wrap them in [`BoxSportsDataClient`](super::box_client::BoxSportsDataClient)
/// for dynamic dispatch.
pub trait SportsDataClient: Send + Sync {
    /// Human-readable backend name (e.g., "chatbet").
    fn name(&self) -> &str;

    /// Fetch records of `request.kind` matching `request.filters`.
    ///
    /// Fails with [`DataError::Upstream`] on network or HTTP failure.
    fn fetch(
        &self,
        request: &DataRequest,
    ) -> impl std::future::Future<Output = Result<DataRecords, DataError>> + Send;
}
