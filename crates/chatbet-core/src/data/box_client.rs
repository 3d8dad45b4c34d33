//! BoxSportsDataClient -- object-safe dynamic dispatch wrapper for SportsDataClient.
//!
//! 1. Define an object-safe `SportsDataClientDyn` trait with boxed futures
//! 2. Blanket-impl `SportsDataClientDyn` for all `T: SportsDataClient`
//! 3. `BoxSportsDataClient` wraps `Box<dyn SportsDataClientDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use chatbet_types::error::DataError;
use chatbet_types::sports::{DataRecords, DataRequest};

use super::client::SportsDataClient;

/// Object-safe version of [`SportsDataClient`] with boxed futures.
pub trait SportsDataClientDyn: Send + Sync {
    fn name(&self) -> &str;

    fn fetch_boxed<'a>(
        &'a self,
        request: &'a DataRequest,
    ) -> Pin<Box<dyn Future<Output = Result<DataRecords, DataError>> + Send + 'a>>;
}

impl<T: SportsDataClient> SportsDataClientDyn for T {
    fn name(&self) -> &str {
        SportsDataClient::name(self)
    }

    fn fetch_boxed<'a>(
        &'a self,
        request: &'a DataRequest,
    ) -> Pin<Box<dyn Future<Output = Result<DataRecords, DataError>> + Send + 'a>> {
        Box::pin(self.fetch(request))
    }
}

/// Type-erased sports data client for runtime backend selection.
pub struct BoxSportsDataClient {
    inner: Box<dyn SportsDataClientDyn + Send + Sync>,
}

impl BoxSportsDataClient {
    pub fn new<T: SportsDataClient + 'static>(client: T) -> Self {
        Self {
            inner: Box::new(client),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn fetch(&self, request: &DataRequest) -> Result<DataRecords, DataError> {
        self.inner.fetch_boxed(request).await
    }
}
