//! BoxModelCapability -- object-safe dynamic dispatch wrapper for ModelCapability.
//!
//! Same blanket-impl pattern as `BoxSportsDataClient`.

use std::future::Future;
use std::pin::Pin;

use chatbet_types::llm::{ModelError, ModelRequest, ModelResponse};

use super::capability::ModelCapability;

/// Object-safe version of [`ModelCapability`] with boxed futures.
pub trait ModelCapabilityDyn: Send + Sync {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    fn invoke_boxed<'a>(
        &'a self,
        request: &'a ModelRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ModelResponse, ModelError>> + Send + 'a>>;
}

impl<T: ModelCapability> ModelCapabilityDyn for T {
    fn name(&self) -> &str {
        ModelCapability::name(self)
    }

    fn model(&self) -> &str {
        ModelCapability::model(self)
    }

    fn invoke_boxed<'a>(
        &'a self,
        request: &'a ModelRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ModelResponse, ModelError>> + Send + 'a>> {
        Box::pin(self.invoke(request))
    }
}

/// Type-erased model capability for runtime provider selection.
pub struct BoxModelCapability {
    inner: Box<dyn ModelCapabilityDyn + Send + Sync>,
}

impl BoxModelCapability {
    pub fn new<T: ModelCapability + 'static>(model: T) -> Self {
        Self {
            inner: Box::new(model),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn model(&self) -> &str {
        self.inner.model()
    }

    pub async fn invoke(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        self.inner.invoke_boxed(request).await
    }
}
