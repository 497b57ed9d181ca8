//! In-memory fakes for the provider trait (testing only)
//!
//! Provides `StubProvider`, `ScriptedProvider` and `FailingProvider` that
//! satisfy the [`ModelProvider`] contract without any network access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ProviderError, ProviderResult};
use crate::provider_traits::{GenerateRequest, Generation, ModelProvider};

// ---------------------------------------------------------------------------
// StubProvider
// ---------------------------------------------------------------------------

/// Returns the same text for every request and counts calls.
///
/// An optional delay keeps calls in flight long enough for concurrency
/// assertions; `peak_in_flight` reports the highest overlap observed.
#[derive(Debug)]
pub struct StubProvider {
    id: String,
    response: String,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl StubProvider {
    pub fn new(id: &str, response: &str) -> Self {
        Self {
            id: id.to_string(),
            response: response.to_string(),
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `generate` calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously running `generate` calls.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for StubProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn generate(&self, request: &GenerateRequest) -> ProviderResult<Generation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(Generation {
            text: self.response.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// ScriptedProvider
// ---------------------------------------------------------------------------

type Script = dyn Fn(&GenerateRequest) -> ProviderResult<String> + Send + Sync;

/// Answers each request through a caller-supplied closure.
pub struct ScriptedProvider {
    id: String,
    script: Box<Script>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new<F>(id: &str, script: F) -> Self
    where
        F: Fn(&GenerateRequest) -> ProviderResult<String> + Send + Sync + 'static,
    {
        Self {
            id: id.to_string(),
            script: Box::new(script),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn generate(&self, request: &GenerateRequest) -> ProviderResult<Generation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.script)(request).map(|text| Generation { text })
    }
}

// ---------------------------------------------------------------------------
// FailingProvider
// ---------------------------------------------------------------------------

/// Fails every request with [`ProviderError::Other`].
#[derive(Debug)]
pub struct FailingProvider {
    id: String,
    message: String,
    calls: AtomicUsize,
}

impl FailingProvider {
    pub fn new(id: &str, message: &str) -> Self {
        Self {
            id: id.to_string(),
            message: message.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelProvider for FailingProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn generate(&self, _request: &GenerateRequest) -> ProviderResult<Generation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::Other(self.message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_counts_calls() {
        let stub = StubProvider::new("openai", "text");
        let req = GenerateRequest::new("gpt-4o", "p");
        stub.generate(&req).await.unwrap();
        stub.generate(&req).await.unwrap();
        assert_eq!(stub.calls(), 2);
        assert_eq!(stub.peak_in_flight(), 1);
        assert_eq!(stub.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_scripted_provider_echoes_model() {
        let scripted = ScriptedProvider::new("openai", |req| Ok(format!("model={}", req.model)));
        let out = scripted
            .generate(&GenerateRequest::new("gpt-5", "p"))
            .await
            .unwrap();
        assert_eq!(out.text, "model=gpt-5");
        assert_eq!(scripted.calls(), 1);
    }

    #[tokio::test]
    async fn test_failing_provider() {
        let failing = FailingProvider::new("anthropic", "boom");
        let err = failing
            .generate(&GenerateRequest::new("claude", "p"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert_eq!(failing.calls(), 1);
    }
}
