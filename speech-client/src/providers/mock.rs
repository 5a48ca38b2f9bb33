//! Mock speech provider for testing
//!
//! Provides a configurable mock provider that can simulate failures, retries,
//! and successful responses, and records every request it receives.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, SpeechError};
use crate::provider::{SpeechAudio, SpeechProvider, SpeechRequest};

type Responder = Box<dyn Fn(&SpeechRequest) -> Vec<u8> + Send + Sync>;

/// A mock provider for testing retry and failure handling
pub struct MockProvider {
    /// Calls with index below this fail
    fail_before: AtomicUsize,
    /// A single call index that fails, if any
    fail_at: Option<usize>,
    /// Current call count
    call_count: AtomicUsize,
    /// Error to return on failure (None = always succeed)
    fail_with: Option<SpeechError>,
    /// Produces the audio bytes for a successful call
    responder: Responder,
    /// Text of every request, in call order
    requests: Mutex<Vec<String>>,
}

impl MockProvider {
    fn build(
        fail_before: usize,
        fail_at: Option<usize>,
        fail_with: Option<SpeechError>,
        responder: Responder,
    ) -> Self {
        Self {
            fail_before: AtomicUsize::new(fail_before),
            fail_at,
            call_count: AtomicUsize::new(0),
            fail_with,
            responder,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that always returns the given bytes
    pub fn always_succeeds(audio: &[u8]) -> Self {
        let audio = audio.to_vec();
        Self::build(0, None, None, Box::new(move |_| audio.clone()))
    }

    /// Create a provider whose audio is computed from each request
    pub fn responding_with<F>(responder: F) -> Self
    where
        F: Fn(&SpeechRequest) -> Vec<u8> + Send + Sync + 'static,
    {
        Self::build(0, None, None, Box::new(responder))
    }

    /// Create a provider that always fails with the given error
    pub fn always_fails(error: SpeechError) -> Self {
        Self::build(usize::MAX, None, Some(error), Box::new(|_| Vec::new()))
    }

    /// Create a provider that fails `n` times with the given error, then succeeds
    pub fn fails_then_succeeds(n: usize, error: SpeechError, audio: &[u8]) -> Self {
        let audio = audio.to_vec();
        Self::build(n, None, Some(error), Box::new(move |_| audio.clone()))
    }

    /// Fail only the call with zero-based index `call` (see `responding_with`)
    pub fn failing_on_call(mut self, call: usize, error: SpeechError) -> Self {
        self.fail_at = Some(call);
        self.fail_with = Some(error);
        self
    }

    /// Get the number of times synthesize() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Texts received so far, in call order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechProvider for MockProvider {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechAudio> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.text.clone());

        let should_fail =
            call_num < self.fail_before.load(Ordering::SeqCst) || self.fail_at == Some(call_num);
        if should_fail {
            if let Some(err) = self.fail_with.as_ref() {
                return Err(clone_error(err));
            }
        }

        Ok(SpeechAudio {
            bytes: (self.responder)(&request),
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }
}

/// Clone a SpeechError (needed because SpeechError doesn't implement Clone)
fn clone_error(err: &SpeechError) -> SpeechError {
    match err {
        SpeechError::MissingApiKey { provider, env_var } => SpeechError::MissingApiKey {
            provider: provider.clone(),
            env_var: env_var.clone(),
        },
        SpeechError::ProviderUnavailable(s) => SpeechError::ProviderUnavailable(s.clone()),
        SpeechError::RateLimited { retry_after } => SpeechError::RateLimited {
            retry_after: *retry_after,
        },
        SpeechError::ServerOverloaded { message } => SpeechError::ServerOverloaded {
            message: message.clone(),
        },
        SpeechError::Network(s) => SpeechError::Network(s.clone()),
        SpeechError::ApiError {
            message,
            status_code,
        } => SpeechError::ApiError {
            message: message.clone(),
            status_code: *status_code,
        },
        SpeechError::EmptyAudio => SpeechError::EmptyAudio,
        SpeechError::ConfigError(s) => SpeechError::ConfigError(s.clone()),
        SpeechError::CommandError(s) => SpeechError::CommandError(s.clone()),
        // IO errors can't be cloned
        SpeechError::Io(e) => SpeechError::Io(std::io::Error::new(e.kind(), e.to_string())),
    }
}
