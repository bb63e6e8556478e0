/*!
 * Mock provider implementations for testing.
 *
 * This module provides mock providers that simulate different behaviors:
 * - `MockProvider::working()` - Always succeeds with tagged text
 * - `MockProvider::failing(kind)` - Always fails with the given error kind
 * - `MockProvider::fail_times(n, kind)` - Fails the first `n` calls, then succeeds
 * - `MockProvider::slow(delay_ms)` - Succeeds after a delay
 *
 * Every call is recorded with its dispatch instant and texts so tests can
 * check rate limits and batch shapes.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::Instant;

use crate::app_config::TranslationProvider;
use crate::errors::{ErrorKind, ProviderError};
use crate::language_utils::Language;
use crate::providers::{Provider, TranslateRequest, TranslationOutput, char_count};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a tagged translation
    Working,
    /// Always fails with an error of this kind
    Failing(ErrorKind),
    /// Fails the first `times` calls, then succeeds
    FailTimes { times: usize, kind: ErrorKind },
    /// Simulates slow response
    Slow { delay_ms: u64 },
}

/// One recorded call
#[derive(Debug, Clone)]
pub struct MockCall {
    /// When the call reached the provider
    pub at: Instant,
    /// Texts in the batch
    pub texts: Vec<String>,
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Which back-end the mock stands in for
    kind: TranslationProvider,
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter
    request_count: Arc<AtomicUsize>,
    /// Recorded calls, shared between clones
    calls: Arc<Mutex<Vec<MockCall>>>,
    /// Languages treated as absent from the code table
    unsupported: Vec<Language>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            kind: TranslationProvider::Baidu,
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
            unsupported: Vec::new(),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock provider that always errors
    pub fn failing(kind: ErrorKind) -> Self {
        Self::new(MockBehavior::Failing(kind))
    }

    /// Create a mock that fails `times` calls before succeeding
    pub fn fail_times(times: usize, kind: ErrorKind) -> Self {
        Self::new(MockBehavior::FailTimes { times, kind })
    }

    /// Create a mock that answers after `delay_ms`
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Report as a different back-end
    pub fn with_kind(mut self, kind: TranslationProvider) -> Self {
        self.kind = kind;
        self
    }

    /// Mark languages as unsupported
    pub fn without_languages(mut self, languages: &[Language]) -> Self {
        self.unsupported = languages.to_vec();
        self
    }

    /// The translation the mock produces for a text
    pub fn translated(text: &str, target: Language) -> String {
        format!("[{}] {}", target.code(), text)
    }

    /// Number of calls received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Snapshot of the recorded calls
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    fn error_for(kind: ErrorKind, count: usize) -> ProviderError {
        let message = format!("Simulated failure (request #{})", count + 1);
        match kind {
            ErrorKind::NoCredentials => ProviderError::NoCredentials("mock".to_string()),
            ErrorKind::RateLimited => ProviderError::RateLimited(message),
            ErrorKind::QuotaExceeded => ProviderError::QuotaExceeded(message),
            ErrorKind::Forbidden => ProviderError::Forbidden(message),
            ErrorKind::RequestFailed => ProviderError::RequestFailed(message),
            ErrorKind::UnrecognizedErrorCode => ProviderError::unrecognized("mock", message),
            ErrorKind::UnsupportedLanguage => ProviderError::UnsupportedLanguage {
                provider: "mock".to_string(),
                language: "unknown".to_string(),
            },
        }
    }

    fn success(request: &TranslateRequest) -> TranslationOutput {
        TranslationOutput {
            translations: request
                .texts
                .iter()
                .map(|t| Self::translated(t, request.target))
                .collect(),
            word_count: char_count(&request.texts),
        }
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            calls: Arc::clone(&self.calls),
            unsupported: self.unsupported.clone(),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn kind(&self) -> TranslationProvider {
        self.kind
    }

    fn language_code(&self, language: Language) -> Option<&'static str> {
        if self.unsupported.contains(&language) {
            None
        } else {
            Some(language.code())
        }
    }

    async fn translate(&self, request: &TranslateRequest) -> Result<TranslationOutput, ProviderError> {
        self.require_code(request.source)?;
        self.require_code(request.target)?;

        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(MockCall {
            at: Instant::now(),
            texts: request.texts.clone(),
        });

        match self.behavior {
            MockBehavior::Working => Ok(Self::success(request)),

            MockBehavior::Failing(kind) => Err(Self::error_for(kind, count)),

            MockBehavior::FailTimes { times, kind } => {
                if count < times {
                    Err(Self::error_for(kind, count))
                } else {
                    Ok(Self::success(request))
                }
            }

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(Self::success(request))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(texts: &[&str]) -> TranslateRequest {
        TranslateRequest::new(
            texts.iter().map(|t| t.to_string()).collect(),
            Language::En,
            Language::Fr,
        )
    }

    #[tokio::test]
    async fn test_workingProvider_shouldReturnTaggedText() {
        let provider = MockProvider::working();

        let output = provider.translate(&request(&["Hello world"])).await.unwrap();

        assert_eq!(output.translations, vec!["[fr] Hello world"]);
        assert_eq!(output.word_count, 11);
    }

    #[tokio::test]
    async fn test_failingProvider_shouldReturnErrorOfKind() {
        let provider = MockProvider::failing(ErrorKind::QuotaExceeded);

        let err = provider.translate(&request(&["Hello"])).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::QuotaExceeded);
    }

    #[tokio::test]
    async fn test_failTimesProvider_shouldRecoverAfterFailures() {
        let provider = MockProvider::fail_times(2, ErrorKind::RateLimited);

        assert!(provider.translate(&request(&["a"])).await.is_err());
        assert!(provider.translate(&request(&["a"])).await.is_err());
        assert!(provider.translate(&request(&["a"])).await.is_ok());
        assert_eq!(provider.request_count(), 3);
    }

    #[tokio::test]
    async fn test_unsupportedLanguage_shouldFailWithoutRecordingCall() {
        let provider = MockProvider::working().without_languages(&[Language::Fr]);

        let err = provider.translate(&request(&["a"])).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnsupportedLanguage);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_clonedProvider_shouldShareRecordedCalls() {
        let provider = MockProvider::working();
        let cloned = provider.clone();

        cloned.translate(&request(&["x", "y"])).await.unwrap();

        assert_eq!(provider.calls().len(), 1);
        assert_eq!(provider.calls()[0].texts, vec!["x", "y"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slowProvider_shouldTakeConfiguredDelay() {
        let provider = MockProvider::slow(500);
        let start = Instant::now();

        provider.translate(&request(&["a"])).await.unwrap();

        assert!(start.elapsed() >= tokio::time::Duration::from_millis(500));
    }
}
