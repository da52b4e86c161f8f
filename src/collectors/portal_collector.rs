use std::{
    future::Future,
    time::Duration,
};

use async_trait::async_trait;
use rand::Rng;
use reqwest::{
    header,
    header::{
        HeaderMap,
        HeaderValue,
    },
    Client,
};
use tracing::debug;
use url::Url;

use crate::{
    collectors::StatsSource,
    config::Config,
    errors::FetchError,
    stats::StatsPayload,
};

/// The portal rejects requests that look programmatic, so every attempt
/// carries headers sampled from ordinary browser clients.
const USER_AGENTS: &[&str] = &[
    // Popular desktop browsers
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:127.0) Gecko/20100101 Firefox/127.0",
    // Mobile browsers
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 14; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Mobile Safari/537.36",
];

const ACCEPT_LANGUAGES: &[&str] = &[
    "en-IN,en;q=0.9",
    "en-US,en;q=0.9",
    "en-GB,en;q=0.9",
    "en-IN,hi-IN;q=0.8,en;q=0.7",
];

/// A generic portal page as referer, to look like regular navigation.
const REFERER: &str = "https://eportal.incometax.gov.in/iec/foportal/en/";

/// Backoff schedule for fetch attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles per subsequent attempt.
    pub base_delay: Duration,
    /// Cap on the exponential delay.
    pub max_delay: Duration,
    /// Upper bound of the uniform random addition to each delay.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_jitter: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Deterministic part of the delay after failed attempt `attempt` (1-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(1).min(6);
        self.base_delay
            .saturating_mul(1 << doublings)
            .min(self.max_delay)
    }

    fn jitter(&self) -> Duration {
        let cap_ms = self.max_jitter.as_millis() as u64;
        if cap_ms == 0 {
            return Duration::ZERO;
        }
        let mut rng = rand::rng();
        Duration::from_millis(rng.random_range(0..=cap_ms))
    }
}

/// Run `attempt_fn` up to the policy's attempt cap, sleeping a jittered
/// exponential backoff between failures. The final failure is wrapped in
/// [`FetchError::Exhausted`] with the last underlying cause.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    mut attempt_fn: F,
) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match attempt_fn(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts => {
                let delay = policy.backoff_delay(attempt) + policy.jitter();
                debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "attempt failed, will retry"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                return Err(FetchError::Exhausted {
                    attempts: max_attempts,
                    source: Box::new(err),
                })
            }
        }
    }
}

/// Fetches the statistics payload from the e-portal endpoint.
pub struct PortalCollector {
    client: Client,
    endpoint: Url,
    policy: RetryPolicy,
}

impl PortalCollector {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint_url.clone(),
            policy: RetryPolicy::default(),
        })
    }

    /// One request: status check, then body, then shape validation.
    ///
    /// A non-JSON or schema-mismatched body counts as a retryable failure
    /// like any other, up to the attempt cap.
    async fn attempt_fetch(&self) -> Result<StatsPayload, FetchError> {
        tokio::time::sleep(pre_request_jitter()).await;

        let response = self
            .client
            .get(self.endpoint.clone())
            .headers(browser_headers())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        let payload: StatsPayload = serde_json::from_str(&body)?;
        Ok(payload)
    }
}

#[async_trait]
impl StatsSource for PortalCollector {
    async fn fetch(&self) -> Result<StatsPayload, FetchError> {
        run_with_retry(&self.policy, |attempt| {
            debug!(attempt, endpoint = %self.endpoint, "requesting statistics");
            self.attempt_fetch()
        })
        .await
    }
}

fn browser_headers() -> HeaderMap {
    let (user_agent, accept_language) = {
        let mut rng = rand::rng();
        (
            USER_AGENTS[rng.random_range(0..USER_AGENTS.len())],
            ACCEPT_LANGUAGES[rng.random_range(0..ACCEPT_LANGUAGES.len())],
        )
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(header::USER_AGENT, HeaderValue::from_static(user_agent));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static(accept_language),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(header::REFERER, HeaderValue::from_static(REFERER));
    headers
}

/// Small random pause before each request, to look less bot-like.
fn pre_request_jitter() -> Duration {
    let mut rng = rand::rng();
    Duration::from_millis(rng.random_range(200..=900))
}
