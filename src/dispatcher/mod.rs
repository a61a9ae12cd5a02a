/// Rate-limited dispatch to the Printful API.
///
/// One upstream call at a time per endpoint: the caller holds the endpoint's
/// gate for the whole call-and-retry sequence, including any throttling
/// sleeps, so every other caller on that endpoint queues behind it. That
/// queueing IS the rate limiter: when one task sleeps out a quota window,
/// the whole process is held to the upstream's budget for that endpoint.
use crate::endpoints::{Endpoint, EndpointRegistry};
use crate::errors::{ProxyError, ProxyResult};
use crate::logger::{log, LogTag};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const RATE_REMAINING_HEADER: &str = "X-RateLimit-Remaining";
pub const RATE_RESET_HEADER: &str = "X-RateLimit-Reset";

/// A single prepared upstream call. Reused verbatim across 429 retries.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl UpstreamResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Seam between the dispatcher and the actual HTTP stack.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &UpstreamRequest) -> ProxyResult<UpstreamResponse>;
}

/// Production transport backed by reqwest.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout_secs: u64) -> ProxyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProxyError::Config(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &UpstreamRequest) -> ProxyResult<UpstreamResponse> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ProxyError::Network(format!("request failed: {}", e)))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| ProxyError::Network(format!("failed to read response body: {}", e)))?;

        Ok(UpstreamResponse { status, headers, body })
    }
}

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Total attempts before a persistent 429 becomes a fatal error.
    pub max_attempts: u32,
    /// Sleep between 429 retries.
    pub throttle_cooldown: Duration,
    /// Assumed reset interval when the reset header is absent or unparseable.
    pub default_reset: Duration,
    /// Safety margin added on top of the advertised reset interval.
    pub reset_margin: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            throttle_cooldown: Duration::from_secs(60),
            default_reset: Duration::from_secs(60),
            reset_margin: Duration::from_secs(2),
        }
    }
}

/// Issues upstream calls while holding the target endpoint's gate and
/// obeying both reactive (429) and proactive (remaining-quota header)
/// throttling signals.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    registry: Arc<EndpointRegistry>,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, registry: Arc<EndpointRegistry>) -> Self {
        Self::with_settings(transport, registry, DispatchSettings::default())
    }

    pub fn with_settings(
        transport: Arc<dyn Transport>,
        registry: Arc<EndpointRegistry>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            transport,
            registry,
            settings,
        }
    }

    /// Perform one upstream call against `endpoint`.
    ///
    /// The endpoint's gate is held from before the first attempt until after
    /// any quota-exhaustion sleep, and released on every exit path.
    pub async fn dispatch(
        &self,
        method: Method,
        endpoint: Endpoint,
        path: &str,
        headers: HeaderMap,
        body: Option<serde_json::Value>,
    ) -> ProxyResult<UpstreamResponse> {
        let url = join_url(endpoint, path)?;
        let gate = self.registry.gate_for(endpoint);
        let _guard = gate.lock().await;

        let request = UpstreamRequest {
            method,
            url,
            headers,
            body,
        };

        for attempt in 1..=self.settings.max_attempts {
            let response = self.transport.execute(&request).await?;

            if response.status == StatusCode::TOO_MANY_REQUESTS {
                if attempt == self.settings.max_attempts {
                    log(
                        LogTag::Api,
                        "ERROR",
                        &format!(
                            "{} still throttled after {} attempts, giving up",
                            endpoint.name(),
                            attempt
                        ),
                    );
                    return Err(ProxyError::RetriesExhausted { attempts: attempt });
                }
                log(
                    LogTag::Api,
                    "WARN",
                    &format!(
                        "{} throttled (429), cooling down {}s before attempt {}/{}",
                        endpoint.name(),
                        self.settings.throttle_cooldown.as_secs(),
                        attempt + 1,
                        self.settings.max_attempts
                    ),
                );
                tokio::time::sleep(self.settings.throttle_cooldown).await;
                continue;
            }

            if !response.status.is_success() {
                return Err(ProxyError::UpstreamStatus {
                    status: response.status.as_u16(),
                });
            }

            self.obey_quota(endpoint, &response).await?;
            return Ok(response);
        }

        Err(ProxyError::RetriesExhausted {
            attempts: self.settings.max_attempts,
        })
    }

    /// Honor the remaining-quota header of a successful response.
    ///
    /// Absent header: the endpoint is unmetered. Unparseable header: hard
    /// error. Remaining below one unit: sleep the advertised reset interval
    /// plus a margin BEFORE releasing the gate, so the next caller on this
    /// endpoint cannot trip the 429 path.
    async fn obey_quota(&self, endpoint: Endpoint, response: &UpstreamResponse) -> ProxyResult<()> {
        let raw = match response.header(RATE_REMAINING_HEADER) {
            None => return Ok(()),
            Some(raw) => raw,
        };

        let remaining: i64 = raw.trim().parse().map_err(|_| {
            ProxyError::RateLimitHeader(format!("{}: {:?}", RATE_REMAINING_HEADER, raw))
        })?;

        if remaining >= 1 {
            return Ok(());
        }

        let reset = response
            .header(RATE_RESET_HEADER)
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(self.settings.default_reset);
        let pause = reset + self.settings.reset_margin;

        log(
            LogTag::Api,
            "WARN",
            &format!(
                "{} quota exhausted, holding gate for {}s",
                endpoint.name(),
                pause.as_secs()
            ),
        );
        tokio::time::sleep(pause).await;
        Ok(())
    }
}

fn join_url(endpoint: Endpoint, path: &str) -> ProxyResult<String> {
    let url = format!("{}{}", endpoint.base_url(), path);
    Url::parse(&url).map_err(|e| ProxyError::Url(format!("{}: {}", url, e)))?;
    Ok(url)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use reqwest::header::HeaderName;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    #[derive(Debug, Clone)]
    pub(crate) struct MockResponse {
        pub status: u16,
        pub headers: Vec<(String, String)>,
        pub body: String,
    }

    impl MockResponse {
        pub fn ok(body: serde_json::Value) -> Self {
            Self {
                status: 200,
                headers: Vec::new(),
                body: body.to_string(),
            }
        }

        pub fn status(status: u16) -> Self {
            Self {
                status,
                headers: Vec::new(),
                body: String::new(),
            }
        }

        pub fn with_header(mut self, name: &str, value: &str) -> Self {
            self.headers.push((name.to_string(), value.to_string()));
            self
        }
    }

    /// In-memory transport keyed by full request URL. A route's last
    /// response is sticky: once the queued sequence is exhausted it keeps
    /// repeating.
    pub(crate) struct MockTransport {
        routes: StdMutex<HashMap<String, VecDeque<MockResponse>>>,
        calls: StdMutex<Vec<String>>,
        in_flight: AtomicUsize,
        pub max_in_flight: AtomicUsize,
        work: Duration,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self {
                routes: StdMutex::new(HashMap::new()),
                calls: StdMutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                work: Duration::from_millis(50),
            }
        }

        pub fn route(&self, url: &str, responses: Vec<MockResponse>) {
            self.routes
                .lock()
                .unwrap()
                .insert(url.to_string(), responses.into());
        }

        pub fn calls_to(&self, url: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
        }

        pub fn total_calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn next_response(&self, url: &str) -> Option<MockResponse> {
            let mut routes = self.routes.lock().unwrap();
            let queue = routes.get_mut(url)?;
            let response = queue.pop_front()?;
            if queue.is_empty() {
                queue.push_back(response.clone());
            }
            Some(response)
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn execute(&self, request: &UpstreamRequest) -> ProxyResult<UpstreamResponse> {
            self.calls.lock().unwrap().push(request.url.clone());

            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(self.work).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let mock = self
                .next_response(&request.url)
                .ok_or_else(|| ProxyError::Network(format!("no mock route for {}", request.url)))?;

            let mut headers = HeaderMap::new();
            for (name, value) in &mock.headers {
                headers.insert(
                    HeaderName::from_bytes(name.as_bytes()).unwrap(),
                    value.parse().unwrap(),
                );
            }

            Ok(UpstreamResponse {
                status: StatusCode::from_u16(mock.status).unwrap(),
                headers,
                body: mock.body,
            })
        }
    }
}
