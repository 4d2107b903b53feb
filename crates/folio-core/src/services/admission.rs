//! Admission guard - decides whether a chat request may reach the provider.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{Admission, ClientIdentity, FailurePolicy};
use crate::ports::{Quota, RateLimiter};

/// Admission settings.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionConfig {
    pub quota: Quota,
    /// Applied when the counter store cannot be consulted.
    pub failure_policy: FailurePolicy,
    /// Reverse proxies in front of the server that append to `X-Forwarded-For`.
    pub trusted_proxy_hops: usize,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            quota: Quota::default(),
            failure_policy: FailurePolicy::default(),
            trusted_proxy_hops: 1,
        }
    }
}

/// Per-client admission control in front of the completion provider.
///
/// Every call performs exactly one check-and-record against the limiter.
/// Store failures never surface as errors; they resolve through the
/// configured [`FailurePolicy`].
pub struct AdmissionGuard {
    limiter: Arc<dyn RateLimiter>,
    config: AdmissionConfig,
}

impl AdmissionGuard {
    pub fn new(limiter: Arc<dyn RateLimiter>, config: AdmissionConfig) -> Self {
        Self { limiter, config }
    }

    /// Resolve the caller from a raw `X-Forwarded-For` value.
    pub fn identify(&self, forwarded_for: Option<&str>) -> ClientIdentity {
        ClientIdentity::from_forwarded_for(forwarded_for, self.config.trusted_proxy_hops)
    }

    pub fn backend(&self) -> &'static str {
        self.limiter.backend()
    }

    /// Check and count one request from `client`.
    pub async fn admit(&self, client: &ClientIdentity) -> Admission {
        let quota = self.config.quota;

        match self.limiter.check(client.as_str(), quota).await {
            Ok(result) => {
                let admission = Admission::new(
                    result.allowed,
                    result.limit,
                    result.remaining,
                    result.reset_after,
                    Utc::now(),
                );

                if admission.allowed {
                    tracing::debug!(
                        client = %client,
                        remaining = admission.remaining,
                        "Request admitted"
                    );
                } else {
                    tracing::warn!(
                        client = %client,
                        remaining = admission.remaining,
                        retry_after_secs = admission.retry_after_secs(),
                        "Rate limit exceeded"
                    );
                }

                admission
            }
            Err(e) => match self.config.failure_policy {
                FailurePolicy::Open => {
                    tracing::error!(
                        client = %client,
                        backend = self.limiter.backend(),
                        error = %e,
                        "Rate limiter unavailable, failing open"
                    );
                    Admission::allow(quota.limit, quota.limit, quota.window)
                }
                FailurePolicy::Closed => {
                    tracing::error!(
                        client = %client,
                        backend = self.limiter.backend(),
                        error = %e,
                        "Rate limiter unavailable, failing closed"
                    );
                    Admission::deny(quota.limit, quota.window)
                }
            },
        }
    }
}
