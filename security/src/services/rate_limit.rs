//! Optional rate-limit gate: per-caller token buckets ahead of the pipeline.
//!
//! Not installed by default; a pipeline without it can never produce a
//! rate-limit denial. When installed it runs before authentication, so even
//! unauthenticated floods are shed by ip key.

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use nonzero_ext::*;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use crate::context::SecurityContext;
use crate::errors::SecurityError;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

pub struct RateLimitService {
    quota: Quota,
    limiters: Arc<RwLock<HashMap<String, Arc<DirectLimiter>>>>,
}

impl RateLimitService {
    /// Token bucket of `requests_per_minute` per caller key; zero falls back
    /// to one request per minute rather than an unusable quota.
    pub fn new(requests_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(nonzero!(1u32));
        Self {
            quota: Quota::per_minute(per_minute),
            limiters: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Callers are keyed by user id when present, then by source ip.
    fn caller_key(context: &SecurityContext) -> String {
        if let Some(user_id) = context.user_id {
            return format!("user:{}", user_id);
        }
        if let Some(ref ip) = context.ip_address {
            return format!("ip:{}", ip);
        }
        "anonymous".to_string()
    }

    pub async fn check(&self, context: &SecurityContext) -> Result<(), SecurityError> {
        let key = Self::caller_key(context);
        let limiter = self.limiter_for(&key).await;

        match limiter.check() {
            Ok(_) => Ok(()),
            Err(_) => {
                warn!(caller = %key, "Rate limit exceeded");
                Err(SecurityError::rate_limited(format!(
                    "Rate limit exceeded for {}",
                    key
                )))
            }
        }
    }

    /// Checks are read-mostly: the write lock is taken only for a key with no
    /// bucket yet, and the entry is re-checked under it so racing misses still
    /// converge on one bucket.
    async fn limiter_for(&self, key: &str) -> Arc<DirectLimiter> {
        {
            let limiters = self.limiters.read().await;
            if let Some(limiter) = limiters.get(key) {
                return limiter.clone();
            }
        }

        let mut limiters = self.limiters.write().await;
        limiters
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(RateLimiter::direct(self.quota)))
            .clone()
    }
}
