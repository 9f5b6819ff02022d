use async_trait::async_trait;
use warden_core::WardenResult;

/// One layer of the session chain.
///
/// Every layer honours the same contract so the facade can hold any of them
/// behind an `Arc<dyn SessionPolicy>`.
#[async_trait]
pub trait SessionPolicy: Send + Sync {
    /// Issue a new token for `user_id`. Fails with `InvalidInput` on an empty id.
    async fn create(&self, user_id: &str) -> WardenResult<String>;

    /// Map a token back to its user id.
    ///
    /// Misses are `NotFound`, stale tokens `Expired`.
    async fn resolve(&self, session_id: &str) -> WardenResult<String>;

    /// Forget a token. `Ok(false)` when there was nothing to forget.
    async fn destroy(&self, session_id: &str) -> WardenResult<bool>;
}
