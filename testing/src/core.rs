use async_trait::async_trait;
use mockall::mock;
use parking_lot::Mutex;
use pdpcore::{
    error::BackendError,
    platform::{
        DefaultPDPlatform,
        PlatformUrl,
    },
    policy::{
        Policy,
        StoredPolicy,
    },
    traits::PolicyBackend,
};
use std::{
    sync::Arc,
    time::Duration,
};

mock! {
    pub Platform {}

    #[async_trait]
    impl PolicyBackend for Platform {
        async fn add_policy(
            &self,
            policy: &Policy,
        ) -> Result<i64, BackendError>;
        async fn list_policies(
            &self,
        ) -> Result<Vec<StoredPolicy>, BackendError>;
    }
}

impl PlatformUrl for MockPlatform {
    fn url(&self) -> &str {
        "mock::"
    }
}

impl DefaultPDPlatform for MockPlatform {}

/// Wraps a backend so that every call is delayed by an adjustable
/// duration before being passed through.
pub struct SlowPlatform<P> {
    inner: P,
    delay: Arc<Mutex<Duration>>,
}

impl<P> SlowPlatform<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            delay: Default::default(),
        }
    }

    pub fn delay_handle(&self) -> Arc<Mutex<Duration>> {
        self.delay.clone()
    }

    async fn wait(&self) {
        let delay = *self.delay.lock();
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl<P: PolicyBackend + Send + Sync> PolicyBackend for SlowPlatform<P> {
    async fn add_policy(
        &self,
        policy: &Policy,
    ) -> Result<i64, BackendError> {
        self.wait().await;
        self.inner.add_policy(policy).await
    }

    async fn list_policies(
        &self,
    ) -> Result<Vec<StoredPolicy>, BackendError> {
        self.wait().await;
        self.inner.list_policies().await
    }
}

impl<P: PlatformUrl> PlatformUrl for SlowPlatform<P> {
    fn url(&self) -> &str {
        self.inner.url()
    }
}

impl<P> DefaultPDPlatform for SlowPlatform<P> {}

#[cfg(test)]
mod tests {
    use pdpcore::platform::PDPlatform;
    use super::*;

    #[tokio::test]
    async fn slow_platform_passthrough() -> anyhow::Result<()> {
        let mut mock = MockPlatform::new();
        mock.expect_add_policy()
            .times(1)
            .returning(|_| Ok(3));
        let slow = SlowPlatform::new(mock);
        crate::is_send_sync(&slow);
        let platform: &dyn PDPlatform = slow.as_dyn();
        assert_eq!(platform.url(), "mock::");
        assert_eq!(
            platform.add_policy(&Policy::new("user:test", "resource:1", "read")).await?,
            3,
        );
        Ok(())
    }
}
