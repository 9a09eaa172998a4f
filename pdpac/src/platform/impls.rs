use pdpcore::{
    error::BackendError,
    platform::PDPlatform,
    policy::{
        Policy,
        Request,
        StoredPolicy,
    },
    traits::Enforcer,
};
use pdprbac::PolicySet;
use std::{
    future::Future,
    sync::Arc,
    time::Duration,
};
use tokio::sync::watch;

use crate::error::Error;
use super::*;

impl Default for Builder {
    fn default() -> Self {
        Self {
            pd_platform: None,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pd_platform(mut self, val: impl PDPlatform + 'static) -> Self {
        self.pd_platform = Some(Arc::new(val));
        self
    }

    pub fn boxed_pd_platform(mut self, val: Arc<dyn PDPlatform>) -> Self {
        self.pd_platform = Some(val);
        self
    }

    /// Upper bound for every individual call made to the store.
    pub fn store_timeout(mut self, val: Duration) -> Self {
        self.store_timeout = val;
        self
    }

    /// How long a request waits for the initial load before giving up.
    pub fn ready_timeout(mut self, val: Duration) -> Self {
        self.ready_timeout = val;
        self
    }

    /// The resulting platform is `Uninitialized` and will only serve
    /// requests after a successful [`Platform::reload`].
    pub fn build(self) -> Result<Platform, Error> {
        let (state, _) = watch::channel(State::Uninitialized);
        Ok(Platform(Arc::new(PlatformInner {
            pd_platform: self.pd_platform
                .ok_or(Error::Misconfiguration("pd_platform"))?,
            store_timeout: self.store_timeout,
            ready_timeout: self.ready_timeout,
            policy_set: Default::default(),
            state,
            reload_gate: Default::default(),
        })))
    }
}

impl Platform {
    pub fn pd_platform(&self) -> &dyn PDPlatform {
        self.0.pd_platform.as_ref()
    }

    pub fn state(&self) -> State {
        *self.0.state.borrow()
    }

    /// A consistent view of the policy set as of this call.
    pub fn snapshot(&self) -> Arc<PolicySet> {
        self.0.policy_set.read().clone()
    }

    async fn wait_ready(&self) -> Result<(), Error> {
        let mut receiver = self.0.state.subscribe();
        let ready = tokio::time::timeout(
            self.0.ready_timeout,
            receiver.wait_for(|state| *state == State::Ready),
        ).await;
        match ready {
            Ok(Ok(_)) => Ok(()),
            _ => {
                log::warn!(
                    "policy set not ready after {:?}; state is {:?}",
                    self.0.ready_timeout,
                    self.state(),
                );
                Err(Error::NotReady)
            }
        }
    }

    async fn store<T>(
        &self,
        call: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, Error> {
        tokio::time::timeout(self.0.store_timeout, call).await
            .map_err(|_| Error::StoreTimeout(self.0.store_timeout))?
            .map_err(Error::from)
    }
}

// Enforcement

impl Platform {
    /// Persist the policy and make it visible to subsequent checks.
    ///
    /// Nothing in memory is touched unless the store acknowledged the
    /// write.
    pub async fn add_policy(
        &self,
        policy: Policy,
    ) -> Result<StoredPolicy, Error> {
        policy.validate()?;
        self.wait_ready().await?;
        let _gate = self.0.reload_gate.read().await;
        let id = self.store(self.0.pd_platform.add_policy(&policy)).await?;
        let stored = policy.into_stored(id);
        {
            let mut policy_set = self.0.policy_set.write();
            Arc::make_mut(&mut policy_set)
                .insert(stored.clone())
                .map_err(|e| {
                    log::error!("policy {stored} written to store but not applied: {e}");
                    Error::InternalInconsistency(e.to_string())
                })?;
        }
        log::debug!("policy {stored} created");
        Ok(stored)
    }

    /// Decide the request against the current policy set.
    ///
    /// The absence of a matching policy is `Ok(false)`, never an error.
    pub async fn check(
        &self,
        request: &Request,
    ) -> Result<bool, Error> {
        request.validate()?;
        self.wait_ready().await?;
        Ok(self.snapshot().enforce(request)?)
    }

    /// Replace the policy set with the full contents of the store,
    /// returning the number of policies loaded.
    ///
    /// On failure the previous policy set remains in effect.
    pub async fn reload(&self) -> Result<usize, Error> {
        let _gate = self.0.reload_gate.write().await;
        let initial = self.state() != State::Ready;
        if initial {
            self.0.state.send_replace(State::Loading);
        }
        let result = match self.store(self.0.pd_platform.list_policies()).await {
            Ok(policies) => PolicySet::try_from(policies)
                .map_err(|e| Error::InternalInconsistency(e.to_string())),
            Err(e) => Err(e),
        };
        match result {
            Ok(policy_set) => {
                let n = policy_set.len();
                *self.0.policy_set.write() = Arc::new(policy_set);
                self.0.state.send_replace(State::Ready);
                log::info!("policy set loaded with {n} policies");
                Ok(n)
            }
            Err(e) => {
                if initial {
                    self.0.state.send_replace(State::Uninitialized);
                }
                log::error!("failed to reload policy set: {e}");
                Err(e)
            }
        }
    }

    /// The policies currently in effect, ordered by identifier.
    pub async fn policies(&self) -> Result<Vec<StoredPolicy>, Error> {
        self.wait_ready().await?;
        Ok(self.snapshot().to_stored())
    }
}

#[cfg(test)]
mod test {
    use pdpcore::{
        error::{
            BackendError,
            ValidationError,
        },
        policy::{
            Policy,
            Request,
        },
    };
    use std::time::Duration;
    use test_pdp::core::{
        MockPlatform,
        SlowPlatform,
    };

    use crate::error::Error;
    use super::*;

    fn platform(mock: MockPlatform) -> anyhow::Result<Platform> {
        Ok(Builder::new()
            .pd_platform(mock)
            .ready_timeout(Duration::from_millis(50))
            .build()?)
    }

    #[test]
    fn build_requires_platform() {
        assert!(matches!(
            Builder::new().build(),
            Err(Error::Misconfiguration("pd_platform")),
        ));
    }

    #[tokio::test]
    async fn store_failure_leaves_no_phantom() -> anyhow::Result<()> {
        let mut mock = MockPlatform::new();
        mock.expect_list_policies()
            .times(1)
            .returning(|| Ok(vec![]));
        mock.expect_add_policy()
            .times(1)
            .returning(|_| Err(BackendError::Unavailable("connection reset".into())));
        let platform = platform(mock)?;
        platform.reload().await?;

        let policy = Policy::new("user:test", "resource:1", "read");
        let err = platform.add_policy(policy.clone()).await
            .expect_err("store is unavailable");
        assert!(matches!(err, Error::Backend(BackendError::Unavailable(_))));
        assert!(err.is_retryable());
        assert!(!platform.check(&policy.into()).await?);
        assert!(platform.snapshot().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn validation_precedes_store() -> anyhow::Result<()> {
        let mut mock = MockPlatform::new();
        mock.expect_list_policies()
            .returning(|| Ok(vec![]));
        mock.expect_add_policy()
            .never();
        let platform = platform(mock)?;
        platform.reload().await?;

        assert!(matches!(
            platform.add_policy(Policy::new("", "resource:1", "read")).await,
            Err(Error::Validation(ValidationError::EmptyField("subject"))),
        ));
        assert!(matches!(
            platform.add_policy(Policy::new("user:test", "resource:1", "")).await,
            Err(Error::Validation(ValidationError::EmptyField("action"))),
        ));
        assert!(matches!(
            platform.check(&Request::new("user:test", "", "read")).await,
            Err(Error::Validation(ValidationError::EmptyField("object"))),
        ));
        assert!(platform.snapshot().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn not_ready() -> anyhow::Result<()> {
        let mut mock = MockPlatform::new();
        mock.expect_list_policies()
            .times(1)
            .returning(|| Err(BackendError::Unavailable("connection refused".into())));
        mock.expect_add_policy()
            .never();
        let platform = platform(mock)?;
        assert_eq!(platform.state(), State::Uninitialized);

        let request = Request::new("user:test", "resource:1", "read");
        assert!(matches!(platform.check(&request).await, Err(Error::NotReady)));
        assert!(matches!(
            platform.add_policy(Policy::new("user:test", "resource:1", "read")).await,
            Err(Error::NotReady),
        ));

        // failed initial load returns to uninitialized
        assert!(platform.reload().await.is_err());
        assert_eq!(platform.state(), State::Uninitialized);
        assert!(matches!(platform.check(&request).await, Err(Error::NotReady)));
        Ok(())
    }

    #[tokio::test]
    async fn check_blocks_until_ready() -> anyhow::Result<()> {
        let mut mock = MockPlatform::new();
        mock.expect_list_policies()
            .times(1)
            .returning(|| Ok(vec![
                Policy::new("user:test", "resource:1", "read").into_stored(1),
            ]));
        let platform = Builder::new()
            .pd_platform(mock)
            .ready_timeout(Duration::from_secs(30))
            .build()?;

        let pending = tokio::spawn({
            let platform = platform.clone();
            async move {
                platform.check(&Request::new("user:test", "resource:1", "read")).await
            }
        });
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        assert_eq!(platform.reload().await?, 1);
        assert_eq!(platform.state(), State::Ready);
        assert!(pending.await??);
        Ok(())
    }

    #[tokio::test]
    async fn failed_reload_keeps_snapshot() -> anyhow::Result<()> {
        let mut mock = MockPlatform::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_list_policies()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![
                Policy::new("user:test", "resource:1", "read").into_stored(1),
            ]));
        mock.expect_list_policies()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(BackendError::Unavailable("connection reset".into())));
        let platform = platform(mock)?;
        platform.reload().await?;
        assert!(platform.reload().await.is_err());
        assert_eq!(platform.state(), State::Ready);
        assert!(platform.check(&Request::new("user:test", "resource:1", "read")).await?);
        Ok(())
    }

    #[tokio::test]
    async fn divergence_is_internal_inconsistency() -> anyhow::Result<()> {
        let mut mock = MockPlatform::new();
        mock.expect_list_policies()
            .returning(|| Ok(vec![
                Policy::new("user:test", "resource:1", "read").into_stored(1),
            ]));
        // a store that was reset out-of-band hands out an id again
        mock.expect_add_policy()
            .returning(|_| Ok(1));
        let platform = platform(mock)?;
        platform.reload().await?;

        let policy = Policy::new("user:other", "resource:2", "write");
        assert!(matches!(
            platform.add_policy(policy.clone()).await,
            Err(Error::InternalInconsistency(_)),
        ));
        assert!(!platform.check(&policy.into()).await?);
        assert_eq!(platform.snapshot().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn write_through() -> anyhow::Result<()> {
        let mut mock = MockPlatform::new();
        mock.expect_list_policies()
            .returning(|| Ok(vec![]));
        let mut seq = mockall::Sequence::new();
        mock.expect_add_policy()
            .withf(|policy| policy.subject == "user:test")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(1));
        mock.expect_add_policy()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(2));
        let platform = platform(mock)?;
        platform.reload().await?;

        let policy = Policy::new("user:test", "resource:1", "read");
        let stored = platform.add_policy(policy.clone()).await?;
        assert_eq!(stored, policy.clone().into_stored(1));
        assert!(platform.check(&policy.clone().into()).await?);
        // idempotent for decisions
        platform.add_policy(policy.clone()).await?;
        assert!(platform.check(&policy.into()).await?);
        assert_eq!(platform.policies().await?.len(), 2);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn store_timeout() -> anyhow::Result<()> {
        let mut mock = MockPlatform::new();
        mock.expect_list_policies()
            .returning(|| Ok(vec![]));
        mock.expect_add_policy()
            .returning(|_| Ok(1));
        let slow = SlowPlatform::new(mock);
        let delay = slow.delay_handle();
        let platform = Builder::new()
            .pd_platform(slow)
            .store_timeout(Duration::from_millis(100))
            .build()?;
        platform.reload().await?;

        *delay.lock() = Duration::from_secs(10);
        let policy = Policy::new("user:test", "resource:1", "read");
        let err = platform.add_policy(policy.clone()).await
            .expect_err("store is too slow");
        assert!(matches!(err, Error::StoreTimeout(_)));
        assert!(err.is_retryable());
        assert!(!platform.check(&policy.into()).await?);
        assert!(matches!(platform.reload().await, Err(Error::StoreTimeout(_))));
        assert_eq!(platform.state(), State::Ready);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn requests_wait_while_loading() -> anyhow::Result<()> {
        let mut mock = MockPlatform::new();
        mock.expect_list_policies()
            .times(1)
            .returning(|| Ok(vec![
                Policy::new("user:test", "resource:1", "read").into_stored(1),
            ]));
        mock.expect_add_policy()
            .times(1)
            .returning(|_| Ok(2));
        let slow = SlowPlatform::new(mock);
        *slow.delay_handle().lock() = Duration::from_secs(1);
        let platform = Builder::new()
            .pd_platform(slow)
            .build()?;

        let reload = tokio::spawn({
            let platform = platform.clone();
            async move { platform.reload().await }
        });
        while platform.state() != State::Loading {
            tokio::task::yield_now().await;
        }
        assert_eq!(platform.state(), State::Loading);

        let check = tokio::spawn({
            let platform = platform.clone();
            async move {
                platform.check(&Request::new("user:test", "resource:1", "read")).await
            }
        });
        let add = tokio::spawn({
            let platform = platform.clone();
            async move {
                platform.add_policy(Policy::new("user:other", "resource:2", "write")).await
            }
        });
        tokio::task::yield_now().await;
        assert!(!check.is_finished());
        assert!(!add.is_finished());
        assert_eq!(platform.state(), State::Loading);

        assert_eq!(reload.await??, 1);
        assert_eq!(platform.state(), State::Ready);
        assert!(check.await??);
        assert_eq!(add.await??.id, 2);
        assert!(platform.check(&Request::new("user:other", "resource:2", "write")).await?);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn checks_during_reload_see_full_snapshot() -> anyhow::Result<()> {
        let mut mock = MockPlatform::new();
        mock.expect_list_policies()
            .returning(|| Ok(vec![
                Policy::new("user:test", "resource:1", "read").into_stored(1),
                Policy::new("user:test", "resource:2", "write").into_stored(2),
            ]));
        let slow = SlowPlatform::new(mock);
        let delay = slow.delay_handle();
        let platform = Builder::new()
            .pd_platform(slow)
            .build()?;
        platform.reload().await?;

        *delay.lock() = Duration::from_millis(10);
        let reloads = tokio::spawn({
            let platform = platform.clone();
            async move {
                for _ in 0..5 {
                    platform.reload().await?;
                }
                Ok::<_, Error>(())
            }
        });

        let first = Request::new("user:test", "resource:1", "read");
        let second = Request::new("user:test", "resource:2", "write");
        let mut checks = 0;
        while !reloads.is_finished() {
            assert_eq!(platform.state(), State::Ready);
            assert!(platform.check(&first).await?);
            assert!(platform.check(&second).await?);
            checks += 1;
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        reloads.await??;
        assert!(checks > 0);
        assert_eq!(platform.snapshot().len(), 2);
        Ok(())
    }
}
