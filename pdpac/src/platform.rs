//! The enforcement service.
//!
//! [`Platform`] owns the live [`PolicySet`] and coordinates it with the
//! durable store behind a [`PDPlatform`].  Creation is write-through:
//! the store is written first and the set is only updated once the
//! store acknowledged the tuple, all before the caller sees success.
//! Decisions are served from the set alone.

use pdpcore::platform::PDPlatform;
use pdprbac::PolicySet;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{
    sync::Arc,
    time::Duration,
};
use tokio::sync::watch;

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifecycle of the live policy set.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub enum State {
    #[default]
    Uninitialized,
    Loading,
    Ready,
}

pub struct Builder {
    pd_platform: Option<Arc<dyn PDPlatform>>,
    store_timeout: Duration,
    ready_timeout: Duration,
}

#[derive(Clone)]
pub struct Platform(Arc<PlatformInner>);

pub(crate) struct PlatformInner {
    pub(crate) pd_platform: Arc<dyn PDPlatform>,
    pub(crate) store_timeout: Duration,
    pub(crate) ready_timeout: Duration,
    // readers clone the inner `Arc`; writers replace or copy-on-write it
    pub(crate) policy_set: RwLock<Arc<PolicySet>>,
    pub(crate) state: watch::Sender<State>,
    // shared by creations, exclusive for reload
    pub(crate) reload_gate: tokio::sync::RwLock<()>,
}

mod impls;
