use casbin::{
    CoreApi,
    DefaultModel,
    MemoryAdapter,
    MgmtApi,
};
use pdpcore::{
    policy::{
        Request,
        StoredPolicy,
    },
    traits::Enforcer,
};
use std::collections::BTreeSet;

use crate::error::Error;

/// A flat casbin model where every field must be equal.
const DEFAULT_MODEL: &str = "\
[request_definition]
r = sub, obj, act

[policy_definition]
p = sub, obj, act

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = r.sub == p.sub && r.obj == p.obj && r.act == p.act
";

/// An enforcer backed by casbin, for cross checking the verdicts of
/// [`crate::PolicySet`] against an established engine.
pub struct CasbinEnforcer {
    enforcer: casbin::Enforcer,
}

impl CasbinEnforcer {
    pub async fn new(
        policies: impl IntoIterator<Item = StoredPolicy>,
    ) -> Result<Self, Error> {
        let m = DefaultModel::from_str(DEFAULT_MODEL).await?;
        let a = MemoryAdapter::default();
        let mut enforcer = casbin::Enforcer::new(m, a).await?;
        // casbin refuses a batch containing any rule it already holds
        let rules = policies.into_iter()
            .map(|StoredPolicy { subject, object, action, .. }| {
                vec![subject, object, action]
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        let n = rules.len();
        if n > 0 {
            enforcer.add_named_policies("p", rules).await?;
        }
        log::debug!("casbin enforcer set up with {n} policies");
        Ok(Self { enforcer })
    }
}

impl Enforcer for CasbinEnforcer {
    type Error = Error;

    fn enforce(&self, request: &Request) -> Result<bool, Self::Error> {
        Ok(self.enforcer.enforce((
            request.subject.as_str(),
            request.object.as_str(),
            request.action.as_str(),
        ))?)
    }
}
