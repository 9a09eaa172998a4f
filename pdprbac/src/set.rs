use pdpcore::{
    policy::{
        Policy,
        Request,
        StoredPolicy,
    },
    traits::Enforcer,
};
use std::collections::{
    BTreeMap,
    HashMap,
    HashSet,
};

use crate::error::Error;

type ActionIndex = HashMap<String, HashMap<String, HashSet<String>>>;

/// The full authorization state at a point in time.
///
/// Records are kept by their store identifier, while decisions are
/// served from an index keyed by subject, then object, holding the set
/// of permitted actions.  Duplicate tuples under distinct identifiers
/// are retained as records but collapse to a single index entry.
#[derive(Clone, Debug, Default)]
pub struct PolicySet {
    records: BTreeMap<i64, Policy>,
    index: ActionIndex,
}

impl PolicySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an acknowledged policy.
    ///
    /// Returns `Ok(false)` if the identical record was already present.
    /// An identifier already bound to a different tuple means the set
    /// has diverged from the store that produced it.
    pub fn insert(&mut self, stored: StoredPolicy) -> Result<bool, Error> {
        if let Some(existing) = self.records.get(&stored.id) {
            return if stored.is_tuple(existing) {
                Ok(false)
            } else {
                Err(Error::DuplicateId(stored.id))
            };
        }
        let id = stored.id;
        let policy = Policy::from(stored);
        self.index.entry(policy.subject.clone())
            .or_default()
            .entry(policy.object.clone())
            .or_default()
            .insert(policy.action.clone());
        self.records.insert(id, policy);
        Ok(true)
    }

    pub fn contains(
        &self,
        subject: &str,
        object: &str,
        action: &str,
    ) -> bool {
        self.index.get(subject)
            .and_then(|objects| objects.get(object))
            .map(|actions| actions.contains(action))
            .unwrap_or(false)
    }

    /// Number of stored records, duplicates included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The stored records, ordered by identifier.
    pub fn to_stored(&self) -> Vec<StoredPolicy> {
        self.records.iter()
            .map(|(id, policy)| policy.clone().into_stored(*id))
            .collect()
    }
}

impl TryFrom<Vec<StoredPolicy>> for PolicySet {
    type Error = Error;

    fn try_from(value: Vec<StoredPolicy>) -> Result<Self, Self::Error> {
        let mut result = Self::new();
        for stored in value.into_iter() {
            result.insert(stored)?;
        }
        log::debug!("policy set built with {} record(s)", result.len());
        Ok(result)
    }
}

impl Enforcer for PolicySet {
    type Error = Error;

    fn enforce(&self, request: &Request) -> Result<bool, Self::Error> {
        let result = self.contains(
            &request.subject,
            &request.object,
            &request.action,
        );
        log::trace!("enforce {request}: {result}");
        Ok(result)
    }
}
