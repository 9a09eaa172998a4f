//! Policy tuples and decision requests.
//!
//! A [`Policy`] is the authorization fact that `subject` may perform
//! `action` on `object`.  All three fields are compared as exact,
//! case-sensitive strings; nothing here normalizes them.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The policy tuple as submitted by a client.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct Policy {
    pub subject: String,
    pub object: String,
    pub action: String,
}

/// A policy tuple that has been acknowledged by the store, carrying the
/// identifier the store assigned to it.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct StoredPolicy {
    pub id: i64,
    pub subject: String,
    pub object: String,
    pub action: String,
}

/// A single decision request; never persisted.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct Request {
    pub subject: String,
    pub object: String,
    pub action: String,
}

/// The verdict for a [`Request`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct Decision {
    pub allowed: bool,
}

fn validate_fields(
    subject: &str,
    object: &str,
    action: &str,
) -> Result<(), ValidationError> {
    if subject.is_empty() {
        Err(ValidationError::EmptyField("subject"))
    } else if object.is_empty() {
        Err(ValidationError::EmptyField("object"))
    } else if action.is_empty() {
        Err(ValidationError::EmptyField("action"))
    } else {
        Ok(())
    }
}

impl Policy {
    pub fn new(
        subject: impl Into<String>,
        object: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            object: object.into(),
            action: action.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.subject, &self.object, &self.action)
    }

    pub fn into_stored(self, id: i64) -> StoredPolicy {
        let Policy { subject, object, action } = self;
        StoredPolicy { id, subject, object, action }
    }
}

impl StoredPolicy {
    /// Whether this stored record carries exactly the given tuple.
    pub fn is_tuple(&self, policy: &Policy) -> bool {
        self.subject == policy.subject
            && self.object == policy.object
            && self.action == policy.action
    }
}

impl From<StoredPolicy> for Policy {
    fn from(value: StoredPolicy) -> Self {
        let StoredPolicy { subject, object, action, .. } = value;
        Self { subject, object, action }
    }
}

impl Request {
    pub fn new(
        subject: impl Into<String>,
        object: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            object: object.into(),
            action: action.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.subject, &self.object, &self.action)
    }
}

impl From<Policy> for Request {
    fn from(value: Policy) -> Self {
        let Policy { subject, object, action } = value;
        Self { subject, object, action }
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        Self { allowed }
    }
}

mod display {
    use std::fmt::{Display, Formatter, Result};
    use super::{Policy, Request, StoredPolicy};

    impl Display for Policy {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result {
            write!(f, "({}, {}, {})", self.subject, self.object, self.action)
        }
    }

    impl Display for StoredPolicy {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result {
            write!(f, "#{} ({}, {}, {})", self.id, self.subject, self.object, self.action)
        }
    }

    impl Display for Request {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result {
            write!(f, "{} -> {} on {}", self.subject, self.action, self.object)
        }
    }
}
