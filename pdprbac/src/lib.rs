//! Decision engine for the policy decision point.
//!
//! A request is allowed iff the [`PolicySet`] holds a tuple whose
//! subject, object and action are all equal to those of the request.
//! There is no wildcard, hierarchy or role inheritance; anything richer
//! is expected to be provided as another [`pdpcore::traits::Enforcer`].

pub mod error;
pub mod matcher;
mod set;

#[cfg(feature = "casbin")]
pub mod casbin;

pub use set::PolicySet;
