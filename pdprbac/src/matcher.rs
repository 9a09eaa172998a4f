use pdpcore::policy::{
    Request,
    StoredPolicy,
};

/// Linear reference matcher.
///
/// Returns true iff at least one policy carries exactly the request's
/// triple.  [`crate::PolicySet`] must always agree with this function.
pub fn scan<'a>(
    policies: impl IntoIterator<Item = &'a StoredPolicy>,
    request: &Request,
) -> bool {
    policies.into_iter()
        .any(|policy| policy.subject == request.subject
            && policy.object == request.object
            && policy.action == request.action
        )
}
