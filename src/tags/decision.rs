//! Deciding whether the local checkout is behind an incoming ref.
//!
//! The newest local tag is compared by name with the ref from the event. A
//! different name means the checkout should be updated; the same name means
//! it is current. An empty local tag list gives nothing to compare against
//! and is reported as [`Reconciliation::NoLocalTags`], which does not request
//! an update.

/// Outcome of comparing local tags with an incoming ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The newest local tag differs from the incoming ref.
    UpdateNeeded { from: String, to: String },

    /// The newest local tag is the incoming ref.
    UpToDate { tag: String },

    /// The checkout has no parseable tags.
    NoLocalTags,
}

impl Reconciliation {
    pub fn needs_update(&self) -> bool {
        matches!(self, Reconciliation::UpdateNeeded { .. })
    }

    /// The newest local tag, if there is one.
    pub fn latest_tag(&self) -> Option<&str> {
        match self {
            Reconciliation::UpdateNeeded { from, .. } => Some(from),
            Reconciliation::UpToDate { tag } => Some(tag),
            Reconciliation::NoLocalTags => None,
        }
    }

    /// The acknowledgement sent back to the webhook caller.
    pub fn info_message(&self, incoming_ref: &str) -> String {
        match self {
            Reconciliation::UpdateNeeded { to, .. } => format!("update to {to}"),
            Reconciliation::UpToDate { tag } => format!("The last tag is the same: {tag}"),
            Reconciliation::NoLocalTags => {
                format!("No local tags found to compare with {incoming_ref}")
            }
        }
    }
}

/// Compares the newest of `sorted_tags` with `incoming_ref`.
///
/// `sorted_tags` must be in ascending order, as returned by
/// [`super::list_sorted_tags`]. The comparison is by exact string.
pub fn decide(sorted_tags: &[String], incoming_ref: &str) -> Reconciliation {
    match sorted_tags.last() {
        Some(latest) if latest != incoming_ref => Reconciliation::UpdateNeeded {
            from: latest.clone(),
            to: incoming_ref.to_string(),
        },
        Some(latest) => Reconciliation::UpToDate {
            tag: latest.clone(),
        },
        None => Reconciliation::NoLocalTags,
    }
}
