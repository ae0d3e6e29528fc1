//! Version lock guard
//!
//! Decides whether the tag recorded in a sensor's status still satisfies the
//! requested version, in which case resolution is skipped entirely and no
//! registry or API call is made.

/// Inputs of the version lock decision for one sensor resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockInputs<'a> {
    /// Tag recorded in status by the previous reconciliation
    pub observed_tag: Option<&'a str>,
    /// Explicit version requested by the sensor resource
    pub requested_version: Option<&'a str>,
    /// Whether the sensor resource names an update policy
    pub has_update_policy: bool,
    /// Whether the sensor opted into automatic updates
    pub auto_updating: bool,
}

impl LockInputs<'_> {
    pub fn is_locked(&self) -> bool {
        is_locked(
            self.observed_tag,
            self.requested_version,
            self.has_update_policy,
            self.auto_updating,
        )
    }
}

/// Whether the previously observed tag can be kept without resolving again
///
/// Empty strings count as absent. An observed "latest" resolution is sticky
/// and only advances on an explicit trigger.
///
/// The version check is a plain substring test, so a requested "1.2" also
/// locks onto "11.20.0-..." tags.
pub fn is_locked(
    observed_tag: Option<&str>,
    requested_version: Option<&str>,
    has_update_policy: bool,
    auto_updating: bool,
) -> bool {
    if has_update_policy || auto_updating {
        return false;
    }

    let Some(observed) = observed_tag.filter(|t| !t.is_empty()) else {
        return false;
    };

    match requested_version.filter(|v| !v.is_empty()) {
        None => true,
        Some(requested) => observed.contains(requested),
    }
}
