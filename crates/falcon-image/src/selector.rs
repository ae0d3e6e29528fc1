//! Tag selection
//!
//! Each sensor type publishes tags of a recognizable shape. A tag is eligible
//! when it starts with a digit, contains the sensor's marker and, if a version
//! prefix was resolved, starts with that prefix. The last eligible tag wins.

use crate::error::{ImageError, Result};
use falcon_core::{CloudRegion, SensorType};
use semver::Version;
use std::cmp::Ordering;
use tracing::{debug, trace};

/// Substring every tag of `sensor_type` carries
pub fn tag_marker(sensor_type: SensorType, cloud: CloudRegion) -> String {
    match sensor_type {
        SensorType::Node => ".falcon-linux.x86_64".to_string(),
        SensorType::Sidecar => ".container.x86_64".to_string(),
        SensorType::RegionedSidecar => format!(
            ".container.x86_64.Release.{}",
            cloud.as_str().to_ascii_uppercase()
        ),
        SensorType::Admission => ".Release".to_string(),
        SensorType::ImageAnalyzer => ".".to_string(),
    }
}

/// Eligibility test for registry tags of one sensor type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPredicate {
    marker: String,
    version_prefix: Option<String>,
    /// Image analyzer tags are bare versions with no platform suffix
    bare_version: bool,
}

impl TagPredicate {
    /// Predicate for `sensor_type`; `None` as prefix accepts any version ("latest")
    pub fn new(sensor_type: SensorType, cloud: CloudRegion, version_prefix: Option<&str>) -> Self {
        Self {
            marker: tag_marker(sensor_type, cloud),
            version_prefix: version_prefix.map(str::to_string),
            bare_version: sensor_type == SensorType::ImageAnalyzer,
        }
    }

    pub fn version_prefix(&self) -> Option<&str> {
        self.version_prefix.as_deref()
    }

    pub fn matches(&self, tag: &str) -> bool {
        let digit_leading = tag.chars().next().is_some_and(|c| c.is_ascii_digit());
        let version_match = self
            .version_prefix
            .as_deref()
            .is_none_or(|prefix| tag.starts_with(prefix));
        let shape_match = !self.bare_version || is_bare_version(tag);

        digit_leading && version_match && shape_match && tag.contains(&self.marker)
    }
}

/// Digits, dots and build separators only, so platform-suffixed sensor tags never qualify
fn is_bare_version(tag: &str) -> bool {
    tag.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-')
}

/// Pick the last tag satisfying `predicate`
///
/// Image analyzer tags are sorted by semantic version first; every other
/// sensor type keeps the registry's order. `repository` only labels the
/// error when nothing matches.
pub fn select_tag<F>(
    tags: Vec<String>,
    predicate: F,
    sensor_type: SensorType,
    repository: &str,
) -> Result<String>
where
    F: Fn(&str) -> bool,
{
    let ordered = if sensor_type == SensorType::ImageAnalyzer {
        sort_by_version(&tags)
    } else {
        tags.clone()
    };

    let selected = ordered.into_iter().rev().find(|tag| predicate(tag.as_str()));

    match selected {
        Some(tag) => {
            debug!(sensor = %sensor_type, tag = %tag, "Selected tag");
            Ok(tag)
        }
        None => {
            trace!(sensor = %sensor_type, count = tags.len(), "No tag matched");
            Err(ImageError::NoMatchingTag {
                repository: repository.to_string(),
                tags,
            })
        }
    }
}

/// Ascending order by semantic version
///
/// Semantic versions are compared only when both tags parse; otherwise the
/// raw strings are compared lexicographically. Equal versions break ties on
/// the raw string.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    compare_parsed(parse_version(a).as_ref(), a, parse_version(b).as_ref(), b)
}

/// Sort tags ascending with [`compare_versions`]
///
/// Mixing parsed and unparsed tags can make the comparison intransitive,
/// which `slice::sort_by` may panic on. Tags are therefore placed by stable
/// insertion, with each version parsed once.
fn sort_by_version(tags: &[String]) -> Vec<String> {
    let mut ordered: Vec<(Option<Version>, &String)> = Vec::with_capacity(tags.len());

    for tag in tags {
        let version = parse_version(tag);
        let position = ordered
            .iter()
            .rposition(|(other_version, other)| {
                compare_parsed(other_version.as_ref(), other, version.as_ref(), tag)
                    != Ordering::Greater
            })
            .map_or(0, |i| i + 1);
        ordered.insert(position, (version, tag));
    }

    ordered.into_iter().map(|(_, tag)| tag.clone()).collect()
}

fn compare_parsed(va: Option<&Version>, a: &str, vb: Option<&Version>, b: &str) -> Ordering {
    match (va, vb) {
        (Some(va), Some(vb)) => va.cmp(vb).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

fn parse_version(tag: &str) -> Option<Version> {
    let version_str = tag.strip_prefix('v').unwrap_or(tag);
    Version::parse(version_str).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_latest_container_tag() {
        let inventory = tags(&[
            "6.30.0-100.container.x86_64",
            "6.31.0-200.container.x86_64",
            "7.0.0-1.falcon-linux.x86_64",
        ]);
        let predicate = TagPredicate::new(SensorType::Sidecar, CloudRegion::Us1, None);
        let tag = select_tag(
            inventory,
            |t| predicate.matches(t),
            SensorType::Sidecar,
            "repo",
        )
        .unwrap();
        assert_eq!(tag, "6.31.0-200.container.x86_64");
    }

    #[test]
    fn test_version_prefix_without_match() {
        let inventory = tags(&["6.30.0-100.container.x86_64"]);
        let predicate = TagPredicate::new(SensorType::Sidecar, CloudRegion::Us1, Some("6.31"));
        let err = select_tag(
            inventory,
            |t| predicate.matches(t),
            SensorType::Sidecar,
            "repo",
        )
        .unwrap_err();
        match err {
            ImageError::NoMatchingTag { repository, tags } => {
                assert_eq!(repository, "repo");
                assert_eq!(tags, vec!["6.30.0-100.container.x86_64".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_inventory_never_succeeds() {
        let err = select_tag(Vec::new(), |_| true, SensorType::Node, "repo").unwrap_err();
        assert!(matches!(err, ImageError::NoMatchingTag { .. }));
    }

    #[test]
    fn test_registry_order_kept_for_node_sensor() {
        // Registry order is trusted, so a lexicographically smaller tag listed last wins
        let inventory = tags(&[
            "7.10.0-16303-1.falcon-linux.x86_64.Release.US-1",
            "7.9.0-15000-1.falcon-linux.x86_64.Release.US-1",
        ]);
        let predicate = TagPredicate::new(SensorType::Node, CloudRegion::Us1, None);
        let tag = select_tag(inventory, |t| predicate.matches(t), SensorType::Node, "repo")
            .unwrap();
        assert_eq!(tag, "7.9.0-15000-1.falcon-linux.x86_64.Release.US-1");
    }

    #[test]
    fn test_image_analyzer_sorted_semantically() {
        let inventory = tags(&["1.0.10", "1.0.9", "latest", "1.0.2"]);
        let predicate = TagPredicate::new(SensorType::ImageAnalyzer, CloudRegion::Us1, None);
        let tag = select_tag(
            inventory,
            |t| predicate.matches(t),
            SensorType::ImageAnalyzer,
            "repo",
        )
        .unwrap();
        assert_eq!(tag, "1.0.10");
    }

    #[test]
    fn test_image_analyzer_with_prefix() {
        let inventory = tags(&["1.1.0", "1.0.10", "1.0.9"]);
        let predicate =
            TagPredicate::new(SensorType::ImageAnalyzer, CloudRegion::Us1, Some("1.0"));
        let tag = select_tag(
            inventory,
            |t| predicate.matches(t),
            SensorType::ImageAnalyzer,
            "repo",
        )
        .unwrap();
        assert_eq!(tag, "1.0.10");
    }

    #[test]
    fn test_selection_is_deterministic() {
        let inventory = tags(&["1.0.3", "1.0.1", "1.0.2"]);
        let predicate = TagPredicate::new(SensorType::ImageAnalyzer, CloudRegion::Us1, None);
        let first = select_tag(
            inventory.clone(),
            |t| predicate.matches(t),
            SensorType::ImageAnalyzer,
            "repo",
        )
        .unwrap();
        let second = select_tag(
            inventory,
            |t| predicate.matches(t),
            SensorType::ImageAnalyzer,
            "repo",
        )
        .unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "1.0.3");
    }

    #[test]
    fn test_compare_versions_lexicographic_fallback() {
        // Semantic order only when both sides parse
        assert_eq!(compare_versions("1.0.10", "1.0.9"), Ordering::Greater);
        assert_eq!(compare_versions("v1.5.0", "1.10.0"), Ordering::Less);
        // Otherwise the raw strings decide
        assert_eq!(compare_versions("2.0", "1.0.10"), Ordering::Greater);
        assert_eq!(compare_versions("10", "9.0.0"), Ordering::Less);
        assert_eq!(compare_versions("alpha", "zeta"), Ordering::Less);
    }

    #[test]
    fn test_image_analyzer_unparsed_tag_sorted_lexicographically() {
        let inventory = tags(&["1.0.10", "2.0"]);
        let predicate = TagPredicate::new(SensorType::ImageAnalyzer, CloudRegion::Us1, None);
        let tag = select_tag(
            inventory,
            |t| predicate.matches(t),
            SensorType::ImageAnalyzer,
            "repo",
        )
        .unwrap();
        assert_eq!(tag, "2.0");
    }

    #[test]
    fn test_sort_by_version_with_intransitive_inputs() {
        // 2.0.0 < 10.0.0 semantically, but "15" sits between them lexicographically
        let inventory = tags(&["2.0.0", "15", "10.0.0", "1.0.0"]);
        let first = sort_by_version(&inventory);
        let second = sort_by_version(&inventory);
        assert_eq!(first, second);
        assert_eq!(first.len(), inventory.len());
        assert_eq!(first[0], "1.0.0");
    }

    #[test]
    fn test_predicate_requires_leading_digit() {
        let predicate = TagPredicate::new(SensorType::Sidecar, CloudRegion::Us1, None);
        assert!(!predicate.matches("latest.container.x86_64"));
        assert!(!predicate.matches(""));
        assert!(predicate.matches("6.31.0-200.container.x86_64"));
    }

    #[test]
    fn test_predicate_markers_per_sensor() {
        let node = TagPredicate::new(SensorType::Node, CloudRegion::Us1, None);
        assert!(node.matches("7.0.0-1.falcon-linux.x86_64"));
        assert!(!node.matches("6.31.0-200.container.x86_64"));

        let regioned = TagPredicate::new(SensorType::RegionedSidecar, CloudRegion::Eu1, None);
        assert!(regioned.matches("7.10.0-5000.container.x86_64.Release.EU-1"));
        assert!(!regioned.matches("7.10.0-5000.container.x86_64.Release.US-1"));

        let admission = TagPredicate::new(SensorType::Admission, CloudRegion::Us1, Some("7.18"));
        assert!(admission.matches("7.18.0-1603.Release"));
        assert!(!admission.matches("7.17.0-1500.Release"));
    }

    #[test]
    fn test_image_analyzer_rejects_platform_tags() {
        let iar = TagPredicate::new(SensorType::ImageAnalyzer, CloudRegion::Us1, None);
        assert!(iar.matches("1.0.10"));
        assert!(iar.matches("2.0"));
        assert!(iar.matches("1.0.10-3"));
        assert!(!iar.matches("6.31.0-200.container.x86_64"));
        assert!(!iar.matches("7.0.0-1.falcon-linux.x86_64"));
        assert!(!iar.matches("7.18.0-1603.Release"));
        assert!(!iar.matches("10"));
    }
}
