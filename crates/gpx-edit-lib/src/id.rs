//! Entity identifiers
//!
//! Parsed entities get ids derived from their structural position, entities created
//! during editing get ids from a monotonic per-document counter. The two schemes
//! never overlap because counter ids always carry a `new` token.

use std::fmt;

/// Stable identifier of a waypoint, track, segment or track point
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EntityId(String);

impl EntityId {
    /// Id of the `index`-th parsed waypoint
    pub fn waypoint(index: usize) -> Self {
        Self(format!("wpt-{index}"))
    }

    /// Id of the `track`-th parsed track
    pub fn track(track: usize) -> Self {
        Self(format!("trk-{track}"))
    }

    /// Id of a parsed segment
    pub fn segment(track: usize, segment: usize) -> Self {
        Self(format!("trk-{track}-seg-{segment}"))
    }

    /// Id of a parsed track point
    pub fn track_point(track: usize, segment: usize, point: usize) -> Self {
        Self(format!("trk-{track}-seg-{segment}-pt-{point}"))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Monotonic source of ids for interactively created entities
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct IdSequence {
    next: u64,
}

impl IdSequence {
    fn bump(&mut self) -> u64 {
        let n = self.next;
        self.next += 1;
        n
    }

    pub(crate) fn waypoint(&mut self) -> EntityId {
        EntityId(format!("wpt-new-{}", self.bump()))
    }

    pub(crate) fn track(&mut self) -> EntityId {
        EntityId(format!("trk-new-{}", self.bump()))
    }

    pub(crate) fn segment(&mut self, track: &EntityId) -> EntityId {
        EntityId(format!("{track}-seg-new-{}", self.bump()))
    }

    pub(crate) fn track_point(&mut self, segment: &EntityId) -> EntityId {
        EntityId(format!("{segment}-pt-new-{}", self.bump()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_structural_ids() {
        assert_eq!(EntityId::waypoint(0).as_str(), "wpt-0");
        assert_eq!(EntityId::track(2).as_str(), "trk-2");
        assert_eq!(EntityId::segment(2, 1).as_str(), "trk-2-seg-1");
        assert_eq!(EntityId::track_point(2, 1, 7).as_str(), "trk-2-seg-1-pt-7");
    }

    #[test]
    fn test_sequence_never_repeats() {
        let mut ids = IdSequence::default();
        let track = ids.track();
        let segment = ids.segment(&track);

        let mut seen = HashSet::new();
        seen.insert(track.clone());
        seen.insert(segment.clone());
        for _ in 0..100 {
            assert!(seen.insert(ids.waypoint()));
            assert!(seen.insert(ids.track_point(&segment)));
        }
    }

    #[test]
    fn test_sequence_is_disjoint_from_parsed_ids() {
        let mut ids = IdSequence::default();
        let track = ids.track();
        assert_eq!(track.as_str(), "trk-new-0");
        assert_ne!(track, EntityId::track(0));

        let segment = ids.segment(&EntityId::track(0));
        assert_eq!(segment.as_str(), "trk-0-seg-new-1");
        assert_ne!(segment, EntityId::segment(0, 1));
    }
}
