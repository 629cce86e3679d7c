//! Nearest-speed profile selection
//!
//! An exact match wins. Otherwise the profile with the greatest calibrated
//! speed not above the request is used, and requests slower than every
//! profile fall back to the slowest one.

use galvokit_settings::{SpeedProfile, SpeedProfileSet};
use std::fmt;

/// How a profile was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// A profile is calibrated at exactly the requested speed
    Exact,
    /// Nearest calibrated speed below the request
    NearestBelow,
    /// Request is slower than every profile
    FallbackSlowest,
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::NearestBelow => write!(f, "nearest below"),
            Self::FallbackSlowest => write!(f, "fallback to slowest"),
        }
    }
}

/// Select the profile for `mark_speed`
///
/// Returns `None` only for an empty profile set.
pub fn select(mark_speed: u32, profiles: &SpeedProfileSet) -> Option<(&SpeedProfile, Selection)> {
    if let Some(profile) = profiles.get(mark_speed) {
        return Some((profile, Selection::Exact));
    }
    if let Some(profile) = profiles.at_or_below(mark_speed) {
        return Some((profile, Selection::NearestBelow));
    }
    profiles
        .slowest()
        .map(|profile| (profile, Selection::FallbackSlowest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profiles() -> SpeedProfileSet {
        SpeedProfileSet::new(vec![
            SpeedProfile::at_speed(800),
            SpeedProfile::at_speed(1250),
            SpeedProfile::at_speed(2000),
        ])
        .unwrap()
    }

    fn selected(speed: u32) -> (u32, Selection) {
        let set = profiles();
        let (profile, how) = select(speed, &set).unwrap();
        (profile.mark_speed, how)
    }

    #[test]
    fn test_exact_match() {
        assert_eq!(selected(1250), (1250, Selection::Exact));
        assert_eq!(selected(800), (800, Selection::Exact));
    }

    #[test]
    fn test_nearest_below() {
        assert_eq!(selected(1500), (1250, Selection::NearestBelow));
        assert_eq!(selected(1999), (1250, Selection::NearestBelow));
        assert_eq!(selected(5000), (2000, Selection::NearestBelow));
    }

    #[test]
    fn test_fallback_slowest() {
        assert_eq!(selected(500), (800, Selection::FallbackSlowest));
        assert_eq!(selected(0), (800, Selection::FallbackSlowest));
    }
}
