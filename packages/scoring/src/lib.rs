#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Safety scoring functions shared by all city adapters.
//!
//! Converts annual crime density (incidents per km²) into a 1-10 safety
//! score via fixed breakpoints, and rescaled 0-100 scores into letter
//! grades. All functions are pure and total.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Letter grade for a 0-100 safety score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Grade {
    /// 85 and above.
    A,
    /// 70 to 84.
    B,
    /// 55 to 69.
    C,
    /// Below 55.
    D,
}

/// Converts annual crime density (incidents per km²) into a 1-10 safety
/// score. Higher density yields a lower score.
///
/// The breakpoints are tuning constants shared by every city; per-city
/// variation lives in the adapters (fallback scores, TTLs), not here.
#[must_use]
pub fn density_to_safety_score(density: f64) -> u8 {
    if density <= 50.0 {
        10
    } else if density <= 100.0 {
        9
    } else if density <= 200.0 {
        8
    } else if density <= 400.0 {
        7
    } else if density <= 800.0 {
        6
    } else if density <= 1200.0 {
        5
    } else if density <= 1600.0 {
        4
    } else if density <= 2000.0 {
        3
    } else if density <= 2500.0 {
        2
    } else {
        1
    }
}

/// Maps a 0-100 score to a letter grade.
#[must_use]
pub const fn score_to_grade(score100: u8) -> Grade {
    if score100 >= 85 {
        Grade::A
    } else if score100 >= 70 {
        Grade::B
    } else if score100 >= 55 {
        Grade::C
    } else {
        Grade::D
    }
}

/// Rescales a 1-10 safety score to the 0-100 range used by the API.
#[must_use]
pub const fn scale_to_100(safety_score10: u8) -> u8 {
    safety_score10 * 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_breakpoints() {
        assert_eq!(density_to_safety_score(0.0), 10);
        assert_eq!(density_to_safety_score(50.0), 10);
        assert_eq!(density_to_safety_score(50.1), 9);
        assert_eq!(density_to_safety_score(100.0), 9);
        assert_eq!(density_to_safety_score(200.0), 8);
        assert_eq!(density_to_safety_score(400.0), 7);
        assert_eq!(density_to_safety_score(800.0), 6);
        assert_eq!(density_to_safety_score(1200.0), 5);
        assert_eq!(density_to_safety_score(1600.0), 4);
        assert_eq!(density_to_safety_score(2000.0), 3);
        assert_eq!(density_to_safety_score(2500.0), 2);
        assert_eq!(density_to_safety_score(2500.1), 1);
        assert_eq!(density_to_safety_score(1.0e9), 1);
    }

    #[test]
    fn density_score_is_monotone_non_increasing() {
        let mut prev = 10;
        for step in 0..=30_000 {
            let density = f64::from(step) * 0.1;
            let score = density_to_safety_score(density);
            assert!((1..=10).contains(&score), "score {score} out of range");
            assert!(
                score <= prev,
                "score increased from {prev} to {score} at density {density}"
            );
            prev = score;
        }
    }

    #[test]
    fn grade_boundaries() {
        assert_eq!(score_to_grade(100), Grade::A);
        assert_eq!(score_to_grade(85), Grade::A);
        assert_eq!(score_to_grade(84), Grade::B);
        assert_eq!(score_to_grade(70), Grade::B);
        assert_eq!(score_to_grade(69), Grade::C);
        assert_eq!(score_to_grade(55), Grade::C);
        assert_eq!(score_to_grade(54), Grade::D);
        assert_eq!(score_to_grade(0), Grade::D);
    }

    #[test]
    fn grade_serializes_as_bare_letter() {
        assert_eq!(serde_json::to_string(&Grade::A).unwrap(), "\"A\"");
        assert_eq!(Grade::B.to_string(), "B");
    }

    #[test]
    fn low_density_area_scores_grade_a() {
        // 40 crimes in 1 km² -> density 40 -> score 10 -> 100 -> A
        let score10 = density_to_safety_score(40.0 / 1.0);
        assert_eq!(score10, 10);
        let score100 = scale_to_100(score10);
        assert_eq!(score100, 100);
        assert_eq!(score_to_grade(score100), Grade::A);
    }

    #[test]
    fn high_density_area_scores_grade_d() {
        // 1800 crimes in 1 km² -> density 1800 -> score 4 -> 40 -> D
        let score10 = density_to_safety_score(1800.0 / 1.0);
        assert_eq!(score10, 4);
        let score100 = scale_to_100(score10);
        assert_eq!(score100, 40);
        assert_eq!(score_to_grade(score100), Grade::D);
    }
}
