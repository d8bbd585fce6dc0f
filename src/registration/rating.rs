//! Skill tiers derived from numeric ranks, and rank-band eligibility.

use serde::{Deserialize, Serialize};

use super::error::{RegistrationError, RegistrationResult};

/// Named skill band for a numeric rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Beginner,
    UpperBeginner,
    Intermediate,
    UpperIntermediate,
    Advanced,
    Pro,
}

impl Tier {
    /// Classify a numeric rank into its tier. Total over all inputs:
    /// ranks below zero clamp to Beginner, ranks past 6.0 are Pro.
    pub fn classify(rank: f64) -> Tier {
        if rank < 1.7 {
            Tier::Beginner
        } else if rank < 2.7 {
            Tier::UpperBeginner
        } else if rank < 3.5 {
            Tier::Intermediate
        } else if rank < 4.5 {
            Tier::UpperIntermediate
        } else if rank < 6.0 {
            Tier::Advanced
        } else {
            Tier::Pro
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tier::Beginner => "Beginner",
            Tier::UpperBeginner => "Upper Beginner",
            Tier::Intermediate => "Intermediate",
            Tier::UpperIntermediate => "Upper Intermediate",
            Tier::Advanced => "Advanced",
            Tier::Pro => "Pro",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive-bounds membership test against a tournament's rank band.
///
/// A band with `rank_min > rank_max` is a configuration error and fails
/// closed: nobody is eligible and the caller gets a typed error instead
/// of a silent admit-all.
pub fn is_eligible(user_rank: f64, rank_min: f64, rank_max: f64) -> RegistrationResult<bool> {
    if rank_min > rank_max {
        return Err(RegistrationError::InvalidRankBand {
            min: rank_min,
            max: rank_max,
        });
    }

    Ok(user_rank >= rank_min && user_rank <= rank_max)
}

/// Human-readable description of a rank band: the single tier name when
/// both bounds land in the same tier, otherwise `"<min> - <max>"`.
pub fn describe_range(rank_min: f64, rank_max: f64) -> String {
    let min_tier = Tier::classify(rank_min);
    let max_tier = Tier::classify(rank_max);

    if min_tier == max_tier {
        min_tier.name().to_string()
    } else {
        format!("{} - {}", min_tier.name(), max_tier.name())
    }
}
