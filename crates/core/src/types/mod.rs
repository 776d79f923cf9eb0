//! Shared type definitions and newtypes

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Experience points. Signed because admin reversals hand back negative awards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Xp(pub i64);

impl Xp {
    pub const ZERO: Xp = Xp(0);

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Clamp to zero for display totals
    pub fn non_negative(&self) -> Self {
        Xp(self.0.max(0))
    }
}

impl Add for Xp {
    type Output = Xp;

    fn add(self, rhs: Xp) -> Xp {
        Xp(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Xp {
    fn add_assign(&mut self, rhs: Xp) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl std::iter::Sum for Xp {
    fn sum<I: Iterator<Item = Xp>>(iter: I) -> Xp {
        iter.fold(Xp::ZERO, |acc, x| acc + x)
    }
}

impl std::fmt::Display for Xp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} XP", self.0)
    }
}

/// Gem currency amount
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gems(pub u32);

impl Gems {
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Identity and capability of whoever triggers an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    pub user_id: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl Caller {
    pub fn player(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_admin: false,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_admin: true,
        }
    }
}

/// Admin-only override applied to another player's quest or challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminOverride {
    /// Force completion and award XP
    Complete,
    /// Revert a completion and its XP
    Uncomplete,
    /// Remove all progress, deducting XP if it had been awarded
    Reset,
}

impl AdminOverride {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminOverride::Complete => "complete",
            AdminOverride::Uncomplete => "uncomplete",
            AdminOverride::Reset => "reset",
        }
    }
}

impl std::fmt::Display for AdminOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xp_sum_saturates() {
        let total: Xp = vec![Xp(i64::MAX), Xp(10)].into_iter().sum();
        assert_eq!(total, Xp(i64::MAX));
        assert_eq!(Xp(-5).non_negative(), Xp::ZERO);
    }
}
