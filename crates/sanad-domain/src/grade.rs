//! Grade module - the ordinal trust grade assigned to a claim

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Ordinal trust grade
///
/// Grades form a total order `A > B > C > D`. `D` is the floor: nothing is
/// graded below it, and any FATAL defect pins a claim there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    /// Highest trust
    A,
    /// Good trust
    B,
    /// Weak trust
    C,
    /// Lowest trust
    D,
}

impl Grade {
    /// All grades, best first
    pub const ALL: [Grade; 4] = [Grade::A, Grade::B, Grade::C, Grade::D];

    /// Numeric strength of the grade (A = 3, D = 0)
    pub fn rank(&self) -> u8 {
        match self {
            Grade::A => 3,
            Grade::B => 2,
            Grade::C => 1,
            Grade::D => 0,
        }
    }

    /// Get the grade as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        }
    }

    /// Parse a grade from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "A" => Some(Grade::A),
            "B" => Some(Grade::B),
            "C" => Some(Grade::C),
            "D" => Some(Grade::D),
            _ => None,
        }
    }

    /// One level down, floored at D
    pub fn downgrade(self) -> Self {
        match self {
            Grade::A => Grade::B,
            Grade::B => Grade::C,
            Grade::C | Grade::D => Grade::D,
        }
    }

    /// One level up, capped at A
    pub fn upgrade(self) -> Self {
        match self {
            Grade::A | Grade::B => Grade::A,
            Grade::C => Grade::B,
            Grade::D => Grade::C,
        }
    }

    /// Whether this grade is at or below `cap`
    pub fn is_at_or_below(&self, cap: Grade) -> bool {
        *self <= cap
    }
}

impl PartialOrd for Grade {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Grade {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid grade: {}", s))
    }
}
