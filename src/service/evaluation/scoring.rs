//! Score aggregation

use crate::model::{CriteriaScores, Grade};

/// Minimum overall score counted as a pass
pub const PASS_THRESHOLD: u8 = 75;

/// Aggregated outcome of a set of criterion scores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregate {
    pub overall: u8,
    pub passed: bool,
    pub grade: Grade,
}

/// Floor-average the criterion scores and derive pass flag and grade
pub fn aggregate(criteria: &CriteriaScores) -> Aggregate {
    let overall = if criteria.is_empty() {
        0
    } else {
        let sum: u32 = criteria.values().map(|&s| u32::from(s.min(100))).sum();
        // Each score is at most 100, so the average fits in a u8
        (sum / criteria.len() as u32) as u8
    };

    Aggregate {
        overall,
        passed: overall >= PASS_THRESHOLD,
        grade: grade_for(overall),
    }
}

pub fn grade_for(overall: u8) -> Grade {
    match overall {
        90.. => Grade::A,
        80..=89 => Grade::B,
        70..=79 => Grade::C,
        60..=69 => Grade::D,
        _ => Grade::F,
    }
}
