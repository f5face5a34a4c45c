//! Human label bands for a composite score.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreGrade {
    Excellent,
    VeryGood,
    Good,
    Fair,
    Low,
}

impl ScoreGrade {
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            ScoreGrade::Excellent
        } else if score >= 55.0 {
            ScoreGrade::VeryGood
        } else if score >= 40.0 {
            ScoreGrade::Good
        } else if score >= 25.0 {
            ScoreGrade::Fair
        } else {
            ScoreGrade::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreGrade::Excellent => "Excellent",
            ScoreGrade::VeryGood => "Very Good",
            ScoreGrade::Good => "Good",
            ScoreGrade::Fair => "Fair",
            ScoreGrade::Low => "Low",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ScoreGrade::Excellent => "Exceptional performance - high engagement and reach",
            ScoreGrade::VeryGood => "Above average - good audience engagement",
            ScoreGrade::Good => "Adequate performance - within expectations",
            ScoreGrade::Fair => "Below average - engagement could improve",
            ScoreGrade::Low => "Needs attention - low engagement",
        }
    }
}
