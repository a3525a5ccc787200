use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use super::rules::AnswerProblem;

/// Header fields every review must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    Branch,
    Survey,
    Reviewer,
    Date,
}

impl RequiredField {
    pub const fn label(self) -> &'static str {
        match self {
            RequiredField::Branch => "branch",
            RequiredField::Survey => "survey type",
            RequiredField::Reviewer => "reviewer name",
            RequiredField::Date => "review date",
        }
    }
}

/// One reason a review cannot be saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    MissingField {
        field: RequiredField,
    },
    InvalidDate {
        value: String,
    },
    UnknownSurvey {
        name: String,
    },
    Answer {
        question_index: usize,
        item_name: String,
        problem: AnswerProblem,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingField { field } => write!(f, "{} is required", field.label()),
            Violation::InvalidDate { value } => {
                write!(f, "review date '{value}' must be YYYY-MM-DD")
            }
            Violation::UnknownSurvey { name } => write!(f, "survey '{name}' does not exist"),
            Violation::Answer {
                question_index,
                item_name,
                problem,
            } => write!(
                f,
                "question {} ({}): {}",
                question_index + 1,
                item_name,
                problem
            ),
        }
    }
}

/// Every violation found while validating a review, reported together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("review cannot be saved: {}", joined(.violations))]
pub struct ReviewValidationError {
    pub violations: Vec<Violation>,
}

fn joined(violations: &[Violation]) -> String {
    let details: Vec<String> = violations.iter().map(Violation::to_string).collect();
    details.join("; ")
}

/// Collects violations so the caller can report all of them at once.
#[derive(Debug, Default)]
pub(crate) struct ViolationCollector {
    violations: Vec<Violation>,
}

impl ViolationCollector {
    pub(crate) fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub(crate) fn require(&mut self, field: RequiredField, value: &str) {
        if value.trim().is_empty() {
            self.push(Violation::MissingField { field });
        }
    }

    /// Returns the parsed date, recording a violation when absent or malformed.
    pub(crate) fn require_date(&mut self, raw: &str) -> Option<NaiveDate> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.push(Violation::MissingField {
                field: RequiredField::Date,
            });
            return None;
        }

        match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                self.push(Violation::InvalidDate {
                    value: trimmed.to_string(),
                });
                None
            }
        }
    }

    pub(crate) fn finish(self) -> Result<(), ReviewValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ReviewValidationError {
                violations: self.violations,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_reports_every_missing_field() {
        let mut collector = ViolationCollector::default();
        collector.require(RequiredField::Branch, "");
        collector.require(RequiredField::Reviewer, "  ");
        collector.require(RequiredField::Survey, "Service Quality");
        assert!(collector.require_date("").is_none());

        let error = collector.finish().expect_err("violations recorded");
        assert_eq!(error.violations.len(), 3);
        let message = error.to_string();
        assert!(message.contains("branch is required"));
        assert!(message.contains("reviewer name is required"));
        assert!(message.contains("review date is required"));
    }

    #[test]
    fn malformed_dates_are_reported() {
        let mut collector = ViolationCollector::default();
        assert!(collector.require_date("17/10/2026").is_none());
        assert_eq!(
            collector.finish(),
            Err(ReviewValidationError {
                violations: vec![Violation::InvalidDate {
                    value: "17/10/2026".to_string()
                }]
            })
        );
    }

    #[test]
    fn answer_violations_use_one_based_positions() {
        let violation = Violation::Answer {
            question_index: 2,
            item_name: "cleanliness".to_string(),
            problem: AnswerProblem::MissingRating,
        };
        assert_eq!(
            violation.to_string(),
            "question 3 (cleanliness): a 1-5 rating is required"
        );
    }
}
