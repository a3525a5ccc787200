use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder shown when roster or schema metadata cannot be resolved.
pub const NOT_SPECIFIED: &str = "not specified";

/// Identifier wrapper for persisted reviews.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewId(pub String);

impl ReviewId {
    pub fn generate() -> Self {
        Self(format!("rev-{}", Uuid::new_v4().simple()))
    }
}

/// Identifier wrapper for survey definitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurveyId(pub String);

impl SurveyId {
    pub fn generate() -> Self {
        Self(format!("srv-{}", Uuid::new_v4().simple()))
    }
}

/// Identifier wrapper for roster branches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchId(pub String);

impl BranchId {
    pub fn generate() -> Self {
        Self(format!("br-{}", Uuid::new_v4().simple()))
    }
}

/// Question kinds a survey can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    #[serde(rename = "free-text")]
    FreeText,
    #[serde(rename = "rating-1-5")]
    Rating,
    #[serde(rename = "status-ok")]
    Status,
    #[serde(rename = "group-title")]
    GroupTitle,
}

impl ItemType {
    pub const fn label(self) -> &'static str {
        match self {
            ItemType::FreeText => "free-text",
            ItemType::Rating => "rating-1-5",
            ItemType::Status => "status-ok",
            ItemType::GroupTitle => "group-title",
        }
    }

    /// Group titles are structural headings and never receive a score.
    pub const fn is_scored(self) -> bool {
        !matches!(self, ItemType::GroupTitle)
    }
}

/// One item of a survey schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub item_name: String,
    pub item_type: ItemType,
    pub question_text: String,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtopic: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Named questionnaire reused across reviews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyDefinition {
    pub id: SurveyId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<QuestionSpec>,
}

impl SurveyDefinition {
    pub fn scored_question_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|question| question.item_type.is_scored())
            .count()
    }
}

/// Tri-state answer for `status-ok` questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusToken {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "partial")]
    Partial,
    #[serde(rename = "not-ok")]
    NotOk,
}

impl StatusToken {
    pub const fn score(self) -> u8 {
        match self {
            StatusToken::Ok => 5,
            StatusToken::Partial => 3,
            StatusToken::NotOk => 1,
        }
    }

    pub const fn token(self) -> &'static str {
        match self {
            StatusToken::Ok => "ok",
            StatusToken::Partial => "partial",
            StatusToken::NotOk => "not-ok",
        }
    }

    /// Label shown to reviewers.
    pub const fn label(self) -> &'static str {
        match self {
            StatusToken::Ok => "תקין",
            StatusToken::Partial => "חלקי",
            StatusToken::NotOk => "לא תקין",
        }
    }

    /// Accepts either the wire token or the displayed label.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        [StatusToken::Ok, StatusToken::Partial, StatusToken::NotOk]
            .into_iter()
            .find(|status| {
                status.token().eq_ignore_ascii_case(trimmed) || status.label() == trimmed
            })
    }
}

/// Stored answer, keyed by the question's item type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Answer {
    FreeText { text: String, score: u8 },
    Rating { score: u8 },
    Status { token: StatusToken, score: u8 },
    Unanswered,
    Heading,
}

impl Answer {
    /// Zero means "not answered"; every answered question scores at least 1.
    pub const fn score(&self) -> u8 {
        match self {
            Answer::FreeText { score, .. }
            | Answer::Rating { score }
            | Answer::Status { score, .. } => *score,
            Answer::Unanswered | Answer::Heading => 0,
        }
    }

    pub fn display_value(&self) -> String {
        match self {
            Answer::FreeText { text, score } => format!("{text} ({score}/5)"),
            Answer::Rating { score } => format!("{score}/5"),
            Answer::Status { token, .. } => token.label().to_string(),
            Answer::Unanswered => NOT_SPECIFIED.to_string(),
            Answer::Heading => String::new(),
        }
    }
}

/// Scored answer attached to a single review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_index: usize,
    pub item_name: String,
    pub item_type: ItemType,
    pub question_text: String,
    #[serde(default)]
    pub topic: String,
    pub answer: Answer,
}

impl AnswerRecord {
    pub const fn score(&self) -> u8 {
        self.answer.score()
    }
}

/// Aggregate fields folded from a review's answers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub total_score: u32,
    pub average_score: f64,
    pub answered_questions: usize,
    pub total_questions: usize,
}

/// Persisted review of one branch against one survey on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: ReviewId,
    pub branch: String,
    pub survey: String,
    pub reviewer: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub manager_summary: String,
    #[serde(default)]
    pub key_strengths: String,
    #[serde(default)]
    pub areas_for_improvement: String,
    #[serde(default)]
    pub questions: Vec<AnswerRecord>,
    #[serde(flatten)]
    pub summary: ScoreSummary,
}

impl ReviewRecord {
    /// Mean of the scored answers carried on the record, if any.
    pub fn answer_mean(&self) -> Option<f64> {
        let scores: Vec<f64> = self
            .questions
            .iter()
            .map(AnswerRecord::score)
            .filter(|score| *score > 0)
            .map(f64::from)
            .collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        }
    }

    pub fn average_label(&self) -> String {
        format_average(self.summary.average_score)
    }
}

/// Raw answer captured for one question of a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerInput {
    pub question_index: usize,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Payload of the add-review flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSubmission {
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub survey: String,
    #[serde(default)]
    pub reviewer: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub manager_summary: String,
    #[serde(default)]
    pub key_strengths: String,
    #[serde(default)]
    pub areas_for_improvement: String,
    #[serde(default)]
    pub answers: Vec<AnswerInput>,
}

/// Payload of the edit-review flow. The survey of a stored review is fixed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEdit {
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub reviewer: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub manager_summary: String,
    #[serde(default)]
    pub key_strengths: String,
    #[serde(default)]
    pub areas_for_improvement: String,
    #[serde(default)]
    pub answers: Vec<AnswerInput>,
}

/// Roster entry for a reviewed branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    #[serde(default)]
    pub manager: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub address: String,
}

/// Branch fields supplied by callers before an id is assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchDraft {
    pub name: String,
    #[serde(default)]
    pub manager: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub address: String,
}

/// Survey fields supplied by callers before an id is assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Question fields supplied by the question editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    #[serde(default)]
    pub item_name: String,
    pub item_type: ItemType,
    pub question_text: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub subtopic: Option<String>,
}

/// Averages are stored unrounded and shown with one decimal.
pub fn format_average(value: f64) -> String {
    format!("{value:.1}")
}

/// Empty roster fields render as the shared placeholder.
pub fn or_not_specified(value: &str) -> &str {
    if value.trim().is_empty() {
        NOT_SPECIFIED
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tokens_map_to_fixed_scores() {
        assert_eq!(StatusToken::Ok.score(), 5);
        assert_eq!(StatusToken::Partial.score(), 3);
        assert_eq!(StatusToken::NotOk.score(), 1);
    }

    #[test]
    fn status_parse_accepts_tokens_and_labels() {
        assert_eq!(StatusToken::parse("partial"), Some(StatusToken::Partial));
        assert_eq!(StatusToken::parse(" NOT-OK "), Some(StatusToken::NotOk));
        assert_eq!(StatusToken::parse("תקין"), Some(StatusToken::Ok));
        assert_eq!(StatusToken::parse("לא תקין"), Some(StatusToken::NotOk));
        assert_eq!(StatusToken::parse("maybe"), None);
    }

    #[test]
    fn answer_serializes_with_kind_tag() {
        let answer = Answer::Status {
            token: StatusToken::Partial,
            score: 3,
        };
        let json = serde_json::to_value(&answer).expect("serializes");
        assert_eq!(json["kind"], "status");
        assert_eq!(json["token"], "partial");
        assert_eq!(json["score"], 3);
    }

    #[test]
    fn item_type_uses_schema_names() {
        let json = serde_json::to_string(&ItemType::Rating).expect("serializes");
        assert_eq!(json, "\"rating-1-5\"");
        let parsed: ItemType = serde_json::from_str("\"group-title\"").expect("parses");
        assert_eq!(parsed, ItemType::GroupTitle);
    }

    #[test]
    fn placeholders_fill_blank_fields() {
        assert_eq!(or_not_specified("  "), NOT_SPECIFIED);
        assert_eq!(or_not_specified("Dana"), "Dana");
        assert_eq!(format_average(3.449), "3.4");
    }
}
