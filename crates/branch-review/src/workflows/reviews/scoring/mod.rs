mod rules;
mod validation;

pub use rules::AnswerProblem;
pub use validation::{RequiredField, ReviewValidationError, Violation};

use super::domain::{
    Answer, AnswerInput, AnswerRecord, ItemType, ReviewEdit, ReviewId, ReviewRecord,
    ReviewSubmission, ScoreSummary, SurveyDefinition, NOT_SPECIFIED,
};
use serde::Serialize;
use validation::ViolationCollector;

/// Stateless scorer turning raw answers into scored review records.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewScorer;

impl ReviewScorer {
    pub fn new() -> Self {
        Self
    }

    /// Validate and score a new review. A `None` survey means the named
    /// survey type could not be resolved.
    pub fn score_submission(
        &self,
        survey: Option<&SurveyDefinition>,
        submission: &ReviewSubmission,
        id: ReviewId,
    ) -> Result<ReviewRecord, ReviewValidationError> {
        let mut collector = ViolationCollector::default();
        collector.require(RequiredField::Branch, &submission.branch);
        collector.require(RequiredField::Survey, &submission.survey);
        collector.require(RequiredField::Reviewer, &submission.reviewer);
        let date = collector.require_date(&submission.date);

        let questions = match survey {
            Some(survey) => {
                let templates = survey
                    .questions
                    .iter()
                    .enumerate()
                    .map(|(index, question)| QuestionTemplate {
                        index,
                        item_name: &question.item_name,
                        item_type: question.item_type,
                        question_text: &question.question_text,
                        topic: &question.topic,
                    });
                score_questions(templates, &submission.answers, &mut collector)
            }
            None => {
                if !submission.survey.trim().is_empty() {
                    collector.push(Violation::UnknownSurvey {
                        name: submission.survey.trim().to_string(),
                    });
                }
                Vec::new()
            }
        };

        collector.finish()?;
        let date = date.ok_or_else(missing_date)?;
        let summary = summarize(&questions, survey.map(SurveyDefinition::scored_question_count));

        Ok(ReviewRecord {
            id,
            branch: submission.branch.trim().to_string(),
            survey: submission.survey.trim().to_string(),
            reviewer: submission.reviewer.trim().to_string(),
            date,
            manager_summary: submission.manager_summary.clone(),
            key_strengths: submission.key_strengths.clone(),
            areas_for_improvement: submission.areas_for_improvement.clone(),
            questions,
            summary,
        })
    }

    /// Re-derive every answer of a stored review from re-selected input.
    ///
    /// Answers are re-scored against the question list stored on the record,
    /// so an edit still works after its survey was deleted or changed.
    pub fn rescore_edit(
        &self,
        record: &ReviewRecord,
        edit: &ReviewEdit,
        survey: Option<&SurveyDefinition>,
    ) -> Result<ReviewRecord, ReviewValidationError> {
        let mut collector = ViolationCollector::default();
        collector.require(RequiredField::Branch, &edit.branch);
        collector.require(RequiredField::Reviewer, &edit.reviewer);
        let date = collector.require_date(&edit.date);

        let templates = record.questions.iter().map(|answer| QuestionTemplate {
            index: answer.question_index,
            item_name: &answer.item_name,
            item_type: answer.item_type,
            question_text: &answer.question_text,
            topic: &answer.topic,
        });
        let questions = score_questions(templates, &edit.answers, &mut collector);

        collector.finish()?;
        let date = date.ok_or_else(missing_date)?;
        let summary = summarize(&questions, survey.map(SurveyDefinition::scored_question_count));

        Ok(ReviewRecord {
            id: record.id.clone(),
            branch: edit.branch.trim().to_string(),
            survey: record.survey.clone(),
            reviewer: edit.reviewer.trim().to_string(),
            date,
            manager_summary: edit.manager_summary.clone(),
            key_strengths: edit.key_strengths.clone(),
            areas_for_improvement: edit.areas_for_improvement.clone(),
            questions,
            summary,
        })
    }
}

struct QuestionTemplate<'a> {
    index: usize,
    item_name: &'a str,
    item_type: ItemType,
    question_text: &'a str,
    topic: &'a str,
}

fn score_questions<'a>(
    templates: impl Iterator<Item = QuestionTemplate<'a>>,
    answers: &[AnswerInput],
    collector: &mut ViolationCollector,
) -> Vec<AnswerRecord> {
    templates
        .map(|template| {
            let input = answers
                .iter()
                .find(|answer| answer.question_index == template.index);
            let answer = match rules::score_answer(template.item_type, input) {
                Ok(answer) => answer,
                Err(problem) => {
                    collector.push(Violation::Answer {
                        question_index: template.index,
                        item_name: template.item_name.to_string(),
                        problem,
                    });
                    Answer::Unanswered
                }
            };

            AnswerRecord {
                question_index: template.index,
                item_name: template.item_name.to_string(),
                item_type: template.item_type,
                question_text: template.question_text.to_string(),
                topic: template.topic.to_string(),
                answer,
            }
        })
        .collect()
}

fn missing_date() -> ReviewValidationError {
    ReviewValidationError {
        violations: vec![Violation::MissingField {
            field: RequiredField::Date,
        }],
    }
}

/// Fold answer records into the stored summary fields.
///
/// `schema_questions` is the non-heading count of the originating survey; when
/// the survey cannot be resolved the count of scorable answers is used instead.
pub fn summarize(questions: &[AnswerRecord], schema_questions: Option<usize>) -> ScoreSummary {
    let (total_score, answered_questions) = questions
        .iter()
        .map(AnswerRecord::score)
        .filter(|score| *score > 0)
        .fold((0u32, 0usize), |(total, count), score| {
            (total + u32::from(score), count + 1)
        });

    let average_score = if answered_questions > 0 {
        f64::from(total_score) / answered_questions as f64
    } else {
        0.0
    };

    let total_questions = schema_questions.unwrap_or_else(|| {
        questions
            .iter()
            .filter(|question| question.item_type.is_scored())
            .count()
    });

    ScoreSummary {
        total_score,
        average_score,
        answered_questions,
        total_questions,
    }
}

/// Average of the scored answers sharing one topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicScore {
    pub topic: String,
    pub average: f64,
    pub answered: usize,
}

/// Per-topic breakdown in order of first appearance on the review.
pub fn topic_breakdown(record: &ReviewRecord) -> Vec<TopicScore> {
    let mut buckets: Vec<(String, u32, usize)> = Vec::new();
    for answer in record.questions.iter().filter(|answer| answer.score() > 0) {
        let topic = if answer.topic.trim().is_empty() {
            NOT_SPECIFIED
        } else {
            answer.topic.trim()
        };
        match buckets.iter_mut().find(|(name, _, _)| name == topic) {
            Some((_, total, count)) => {
                *total += u32::from(answer.score());
                *count += 1;
            }
            None => buckets.push((topic.to_string(), u32::from(answer.score()), 1)),
        }
    }

    buckets
        .into_iter()
        .map(|(topic, total, answered)| TopicScore {
            topic,
            average: f64::from(total) / answered as f64,
            answered,
        })
        .collect()
}
