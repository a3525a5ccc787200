use serde::Serialize;

use super::super::domain::{Answer, AnswerInput, ItemType, StatusToken};

const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Reason a single question does not count as answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "problem", rename_all = "snake_case")]
pub enum AnswerProblem {
    #[error("no answer selected")]
    NotAnswered,
    #[error("free text is required")]
    MissingText,
    #[error("a 1-5 rating is required")]
    MissingRating,
    #[error("rating {rating} is outside 1-5")]
    RatingOutOfRange { rating: u8 },
    #[error("'{value}' is not one of ok / partial / not-ok")]
    UnknownStatus { value: String },
}

/// Maps an item type and the reviewer's raw input to a stored answer.
pub(crate) fn score_answer(
    item_type: ItemType,
    input: Option<&AnswerInput>,
) -> Result<Answer, AnswerProblem> {
    if item_type == ItemType::GroupTitle {
        return Ok(Answer::Heading);
    }

    let Some(input) = input else {
        return Err(AnswerProblem::NotAnswered);
    };

    match item_type {
        ItemType::FreeText => {
            let text = input
                .text
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty());
            match (text, input.rating) {
                (None, None) => Err(AnswerProblem::NotAnswered),
                (None, Some(_)) => Err(AnswerProblem::MissingText),
                (Some(_), None) => Err(AnswerProblem::MissingRating),
                (Some(text), Some(rating)) => {
                    let score = checked_rating(rating)?;
                    Ok(Answer::FreeText {
                        text: text.to_string(),
                        score,
                    })
                }
            }
        }
        ItemType::Rating => match input.rating {
            Some(rating) => Ok(Answer::Rating {
                score: checked_rating(rating)?,
            }),
            None => Err(AnswerProblem::NotAnswered),
        },
        ItemType::Status => match input.status.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => StatusToken::parse(raw)
                .map(|token| Answer::Status {
                    token,
                    score: token.score(),
                })
                .ok_or_else(|| AnswerProblem::UnknownStatus {
                    value: raw.to_string(),
                }),
            _ => Err(AnswerProblem::NotAnswered),
        },
        ItemType::GroupTitle => Ok(Answer::Heading),
    }
}

fn checked_rating(rating: u8) -> Result<u8, AnswerProblem> {
    if RATING_RANGE.contains(&rating) {
        Ok(rating)
    } else {
        Err(AnswerProblem::RatingOutOfRange { rating })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> AnswerInput {
        AnswerInput {
            question_index: 0,
            ..AnswerInput::default()
        }
    }

    #[test]
    fn free_text_requires_text_and_rating() {
        let text_only = AnswerInput {
            text: Some("Floor was clean".to_string()),
            ..input()
        };
        assert_eq!(
            score_answer(ItemType::FreeText, Some(&text_only)),
            Err(AnswerProblem::MissingRating)
        );

        let rating_only = AnswerInput {
            rating: Some(4),
            text: Some("   ".to_string()),
            ..input()
        };
        assert_eq!(
            score_answer(ItemType::FreeText, Some(&rating_only)),
            Err(AnswerProblem::MissingText)
        );

        let both = AnswerInput {
            text: Some(" Floor was clean ".to_string()),
            rating: Some(4),
            ..input()
        };
        assert_eq!(
            score_answer(ItemType::FreeText, Some(&both)),
            Ok(Answer::FreeText {
                text: "Floor was clean".to_string(),
                score: 4
            })
        );
    }

    #[test]
    fn rating_rejects_values_outside_scale() {
        let zero = AnswerInput {
            rating: Some(0),
            ..input()
        };
        assert_eq!(
            score_answer(ItemType::Rating, Some(&zero)),
            Err(AnswerProblem::RatingOutOfRange { rating: 0 })
        );
        let five = AnswerInput {
            rating: Some(5),
            ..input()
        };
        assert_eq!(
            score_answer(ItemType::Rating, Some(&five)),
            Ok(Answer::Rating { score: 5 })
        );
    }

    #[test]
    fn problems_read_as_reviewer_messages() {
        assert_eq!(
            AnswerProblem::RatingOutOfRange { rating: 7 }.to_string(),
            "rating 7 is outside 1-5"
        );
        assert_eq!(
            AnswerProblem::UnknownStatus {
                value: "meh".to_string()
            }
            .to_string(),
            "'meh' is not one of ok / partial / not-ok"
        );
    }

    #[test]
    fn status_scores_are_deterministic() {
        for (raw, expected) in [("ok", 5), ("partial", 3), ("not-ok", 1), ("חלקי", 3)] {
            let answer = AnswerInput {
                status: Some(raw.to_string()),
                ..input()
            };
            let first = score_answer(ItemType::Status, Some(&answer)).expect("valid status");
            let second = score_answer(ItemType::Status, Some(&answer)).expect("valid status");
            assert_eq!(first, second);
            assert_eq!(first.score(), expected);
        }
    }

    #[test]
    fn partial_status_keeps_token() {
        let answer = AnswerInput {
            status: Some("partial".to_string()),
            ..input()
        };
        let scored = score_answer(ItemType::Status, Some(&answer)).expect("valid status");
        assert_eq!(
            scored,
            Answer::Status {
                token: StatusToken::Partial,
                score: 3
            }
        );
        assert_eq!(scored.display_value(), "חלקי");
    }

    #[test]
    fn group_titles_never_need_input() {
        assert_eq!(score_answer(ItemType::GroupTitle, None), Ok(Answer::Heading));
        assert_eq!(
            score_answer(ItemType::Rating, None),
            Err(AnswerProblem::NotAnswered)
        );
    }
}
