use serde::Serialize;

use super::domain::{ReviewId, ReviewRecord, SurveyDefinition};

/// Review selected for viewing or editing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentReview {
    pub review_id: ReviewId,
    pub record: ReviewRecord,
}

/// Single-slot mailbox: selecting a review replaces whatever was selected before.
#[derive(Debug, Clone, Default)]
pub struct ReviewMailbox {
    current: Option<CurrentReview>,
}

impl ReviewMailbox {
    pub fn select(&mut self, record: ReviewRecord) -> Option<CurrentReview> {
        let current = CurrentReview {
            review_id: record.id.clone(),
            record,
        };
        self.current.replace(current)
    }

    pub fn peek(&self) -> Option<&CurrentReview> {
        self.current.as_ref()
    }

    pub fn take(&mut self) -> Option<CurrentReview> {
        self.current.take()
    }
}

/// Resolve which survey the question editor should open.
///
/// A `survey=<name>` query parameter wins when it names an existing survey;
/// otherwise the stored editing index is used.
pub fn resolve_editor_target<'a>(
    surveys: &'a [SurveyDefinition],
    query_name: Option<&str>,
    stored_index: Option<usize>,
) -> Option<&'a SurveyDefinition> {
    let from_query = query_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .and_then(|name| surveys.iter().find(|survey| survey.name == name));

    from_query.or_else(|| stored_index.and_then(|index| surveys.get(index)))
}
