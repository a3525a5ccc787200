use chrono::Utc;

use super::domain::{QuestionDraft, QuestionSpec, SurveyDefinition, SurveyDraft, SurveyId};
use super::repository::Topic;

/// Errors raised while editing surveys, topics or the branch roster.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("'{0}' already exists")]
    DuplicateName(String),
    #[error("survey not found")]
    SurveyNotFound,
    #[error("branch not found")]
    BranchNotFound,
    #[error("question text must not be empty")]
    EmptyQuestion,
    #[error("question {index} is out of range (survey has {len} questions)")]
    QuestionOutOfRange { index: usize, len: usize },
    #[error("topic '{0}' not found")]
    TopicNotFound(String),
}

/// In-memory view over the stored survey collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveyCatalog {
    surveys: Vec<SurveyDefinition>,
}

impl SurveyCatalog {
    pub fn new(surveys: Vec<SurveyDefinition>) -> Self {
        Self { surveys }
    }

    pub fn surveys(&self) -> &[SurveyDefinition] {
        &self.surveys
    }

    pub fn into_surveys(self) -> Vec<SurveyDefinition> {
        self.surveys
    }

    pub fn get(&self, id: &SurveyId) -> Option<&SurveyDefinition> {
        self.surveys.iter().find(|survey| &survey.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&SurveyDefinition> {
        let name = name.trim();
        self.surveys.iter().find(|survey| survey.name == name)
    }

    pub fn create(&mut self, draft: SurveyDraft) -> Result<&SurveyDefinition, CatalogError> {
        let name = self.available_name(&draft.name, None)?;
        self.surveys.push(SurveyDefinition {
            id: SurveyId::generate(),
            name,
            description: draft.description.trim().to_string(),
            questions: Vec::new(),
        });
        Ok(&self.surveys[self.surveys.len() - 1])
    }

    /// Renaming does not touch reviews that reference the old name.
    pub fn rename(&mut self, id: &SurveyId, new_name: &str) -> Result<(), CatalogError> {
        let name = self.available_name(new_name, Some(id))?;
        self.survey_mut(id)?.name = name;
        Ok(())
    }

    pub fn remove(&mut self, id: &SurveyId) -> Result<SurveyDefinition, CatalogError> {
        let position = self
            .surveys
            .iter()
            .position(|survey| &survey.id == id)
            .ok_or(CatalogError::SurveyNotFound)?;
        Ok(self.surveys.remove(position))
    }

    pub fn add_question(
        &mut self,
        id: &SurveyId,
        draft: QuestionDraft,
    ) -> Result<&QuestionSpec, CatalogError> {
        let survey = self.survey_mut(id)?;
        let question = question_from_draft(draft, survey.questions.len())?;
        survey.questions.push(question);
        Ok(&survey.questions[survey.questions.len() - 1])
    }

    /// Replaces the question content but keeps its original creation time.
    pub fn update_question(
        &mut self,
        id: &SurveyId,
        index: usize,
        draft: QuestionDraft,
    ) -> Result<(), CatalogError> {
        let survey = self.survey_mut(id)?;
        let len = survey.questions.len();
        let existing = survey
            .questions
            .get_mut(index)
            .ok_or(CatalogError::QuestionOutOfRange { index, len })?;
        let mut replacement = question_from_draft(draft, index)?;
        replacement.created_at = existing.created_at;
        *existing = replacement;
        Ok(())
    }

    pub fn remove_question(
        &mut self,
        id: &SurveyId,
        index: usize,
    ) -> Result<QuestionSpec, CatalogError> {
        let survey = self.survey_mut(id)?;
        let len = survey.questions.len();
        if index >= len {
            return Err(CatalogError::QuestionOutOfRange { index, len });
        }
        Ok(survey.questions.remove(index))
    }

    pub fn move_question(
        &mut self,
        id: &SurveyId,
        from: usize,
        to: usize,
    ) -> Result<(), CatalogError> {
        let survey = self.survey_mut(id)?;
        let len = survey.questions.len();
        for index in [from, to] {
            if index >= len {
                return Err(CatalogError::QuestionOutOfRange { index, len });
            }
        }
        let question = survey.questions.remove(from);
        survey.questions.insert(to, question);
        Ok(())
    }

    /// Moves the legacy global question list into a survey, creating it if needed.
    pub fn adopt_legacy_questions(
        &mut self,
        name: &str,
        legacy: Vec<QuestionSpec>,
    ) -> Result<&SurveyDefinition, CatalogError> {
        let position = match self.surveys.iter().position(|survey| survey.name == name.trim()) {
            Some(position) => position,
            None => {
                self.create(SurveyDraft {
                    name: name.to_string(),
                    description: String::new(),
                })?;
                self.surveys.len() - 1
            }
        };

        // Questions adopted by an earlier, interrupted migration are not added twice.
        let survey = &mut self.surveys[position];
        for question in legacy {
            let adopted = survey.questions.iter().any(|existing| {
                existing.item_name == question.item_name
                    && existing.created_at == question.created_at
            });
            if !adopted {
                survey.questions.push(question);
            }
        }
        Ok(survey)
    }

    fn survey_mut(&mut self, id: &SurveyId) -> Result<&mut SurveyDefinition, CatalogError> {
        self.surveys
            .iter_mut()
            .find(|survey| &survey.id == id)
            .ok_or(CatalogError::SurveyNotFound)
    }

    fn available_name(&self, raw: &str, except: Option<&SurveyId>) -> Result<String, CatalogError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(CatalogError::EmptyName);
        }
        let taken = self
            .surveys
            .iter()
            .any(|survey| survey.name == name && Some(&survey.id) != except);
        if taken {
            return Err(CatalogError::DuplicateName(name.to_string()));
        }
        Ok(name.to_string())
    }
}

fn question_from_draft(draft: QuestionDraft, position: usize) -> Result<QuestionSpec, CatalogError> {
    let question_text = draft.question_text.trim().to_string();
    if question_text.is_empty() {
        return Err(CatalogError::EmptyQuestion);
    }

    let item_name = match draft.item_name.trim() {
        "" => format!("q{}", position + 1),
        name => name.to_string(),
    };

    Ok(QuestionSpec {
        item_name,
        item_type: draft.item_type,
        question_text,
        topic: draft.topic.trim().to_string(),
        subtopic: draft
            .subtopic
            .map(|subtopic| subtopic.trim().to_string())
            .filter(|subtopic| !subtopic.is_empty()),
        created_at: Utc::now(),
    })
}

/// Adds a topic unless an identical one exists.
pub fn add_topic(topics: &mut Vec<Topic>, raw: &str) -> Result<(), CatalogError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CatalogError::EmptyName);
    }
    if topics.iter().any(|topic| topic.0 == name) {
        return Err(CatalogError::DuplicateName(name.to_string()));
    }
    topics.push(Topic(name.to_string()));
    Ok(())
}

pub fn remove_topic(topics: &mut Vec<Topic>, raw: &str) -> Result<(), CatalogError> {
    let name = raw.trim();
    let position = topics
        .iter()
        .position(|topic| topic.0 == name)
        .ok_or_else(|| CatalogError::TopicNotFound(name.to_string()))?;
    topics.remove(position);
    Ok(())
}
