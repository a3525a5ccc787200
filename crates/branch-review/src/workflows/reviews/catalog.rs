use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::domain::{
    Branch, BranchDraft, BranchId, QuestionDraft, QuestionSpec, SurveyDefinition, SurveyDraft,
    SurveyId,
};
use super::handoff::resolve_editor_target;
use super::repository::{Document, DocumentStore, Snapshot, Topic};
use super::service::{persist, ReviewServiceError};
use super::surveys::{add_topic, remove_topic, CatalogError, SurveyCatalog};

/// Outcome of a roster import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub skipped: Vec<String>,
}

/// Survey, topic and branch roster management.
pub struct CatalogService<S> {
    store: Arc<S>,
}

impl<S> CatalogService<S>
where
    S: DocumentStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn modify<T, R, F>(&self, apply: F) -> Result<R, ReviewServiceError>
    where
        T: Document,
        F: FnOnce(&mut Vec<T>) -> Result<R, ReviewServiceError>,
    {
        let mut snapshot: Snapshot<T> = self.store.load_all()?;
        let result = apply(&mut snapshot.items)?;
        persist(self.store.as_ref(), snapshot)?;
        Ok(result)
    }

    fn modify_surveys<R, F>(&self, apply: F) -> Result<R, ReviewServiceError>
    where
        F: FnOnce(&mut SurveyCatalog) -> Result<R, CatalogError>,
    {
        self.modify(|surveys: &mut Vec<SurveyDefinition>| {
            let mut catalog = SurveyCatalog::new(std::mem::take(surveys));
            let result = apply(&mut catalog);
            *surveys = catalog.into_surveys();
            Ok(result?)
        })
    }

    pub fn list_surveys(&self) -> Result<Vec<SurveyDefinition>, ReviewServiceError> {
        Ok(self.store.load_all::<SurveyDefinition>()?.items)
    }

    pub fn get_survey(&self, id: &SurveyId) -> Result<SurveyDefinition, ReviewServiceError> {
        self.list_surveys()?
            .into_iter()
            .find(|survey| &survey.id == id)
            .ok_or_else(|| CatalogError::SurveyNotFound.into())
    }

    pub fn create_survey(
        &self,
        draft: SurveyDraft,
    ) -> Result<SurveyDefinition, ReviewServiceError> {
        let survey = self.modify_surveys(|catalog| catalog.create(draft).cloned())?;
        info!(survey_id = %survey.id.0, name = %survey.name, "survey created");
        Ok(survey)
    }

    pub fn rename_survey(
        &self,
        id: &SurveyId,
        name: &str,
    ) -> Result<SurveyDefinition, ReviewServiceError> {
        let survey = self.modify_surveys(|catalog| {
            catalog.rename(id, name)?;
            catalog.get(id).cloned().ok_or(CatalogError::SurveyNotFound)
        })?;
        warn!(
            survey_id = %id.0,
            name = %survey.name,
            "survey renamed; existing reviews keep the previous name"
        );
        Ok(survey)
    }

    pub fn delete_survey(&self, id: &SurveyId) -> Result<SurveyDefinition, ReviewServiceError> {
        let removed = self.modify_surveys(|catalog| catalog.remove(id))?;
        info!(survey_id = %id.0, name = %removed.name, "survey deleted");
        Ok(removed)
    }

    pub fn add_question(
        &self,
        id: &SurveyId,
        draft: QuestionDraft,
    ) -> Result<QuestionSpec, ReviewServiceError> {
        self.modify_surveys(|catalog| catalog.add_question(id, draft).cloned())
    }

    pub fn update_question(
        &self,
        id: &SurveyId,
        index: usize,
        draft: QuestionDraft,
    ) -> Result<(), ReviewServiceError> {
        self.modify_surveys(|catalog| catalog.update_question(id, index, draft))
    }

    pub fn remove_question(
        &self,
        id: &SurveyId,
        index: usize,
    ) -> Result<QuestionSpec, ReviewServiceError> {
        self.modify_surveys(|catalog| catalog.remove_question(id, index))
    }

    pub fn move_question(
        &self,
        id: &SurveyId,
        from: usize,
        to: usize,
    ) -> Result<(), ReviewServiceError> {
        self.modify_surveys(|catalog| catalog.move_question(id, from, to))
    }

    /// Move the legacy global question list into the named survey and clear it.
    pub fn adopt_legacy_questions(
        &self,
        survey_name: &str,
    ) -> Result<SurveyDefinition, ReviewServiceError> {
        let legacy: Snapshot<QuestionSpec> = self.store.load_all()?;
        let moved = legacy.items.len();
        let survey = self.modify_surveys(|catalog| {
            catalog
                .adopt_legacy_questions(survey_name, legacy.items.clone())
                .cloned()
        })?;
        persist(
            self.store.as_ref(),
            Snapshot::<QuestionSpec> {
                revision: legacy.revision,
                items: Vec::new(),
            },
        )?;

        info!(survey = %survey.name, moved, "legacy questions migrated");
        Ok(survey)
    }

    /// Survey the question editor should open; see [`resolve_editor_target`].
    pub fn editor_target(
        &self,
        query_name: Option<&str>,
        stored_index: Option<usize>,
    ) -> Result<Option<SurveyDefinition>, ReviewServiceError> {
        let surveys = self.list_surveys()?;
        Ok(resolve_editor_target(&surveys, query_name, stored_index).cloned())
    }

    pub fn list_topics(&self) -> Result<Vec<String>, ReviewServiceError> {
        let topics: Snapshot<Topic> = self.store.load_all()?;
        Ok(topics.items.into_iter().map(|topic| topic.0).collect())
    }

    pub fn add_topic(&self, name: &str) -> Result<(), ReviewServiceError> {
        self.modify(|topics: &mut Vec<Topic>| Ok(add_topic(topics, name)?))
    }

    pub fn remove_topic(&self, name: &str) -> Result<(), ReviewServiceError> {
        self.modify(|topics: &mut Vec<Topic>| Ok(remove_topic(topics, name)?))
    }

    pub fn list_branches(&self) -> Result<Vec<Branch>, ReviewServiceError> {
        Ok(self.store.load_all::<Branch>()?.items)
    }

    pub fn get_branch(&self, id: &BranchId) -> Result<Branch, ReviewServiceError> {
        self.list_branches()?
            .into_iter()
            .find(|branch| &branch.id == id)
            .ok_or_else(|| CatalogError::BranchNotFound.into())
    }

    pub fn create_branch(&self, draft: BranchDraft) -> Result<Branch, ReviewServiceError> {
        let branch = self.modify(|branches: &mut Vec<Branch>| {
            let branch = branch_from_draft(branches, draft, None)?;
            branches.push(branch.clone());
            Ok(branch)
        })?;
        info!(branch_id = %branch.id.0, name = %branch.name, "branch created");
        Ok(branch)
    }

    /// Renaming a branch does not rewrite the branch name on past reviews.
    pub fn update_branch(
        &self,
        id: &BranchId,
        draft: BranchDraft,
    ) -> Result<Branch, ReviewServiceError> {
        self.modify(|branches: &mut Vec<Branch>| {
            let position = branches
                .iter()
                .position(|branch| &branch.id == id)
                .ok_or(CatalogError::BranchNotFound)?;
            let updated = branch_from_draft(branches, draft, Some(id))?;
            if updated.name != branches[position].name {
                warn!(
                    branch_id = %id.0,
                    from = %branches[position].name,
                    to = %updated.name,
                    "branch renamed; existing reviews keep the previous name"
                );
            }
            branches[position] = updated.clone();
            Ok(updated)
        })
    }

    pub fn delete_branch(&self, id: &BranchId) -> Result<Branch, ReviewServiceError> {
        self.modify(|branches: &mut Vec<Branch>| {
            let position = branches
                .iter()
                .position(|branch| &branch.id == id)
                .ok_or(CatalogError::BranchNotFound)?;
            Ok(branches.remove(position))
        })
    }

    /// Create every roster entry whose name is not taken yet.
    pub fn import_branches(
        &self,
        drafts: Vec<BranchDraft>,
    ) -> Result<ImportSummary, ReviewServiceError> {
        let summary = self.modify(|branches: &mut Vec<Branch>| {
            let mut summary = ImportSummary::default();
            for draft in drafts {
                match branch_from_draft(branches, draft.clone(), None) {
                    Ok(branch) => {
                        branches.push(branch);
                        summary.created += 1;
                    }
                    Err(err) => {
                        warn!(name = %draft.name, error = %err, "skipping roster row");
                        summary.skipped.push(draft.name);
                    }
                }
            }
            Ok(summary)
        })?;
        info!(
            created = summary.created,
            skipped = summary.skipped.len(),
            "branch roster imported"
        );
        Ok(summary)
    }
}

fn branch_from_draft(
    branches: &[Branch],
    draft: BranchDraft,
    existing: Option<&BranchId>,
) -> Result<Branch, CatalogError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(CatalogError::EmptyName);
    }
    if branches
        .iter()
        .any(|branch| branch.name == name && Some(&branch.id) != existing)
    {
        return Err(CatalogError::DuplicateName(name.to_string()));
    }

    Ok(Branch {
        id: existing.cloned().unwrap_or_else(BranchId::generate),
        name: name.to_string(),
        manager: draft.manager.trim().to_string(),
        contact: draft.contact.trim().to_string(),
        address: draft.address.trim().to_string(),
    })
}
