//! Page view documents.
//!
//! Every page is rendered as a JSON document that a front-end template turns
//! into HTML. Form pages share [`FormView`]: the current values, field errors
//! and the options of each choice field.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{
    db::models::{JournalEntry, Project, TaskSummary},
    forms::{Choice, FormErrors},
};

#[derive(Debug, Serialize)]
pub struct ProjectListView {
    pub user: String,
    pub projects: Vec<Project>,
}

#[derive(Debug, Serialize)]
pub struct TaskListView {
    pub user: String,
    pub project: Project,
    pub tasks: Vec<TaskSummary>,
}

#[derive(Debug, Serialize)]
pub struct TaskDetailView {
    pub user: String,
    pub task: TaskSummary,
    pub project: Project,
    pub journals: Vec<JournalEntry>,
}

#[derive(Debug, Serialize)]
pub struct FormView<T: Serialize> {
    pub form: &'static str,
    pub action: String,
    pub values: T,
    pub errors: FormErrors,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub choices: BTreeMap<&'static str, Vec<Choice>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirm_token: Option<String>,
}

impl<T: Serialize> FormView<T> {
    pub fn new(form: &'static str, action: impl Into<String>, values: T) -> Self {
        Self {
            form,
            action: action.into(),
            values,
            errors: FormErrors::new(),
            choices: BTreeMap::new(),
            confirm_token: None,
        }
    }

    pub fn with_choices(mut self, field: &'static str, choices: Vec<Choice>) -> Self {
        self.choices.insert(field, choices);
        self
    }

    pub fn with_errors(mut self, errors: FormErrors) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_confirm_token(mut self, token: String) -> Self {
        self.confirm_token = Some(token);
        self
    }

    /// Unbound form: 200. Bound form with errors: 422, nothing persisted.
    pub fn render(self) -> Response {
        let status = if self.errors.is_empty() {
            StatusCode::OK
        } else {
            StatusCode::UNPROCESSABLE_ENTITY
        };
        (status, Json(self)).into_response()
    }
}

/// Context shown on a delete confirmation page.
#[derive(Debug, Serialize)]
pub struct DeleteTarget {
    pub id: String,
    pub name: String,
}
