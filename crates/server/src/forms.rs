//! Form validators.
//!
//! Each form deserializes from a submitted `application/x-www-form-urlencoded`
//! body with every field defaulted, so a missing field becomes a field error
//! instead of a rejected request. `clean` turns a form into validated input or
//! a [`FormErrors`] map that the handler renders back alongside the values.
//!
//! Fields that the server fills in from context (a task's project, a journal's
//! task/author/date) are not part of any form; values submitted under those
//! names are ignored by deserialization.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::db::models::{Member, NewProject, NewTask, Status, Task, User};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_DATE: &str = "Enter a valid date.";
pub const INVALID_INTEGER: &str = "Enter a whole number.";
pub const NON_FIELD: &str = "__all__";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Field name to error messages, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn merge(&mut self, other: FormErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// A body that could not be decoded at all, e.g. a repeated single-value
    /// field. Reported as a non-field error so the form is shown again.
    pub fn unreadable(detail: impl std::fmt::Display) -> Self {
        let mut errors = Self::new();
        errors.add(
            NON_FIELD,
            format!("The submitted form could not be read: {detail}"),
        );
        errors
    }

    fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FormErrors::new();
        for (field, errs) in errors.field_errors() {
            for err in errs.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                out.add(field.to_string(), message);
            }
        }
        out
    }
}

/// One selectable option of a choice field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub id: String,
    pub label: String,
}

impl From<&Member> for Choice {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id.clone(),
            label: member.username.clone(),
        }
    }
}

impl From<&User> for Choice {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            label: user.username.clone(),
        }
    }
}

impl From<&Status> for Choice {
    fn from(status: &Status) -> Self {
        Self {
            id: status.id.clone(),
            label: status.name.clone(),
        }
    }
}

fn run_validators(form: &impl Validate) -> FormErrors {
    form.validate().map(|_| FormErrors::new()).unwrap_or_else(Into::into)
}

fn require(errors: &mut FormErrors, field: &str, value: &str) -> bool {
    if value.is_empty() {
        errors.add(field, REQUIRED);
        false
    } else {
        true
    }
}

fn parse_date(errors: &mut FormErrors, field: &str, value: &str) -> Option<NaiveDate> {
    if !require(errors, field, value) {
        return None;
    }
    match NaiveDate::parse_from_str(value, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, INVALID_DATE);
            None
        }
    }
}

fn pick_choice(errors: &mut FormErrors, field: &str, value: &str, choices: &[Choice]) -> bool {
    if !require(errors, field, value) {
        return false;
    }
    if choices.iter().any(|c| c.id == value) {
        true
    } else {
        errors.add(field, INVALID_CHOICE);
        false
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// Every task field except the project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TaskForm {
    #[validate(length(max = 120, message = "Ensure this value has at most 120 characters."))]
    pub name: String,
    #[validate(length(max = 500, message = "Ensure this value has at most 500 characters."))]
    pub description: String,
    pub assigned: String,
    pub start_date: String,
    pub end_date: String,
    pub priority: String,
    pub status: String,
}

impl TaskForm {
    /// Pre-fill from an existing row.
    pub fn from_task(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            description: task.description.clone(),
            assigned: task.assigned_id.clone(),
            start_date: task.start_date.format(DATE_FORMAT).to_string(),
            end_date: task.end_date.format(DATE_FORMAT).to_string(),
            priority: task.priority.map(|p| p.to_string()).unwrap_or_default(),
            status: task.status_id.clone(),
        }
    }

    fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            assigned: self.assigned.trim().to_string(),
            start_date: self.start_date.trim().to_string(),
            end_date: self.end_date.trim().to_string(),
            priority: self.priority.trim().to_string(),
            status: self.status.trim().to_string(),
        }
    }

    /// `members` is the assignable set: exactly the current members of the
    /// task's project.
    pub fn clean(self, members: &[Choice], statuses: &[Choice]) -> Result<NewTask, FormErrors> {
        let form = self.normalized();
        let mut errors = run_validators(&form);

        require(&mut errors, "name", &form.name);
        let assigned_ok = pick_choice(&mut errors, "assigned", &form.assigned, members);
        let status_ok = pick_choice(&mut errors, "status", &form.status, statuses);
        let start_date = parse_date(&mut errors, "start_date", &form.start_date);
        let end_date = parse_date(&mut errors, "end_date", &form.end_date);

        let priority = if form.priority.is_empty() {
            None
        } else {
            match form.priority.parse::<i64>() {
                Ok(p) => Some(p),
                Err(_) => {
                    errors.add("priority", INVALID_INTEGER);
                    None
                }
            }
        };

        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                errors.add("end_date", "End date cannot be before the start date.");
            }
        }

        match (start_date, end_date) {
            (Some(start_date), Some(end_date)) if assigned_ok && status_ok => errors.into_result(
                NewTask {
                    name: form.name,
                    description: form.description,
                    assigned_id: form.assigned,
                    start_date,
                    end_date,
                    priority,
                    status_id: form.status,
                },
            ),
            _ => Err(errors),
        }
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProjectForm {
    #[validate(length(max = 120, message = "Ensure this value has at most 120 characters."))]
    pub name: String,
    pub members: Vec<String>,
}

impl ProjectForm {
    /// `users` is every user that may be chosen as a member.
    pub fn clean(self, users: &[Choice]) -> Result<NewProject, FormErrors> {
        let name = self.name.trim().to_string();
        let form = Self {
            name,
            members: self.members,
        };
        let mut errors = run_validators(&form);

        require(&mut errors, "name", &form.name);

        let mut seen = HashSet::new();
        let mut member_ids = Vec::new();
        for id in form.members.iter().map(|m| m.trim()).filter(|m| !m.is_empty()) {
            if !users.iter().any(|u| u.id == id) {
                errors.add(
                    "members",
                    format!("Select a valid choice. {id} is not one of the available choices."),
                );
            } else if seen.insert(id.to_string()) {
                member_ids.push(id.to_string());
            }
        }
        if member_ids.is_empty() && !errors.has("members") {
            errors.add("members", REQUIRED);
        }

        errors.into_result(NewProject {
            name: form.name,
            member_ids,
        })
    }
}

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

/// Only the entry text. Task, author and date are stamped by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct JournalForm {
    #[validate(length(max = 1000, message = "Ensure this value has at most 1000 characters."))]
    pub entry: String,
}

impl JournalForm {
    pub fn clean(self) -> Result<String, FormErrors> {
        let form = Self {
            entry: self.entry.trim().to_string(),
        };
        let mut errors = run_validators(&form);
        require(&mut errors, "entry", &form.entry);
        errors.into_result(form.entry)
    }
}

// ---------------------------------------------------------------------------
// Delete confirmation
// ---------------------------------------------------------------------------

/// Carries no entity fields; the token proves the confirmation page was
/// issued to this user for this object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteForm {
    #[serde(skip_serializing)]
    pub confirm_token: String,
}

impl DeleteForm {
    pub fn clean(self, verify: impl FnOnce(&str) -> bool) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        if self.confirm_token.is_empty() || !verify(&self.confirm_token) {
            errors.add(
                NON_FIELD,
                "The confirmation token is missing, expired, or does not match this object.",
            );
        }
        errors.into_result(())
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SignupForm {
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub username: String,
    #[serde(skip_serializing)]
    pub password1: String,
    #[serde(skip_serializing)]
    pub password2: String,
}

/// Validated sign-up data: the username and the raw password to hash.
#[derive(Debug, Clone)]
pub struct Signup {
    pub username: String,
    pub password: String,
}

impl SignupForm {
    pub fn username(&self) -> &str {
        self.username.trim()
    }

    /// `username_taken` is whether a user with the trimmed username exists.
    pub fn clean(self, username_taken: bool) -> Result<Signup, FormErrors> {
        let form = Self {
            username: self.username.trim().to_string(),
            ..self
        };
        let mut errors = run_validators(&form);

        if require(&mut errors, "username", &form.username) {
            let allowed = |c: char| c.is_alphanumeric() || "@.+-_".contains(c);
            if !form.username.chars().all(allowed) {
                errors.add(
                    "username",
                    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
                );
            } else if username_taken {
                errors.add("username", USERNAME_TAKEN);
            }
        }

        let has_password1 = require(&mut errors, "password1", &form.password1);
        let has_password2 = require(&mut errors, "password2", &form.password2);
        if has_password1 && has_password2 {
            if form.password1 != form.password2 {
                errors.add("password2", "The two password fields didn't match.");
            } else {
                errors.merge(password_strength(&form.password1, &form.username));
            }
        }

        errors.into_result(Signup {
            username: form.username,
            password: form.password1,
        })
    }
}

fn password_strength(password: &str, username: &str) -> FormErrors {
    let mut errors = FormErrors::new();
    if password.chars().count() < 8 {
        errors.add(
            "password2",
            "This password is too short. It must contain at least 8 characters.",
        );
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        errors.add("password2", "This password is entirely numeric.");
    }
    if !username.is_empty() && password.eq_ignore_ascii_case(username) {
        errors.add("password2", "The password is too similar to the username.");
    }
    errors
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub next: Option<String>,
}

impl LoginForm {
    /// Only same-site absolute paths are followed after login. Browsers read
    /// `\` as `/`, so any backslash or control character is refused.
    pub fn redirect_target(&self) -> &str {
        match self.next.as_deref() {
            Some(next)
                if next.starts_with('/')
                    && !next.starts_with("//")
                    && !next.chars().any(|c| c == '\\' || c.is_control()) =>
            {
                next
            }
            _ => "/",
        }
    }
}
