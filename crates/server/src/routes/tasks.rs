use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::{Form, FormRejection};
use sqlx::SqlitePool;

use crate::{
    db::{models::Task, JournalRepo, ProjectRepo, StatusRepo, TaskRepo},
    error::{AppError, Result},
    forms::{Choice, DeleteForm, FormErrors, JournalForm, TaskForm},
    middleware::auth::AuthUser,
    routes::projects::load_project,
    services::confirm::{self, ConfirmAction},
    views::{DeleteTarget, FormView, TaskDetailView},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:task_id", get(task_detail))
        .route("/new/:project_id", get(new_task_form).post(create_task))
        .route("/modify/:task_id", get(modify_task_form).post(modify_task))
        .route("/delete/:task_id", get(confirm_delete_task).post(delete_task))
        .route("/addcomment/:task_id", get(comment_form).post(add_comment))
}

async fn load_task(pool: &SqlitePool, id: &str) -> Result<Task> {
    TaskRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))
}

/// Choice sets of the task form: the project's members are the only
/// assignable users.
struct TaskChoices {
    members: Vec<Choice>,
    statuses: Vec<Choice>,
}

impl TaskChoices {
    async fn load(pool: &SqlitePool, project_id: &str) -> Result<Self> {
        let members = ProjectRepo::members(pool, project_id).await?;
        let statuses = StatusRepo::list(pool).await?;
        Ok(Self {
            members: members.iter().map(Choice::from).collect(),
            statuses: statuses.iter().map(Choice::from).collect(),
        })
    }

    fn attach(self, view: FormView<TaskForm>) -> FormView<TaskForm> {
        view.with_choices("assigned", self.members)
            .with_choices("status", self.statuses)
    }
}

async fn task_detail(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<String>,
) -> Result<Json<TaskDetailView>> {
    let task = TaskRepo::find_summary(&state.db.pool, &task_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;
    let project = load_project(&state.db.pool, &task.project_id).await?;
    let journals = JournalRepo::list_for_task(&state.db.pool, &task.id).await?;

    Ok(Json(TaskDetailView {
        user: user.username,
        task,
        project,
        journals,
    }))
}

async fn new_task_form(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Response> {
    let project = load_project(&state.db.pool, &project_id).await?;
    let choices = TaskChoices::load(&state.db.pool, &project.id).await?;

    let view = FormView::new(
        "task",
        format!("/task/new/{}", project.id),
        TaskForm::default(),
    );
    Ok(choices.attach(view).render())
}

async fn create_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
    submitted: std::result::Result<Form<TaskForm>, FormRejection>,
) -> Result<Response> {
    let project = load_project(&state.db.pool, &project_id).await?;
    let choices = TaskChoices::load(&state.db.pool, &project.id).await?;

    let form = match submitted {
        Ok(Form(form)) => form,
        Err(rejection) => {
            let view = FormView::new(
                "task",
                format!("/task/new/{}", project.id),
                TaskForm::default(),
            )
            .with_errors(FormErrors::unreadable(rejection));
            return Ok(choices.attach(view).render());
        }
    };

    let input = match form.clone().clean(&choices.members, &choices.statuses) {
        Ok(input) => input,
        Err(errors) => {
            let view = FormView::new("task", format!("/task/new/{}", project.id), form)
                .with_errors(errors);
            return Ok(choices.attach(view).render());
        }
    };

    // The project always comes from the URL.
    let task = TaskRepo::create(&state.db.pool, &project.id, &input).await?;
    tracing::info!(
        task_id = %task.id,
        project_id = %project.id,
        user_id = %user.id,
        "Task created"
    );

    Ok(Redirect::to(&format!("/projects/{}", project.id)).into_response())
}

async fn modify_task_form(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(task_id): Path<String>,
) -> Result<Response> {
    let task = load_task(&state.db.pool, &task_id).await?;
    let choices = TaskChoices::load(&state.db.pool, &task.project_id).await?;

    let view = FormView::new(
        "task",
        format!("/task/modify/{}", task.id),
        TaskForm::from_task(&task),
    );
    Ok(choices.attach(view).render())
}

async fn modify_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<String>,
    submitted: std::result::Result<Form<TaskForm>, FormRejection>,
) -> Result<Response> {
    let task = load_task(&state.db.pool, &task_id).await?;
    let choices = TaskChoices::load(&state.db.pool, &task.project_id).await?;

    let form = match submitted {
        Ok(Form(form)) => form,
        Err(rejection) => {
            let view = FormView::new(
                "task",
                format!("/task/modify/{}", task.id),
                TaskForm::from_task(&task),
            )
            .with_errors(FormErrors::unreadable(rejection));
            return Ok(choices.attach(view).render());
        }
    };

    let input = match form.clone().clean(&choices.members, &choices.statuses) {
        Ok(input) => input,
        Err(errors) => {
            let view = FormView::new("task", format!("/task/modify/{}", task.id), form)
                .with_errors(errors);
            return Ok(choices.attach(view).render());
        }
    };

    let updated = TaskRepo::update(&state.db.pool, &task.id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;
    tracing::info!(task_id = %updated.id, user_id = %user.id, "Task modified");

    Ok(Redirect::to(&format!("/projects/{}", updated.project_id)).into_response())
}

fn delete_confirmation(
    state: &AppState,
    user: &AuthUser,
    task: &Task,
    errors: FormErrors,
) -> Result<Response> {
    let token = confirm::issue(&state.config, &user.id, ConfirmAction::DeleteTask, &task.id)?;

    let target = DeleteTarget {
        id: task.id.clone(),
        name: task.name.clone(),
    };

    Ok(
        FormView::new("delete_task", format!("/task/delete/{}", task.id), target)
            .with_confirm_token(token)
            .with_errors(errors)
            .render(),
    )
}

async fn confirm_delete_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<String>,
) -> Result<Response> {
    let task = load_task(&state.db.pool, &task_id).await?;
    delete_confirmation(&state, &user, &task, FormErrors::new())
}

async fn delete_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Result<Response> {
    let task = load_task(&state.db.pool, &task_id).await?;

    let verified = form.clean(|token| {
        confirm::verify(
            &state.config,
            token,
            &user.id,
            ConfirmAction::DeleteTask,
            &task.id,
        )
    });
    if let Err(errors) = verified {
        return delete_confirmation(&state, &user, &task, errors);
    }

    TaskRepo::delete_cascade(&state.db.pool, &task.id).await?;
    tracing::info!(task_id = %task.id, user_id = %user.id, "Task deleted");

    Ok(Redirect::to(&format!("/projects/{}", task.project_id)).into_response())
}

async fn comment_form(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(task_id): Path<String>,
) -> Result<Response> {
    let task = load_task(&state.db.pool, &task_id).await?;

    Ok(FormView::new(
        "journal",
        format!("/task/addcomment/{}", task.id),
        JournalForm::default(),
    )
    .render())
}

async fn add_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<String>,
    Form(form): Form<JournalForm>,
) -> Result<Response> {
    let task = load_task(&state.db.pool, &task_id).await?;

    let entry = match form.clone().clean() {
        Ok(entry) => entry,
        Err(errors) => {
            return Ok(
                FormView::new("journal", format!("/task/addcomment/{}", task.id), form)
                    .with_errors(errors)
                    .render(),
            )
        }
    };

    // Task, author and date are never taken from the submission.
    let journal = JournalRepo::create(
        &state.db.pool,
        &task.id,
        &user.id,
        state.clock.today(),
        &entry,
    )
    .await?;
    tracing::info!(journal_id = %journal.id, task_id = %task.id, user_id = %user.id, "Comment added");

    Ok(Redirect::to(&format!("/task/{}", task.id)).into_response())
}
