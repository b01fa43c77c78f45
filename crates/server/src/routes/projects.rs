use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::Form;
use sqlx::SqlitePool;

use crate::{
    db::{models::Project, ProjectRepo, TaskRepo, UserRepo},
    error::{AppError, Result},
    forms::{Choice, DeleteForm, FormErrors, ProjectForm},
    middleware::auth::AuthUser,
    services::confirm::{self, ConfirmAction},
    views::{DeleteTarget, FormView, ProjectListView, TaskListView},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects))
        .route("/new", get(new_project_form).post(create_project))
        .route("/:id", get(list_tasks))
        .route(
            "/delete/:id",
            get(confirm_delete_project).post(delete_project),
        )
}

pub(crate) async fn load_project(pool: &SqlitePool, id: &str) -> Result<Project> {
    ProjectRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
}

async fn user_choices(pool: &SqlitePool) -> Result<Vec<Choice>> {
    let users = UserRepo::list(pool).await?;
    Ok(users.iter().map(Choice::from).collect())
}

async fn list_projects(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProjectListView>> {
    let projects = ProjectRepo::list_for_member(&state.db.pool, &user.id).await?;

    Ok(Json(ProjectListView {
        user: user.username,
        projects,
    }))
}

async fn list_tasks(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<TaskListView>> {
    let project = load_project(&state.db.pool, &id).await?;
    let tasks = TaskRepo::list_for_project(&state.db.pool, &project.id).await?;

    Ok(Json(TaskListView {
        user: user.username,
        project,
        tasks,
    }))
}

async fn new_project_form(State(state): State<AppState>, _user: AuthUser) -> Result<Response> {
    let users = user_choices(&state.db.pool).await?;

    Ok(FormView::new("project", "/projects/new", ProjectForm::default())
        .with_choices("members", users)
        .render())
}

async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    Form(form): Form<ProjectForm>,
) -> Result<Response> {
    let users = user_choices(&state.db.pool).await?;

    let input = match form.clone().clean(&users) {
        Ok(input) => input,
        Err(errors) => {
            return Ok(FormView::new("project", "/projects/new", form)
                .with_choices("members", users)
                .with_errors(errors)
                .render())
        }
    };

    let project = ProjectRepo::create(&state.db.pool, &input).await?;
    tracing::info!(
        project_id = %project.id,
        user_id = %user.id,
        members = input.member_ids.len(),
        "Project created"
    );

    Ok(Redirect::to("/projects").into_response())
}

fn delete_confirmation(
    state: &AppState,
    user: &AuthUser,
    project: &Project,
    errors: FormErrors,
) -> Result<Response> {
    let token = confirm::issue(
        &state.config,
        &user.id,
        ConfirmAction::DeleteProject,
        &project.id,
    )?;

    let target = DeleteTarget {
        id: project.id.clone(),
        name: project.name.clone(),
    };

    Ok(
        FormView::new("delete_project", format!("/projects/delete/{}", project.id), target)
            .with_confirm_token(token)
            .with_errors(errors)
            .render(),
    )
}

async fn confirm_delete_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let project = load_project(&state.db.pool, &id).await?;
    delete_confirmation(&state, &user, &project, FormErrors::new())
}

async fn delete_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Result<Response> {
    let project = load_project(&state.db.pool, &id).await?;

    let verified = form.clean(|token| {
        confirm::verify(
            &state.config,
            token,
            &user.id,
            ConfirmAction::DeleteProject,
            &project.id,
        )
    });
    if let Err(errors) = verified {
        return delete_confirmation(&state, &user, &project, errors);
    }

    ProjectRepo::delete_cascade(&state.db.pool, &project.id).await?;
    tracing::info!(project_id = %project.id, user_id = %user.id, "Project deleted");

    Ok(Redirect::to("/projects").into_response())
}
