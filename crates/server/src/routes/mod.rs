pub mod auth;
pub mod projects;
pub mod tasks;

use axum::response::Redirect;

pub async fn home() -> Redirect {
    Redirect::to("/projects")
}
