use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::{
    extract::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{error::AppError, routes::auth::decode_session, AppState};

pub const SESSION_COOKIE: &str = "session";

/// The identity behind a request, inserted by [`require_session`].
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
}

/// Gate for every page except sign-up and login. A request without a valid
/// session is sent to the login page with its path as `next`.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| bearer.map(|TypedHeader(auth)| auth.token().to_string()));

    let claims = token.and_then(|t| decode_session(&t, &state.config.jwt_secret));

    let Some(claims) = claims else {
        let path = request.uri().path();
        tracing::debug!(%path, "Unauthenticated request, redirecting to login");
        let query = serde_urlencoded::to_string([("next", path)]).unwrap_or_default();
        return Redirect::to(&format!("/login?{query}")).into_response();
    };

    request.extensions_mut().insert(AuthUser {
        id: claims.sub,
        username: claims.username,
    });

    next.run(request).await
}

// Extractor for getting the authenticated user from request extensions
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
