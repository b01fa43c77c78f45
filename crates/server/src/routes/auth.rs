use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar, Form,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    db::{self, models::User, UserRepo},
    error::{AppError, Result},
    forms::{FormErrors, LoginForm, SignupForm, NON_FIELD, USERNAME_TAKEN},
    middleware::auth::SESSION_COOKIE,
    views::FormView,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", get(signup_form).post(signup))
        .route("/login", get(login_form).post(login))
        .route("/logout", post(logout))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub username: String,
    pub exp: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| AppError::Internal("Failed to hash password".to_string()))
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn create_session(user: &User, config: &Config) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(config.session_ttl)
        .ok_or_else(|| AppError::Internal("Session expiry out of range".to_string()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: user.id.clone(),
        username: user.username.clone(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|_| AppError::Internal("Failed to create token".to_string()))
}

pub fn decode_session(token: &str, secret: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies)
        .build()
}

async fn signup_form() -> Response {
    FormView::new("signup", "/signup", SignupForm::default()).render()
}

async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response> {
    let taken = UserRepo::find_by_username(&state.db.pool, form.username())
        .await?
        .is_some();

    let signup = match form.clone().clean(taken) {
        Ok(signup) => signup,
        Err(errors) => {
            return Ok(FormView::new("signup", "/signup", form)
                .with_errors(errors)
                .render())
        }
    };

    let password_hash = hash_password(&signup.password)?;
    let user = match UserRepo::create(&state.db.pool, &signup.username, &password_hash).await {
        Ok(user) => user,
        // Lost a race with a concurrent sign-up for the same name.
        Err(err) if db::is_unique_violation(&err) => {
            let mut errors = FormErrors::new();
            errors.add("username", USERNAME_TAKEN);
            return Ok(FormView::new("signup", "/signup", form)
                .with_errors(errors)
                .render());
        }
        Err(err) => return Err(err.into()),
    };
    tracing::info!(user_id = %user.id, username = %user.username, "User signed up");

    // Sign the new user straight in.
    let token = create_session(&user, &state.config)?;
    let jar = jar.add(session_cookie(token, &state.config));

    Ok((jar, Redirect::to("/")).into_response())
}

async fn login_form(Query(query): Query<LoginQuery>) -> Response {
    let form = LoginForm {
        next: query.next,
        ..LoginForm::default()
    };
    FormView::new("login", "/login", form).render()
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let user = UserRepo::find_by_username(&state.db.pool, form.username.trim()).await?;

    let authenticated = match &user {
        Some(user) => verify_password(&form.password, &user.password_hash)?,
        None => false,
    };

    let user = match user {
        Some(user) if authenticated => user,
        _ => {
            let mut errors = FormErrors::new();
            errors.add(
                NON_FIELD,
                "Please enter a correct username and password. Note that both fields may be case-sensitive.",
            );
            return Ok(FormView::new("login", "/login", form)
                .with_errors(errors)
                .render());
        }
    };

    tracing::info!(user_id = %user.id, "User logged in");

    let token = create_session(&user, &state.config)?;
    let jar = jar.add(session_cookie(token, &state.config));

    Ok((jar, Redirect::to(form.redirect_target())).into_response())
}

async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Redirect::to("/login"),
    )
}
