use std::env;

use chrono::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub session_ttl: Duration,
    pub confirm_ttl: Duration,
    pub secure_cookies: bool,
}

impl Config {
    pub fn from_env() -> Self {
        // Optional .env file
        let _ = dotenvy::dotenv();

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./data/taskmanager.db?mode=rwc".to_string()),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "development-secret-change-in-production".to_string()),
            session_ttl: Duration::hours(
                env::var("SESSION_TTL_HOURS")
                    .ok()
                    .and_then(|h| h.parse().ok())
                    .unwrap_or(168),
            ),
            confirm_ttl: Duration::minutes(
                env::var("CONFIRM_TTL_MINUTES")
                    .ok()
                    .and_then(|m| m.parse().ok())
                    .unwrap_or(30),
            ),
            secure_cookies: env::var("SECURE_COOKIES")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }
}
