mod models;
mod seeders;

pub use models::*;
pub use seeders::{seed_demo_courses, SeedOutcome};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::PathBuf;
use tracing::info;

use crate::config::DatabaseConfig;

pub type DbPool = SqlitePool;

/// Fixed-width RFC 3339, so text order in SQL matches time order
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Directory holding the database file for a `sqlite:` url, if it is file-backed
pub fn database_dir(url: &str) -> Option<PathBuf> {
    let path = url.strip_prefix("sqlite:")?;
    let path = path.strip_prefix("//").unwrap_or(path);
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.contains(":memory:") {
        return None;
    }
    PathBuf::from(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
}

/// Execute a SQL migration file, properly handling comments
async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<()> {
    for statement in sql.split(';') {
        // Strip SQL comment lines (lines starting with --)
        let cleaned: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = cleaned.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    Ok(())
}

pub async fn init(config: &DatabaseConfig) -> Result<DbPool> {
    info!("Initializing database at {}", config.url);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
        .with_context(|| format!("Failed to open database: {}", config.url))?;

    if !config.url.contains(":memory:") {
        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&pool)
            .await?;
    }
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    info!("Database initialized successfully");
    Ok(pool)
}

/// Open a private in-memory database with the schema applied.
///
/// The pool is capped at one connection since every SQLite memory
/// connection is its own database.
pub async fn init_memory() -> Result<DbPool> {
    init(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    })
    .await
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    // Migration 001: Initial schema
    execute_sql(pool, include_str!("../../migrations/001_initial.sql"))
        .await
        .context("Migration 001_initial failed")?;

    Ok(())
}

/// Names of the user tables, for diagnostics
pub async fn table_names(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[test]
    fn test_timestamps_sort_as_text() {
        let base = Utc::now();
        let earlier = format_timestamp(base);
        let later = format_timestamp(base + chrono::Duration::milliseconds(1));
        assert!(earlier < later);
        assert_eq!(earlier.len(), later.len());
        assert!(earlier.ends_with('Z'));
    }

    #[test]
    fn test_database_dir() {
        assert_eq!(
            database_dir("sqlite:./data/campus.db?mode=rwc"),
            Some(PathBuf::from("./data"))
        );
        assert_eq!(
            database_dir("sqlite:///var/lib/campus/campus.db"),
            Some(PathBuf::from("/var/lib/campus"))
        );
        assert_eq!(database_dir("sqlite:campus.db"), None);
        assert_eq!(database_dir("sqlite::memory:"), None);
        assert_eq!(database_dir("postgres://localhost/campus"), None);
    }

    #[tokio::test]
    async fn test_schema_applies_and_is_idempotent() {
        let pool = init_memory().await.unwrap();
        assert_ok!(run_migrations(&pool).await);

        let tables = table_names(&pool).await.unwrap();
        for expected in [
            "announcements",
            "attendance",
            "courses",
            "enrollments",
            "grades",
            "sessions",
            "users",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing table {}", expected);
        }
    }

    #[tokio::test]
    async fn test_enrollment_pair_is_unique() {
        let pool = init_memory().await.unwrap();
        let now = now_timestamp();

        sqlx::query("INSERT INTO users (id, name, email, password_hash, created_at, updated_at) VALUES ('u1', 'A', 'a@x.com', 'h', ?, ?)")
            .bind(&now)
            .bind(&now)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO courses (id, code, title, created_at, updated_at) VALUES ('c1', 'CS101', 'Intro', ?, ?)")
            .bind(&now)
            .bind(&now)
            .execute(&pool)
            .await
            .unwrap();

        let insert = "INSERT INTO enrollments (id, student_id, course_id, enrolled_at) VALUES (?, 'u1', 'c1', ?)";
        sqlx::query(insert)
            .bind("e1")
            .bind(&now)
            .execute(&pool)
            .await
            .unwrap();
        let second = sqlx::query(insert).bind("e2").bind(&now).execute(&pool).await;
        assert!(second.is_err());
    }
}
