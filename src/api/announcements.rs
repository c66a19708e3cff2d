//! Course announcements.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{now_timestamp, Announcement, CreateAnnouncementRequest};
use crate::AppState;

use super::auth::CurrentUser;
use super::courses::find_course;
use super::error::{ApiError, ValidationErrorBuilder};
use super::extract::Json;
use super::validation::{require_uuid, validate_required_text};

fn validate_create_request(req: &CreateAnnouncementRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("title", validate_required_text(&req.title, "Title", 200));
    errors.check("content", validate_required_text(&req.content, "Content", 10_000));
    errors.finish()
}

/// Post an announcement to a course; the caller is recorded as author
pub async fn create_announcement(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<CreateAnnouncementRequest>,
) -> Result<(StatusCode, Json<Announcement>), ApiError> {
    validate_create_request(&req)?;
    let course = find_course(&state.db, &req.course_id).await?;

    let announcement = Announcement {
        id: Uuid::new_v4().to_string(),
        course_id: course.id,
        title: req.title,
        content: req.content,
        author_id: Some(user.id.clone()),
        created_at: now_timestamp(),
    };

    sqlx::query(
        r#"
        INSERT INTO announcements (id, course_id, title, content, author_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&announcement.id)
    .bind(&announcement.course_id)
    .bind(&announcement.title)
    .bind(&announcement.content)
    .bind(&announcement.author_id)
    .bind(&announcement.created_at)
    .execute(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(announcement)))
}

/// Announcements for a course, newest first
pub async fn list_announcements(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<Announcement>>, ApiError> {
    let course_id = require_uuid(&course_id, "course_id")?;

    let items = sqlx::query_as::<_, Announcement>(
        "SELECT * FROM announcements WHERE course_id = ? ORDER BY created_at DESC, rowid DESC",
    )
    .bind(&course_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(items))
}
