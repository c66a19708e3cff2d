mod announcements;
mod attendance;
pub mod auth;
mod courses;
mod dashboard;
mod enrollments;
pub mod error;
mod extract;
mod grades;
mod system;
mod validation;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::CorsConfig;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (register/login are public, /me checks the token)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me));

    // Handlers that need a caller take a `CurrentUser` extractor
    let api_routes = Router::new()
        // Courses
        .route("/courses", get(courses::list_courses).post(courses::create_course))
        // Enrollment
        .route("/enroll", post(enrollments::enroll))
        .route("/my/courses", get(enrollments::my_courses))
        // Attendance
        .route("/attendance/mark", post(attendance::mark_attendance))
        .route("/attendance/:course_id", get(attendance::list_attendance))
        // Grades
        .route("/grades", post(grades::add_grade))
        .route("/grades/:course_id", get(grades::list_grades))
        // Announcements
        .route("/announcements", post(announcements::create_announcement))
        .route("/announcements/:course_id", get(announcements::list_announcements))
        // Dashboard
        .route("/dashboard", get(dashboard::dashboard));

    let cors = cors_layer(&state.config.cors);

    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/test", get(system::diagnostics))
        .route("/seed", post(system::seed))
        .nest("/auth", auth_routes)
        .merge(api_routes)
        .fallback(error::not_found_fallback)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
