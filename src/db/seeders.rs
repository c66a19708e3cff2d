//! Database seeders for demo data

use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use super::{now_timestamp, Course};

/// Result of a seed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded(usize),
    AlreadySeeded,
}

/// Insert the demo course catalogue, unless any course already exists
pub async fn seed_demo_courses(pool: &SqlitePool) -> Result<SeedOutcome, sqlx::Error> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM courses")
        .fetch_one(pool)
        .await?;
    if count.0 > 0 {
        return Ok(SeedOutcome::AlreadySeeded);
    }

    // (code, title, description, instructor)
    let demo: [(&str, &str, &str, &str); 3] = [
        ("CS101", "Intro to Programming", "Learn Python basics", "Dr. Ada"),
        ("CS201", "Data Structures", "Arrays, Trees, Graphs", "Dr. Knuth"),
        ("CS301", "Databases", "SQL/NoSQL fundamentals", "Dr. Codd"),
    ];

    let mut tx = pool.begin().await?;
    for (code, title, description, instructor) in demo {
        let now = now_timestamp();
        let course = Course {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            title: title.to_string(),
            description: Some(description.to_string()),
            instructor: Some(instructor.to_string()),
            capacity: Some(100),
            created_at: now.clone(),
            updated_at: now,
        };
        sqlx::query(
            r#"
            INSERT INTO courses (id, code, title, description, instructor, capacity, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&course.id)
        .bind(&course.code)
        .bind(&course.title)
        .bind(&course.description)
        .bind(&course.instructor)
        .bind(course.capacity)
        .bind(&course.created_at)
        .bind(&course.updated_at)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!("Seeded {} demo courses", demo.len());
    Ok(SeedOutcome::Seeded(demo.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory;

    #[tokio::test]
    async fn test_seed_runs_once() {
        let pool = init_memory().await.unwrap();

        assert_eq!(seed_demo_courses(&pool).await.unwrap(), SeedOutcome::Seeded(3));
        assert_eq!(seed_demo_courses(&pool).await.unwrap(), SeedOutcome::AlreadySeeded);

        let codes: Vec<(String,)> = sqlx::query_as("SELECT code FROM courses ORDER BY code")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(
            codes.into_iter().map(|(c,)| c).collect::<Vec<_>>(),
            vec!["CS101", "CS201", "CS301"]
        );
    }
}
