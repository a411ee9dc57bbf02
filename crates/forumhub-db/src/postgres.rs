//! PostgreSQL store.
//!
//! ## Error mapping
//!
//! | PostgreSQL | ForumError |
//! |---|---|
//! | `23505` unique violation | `Conflict`, message chosen by constraint name |
//! | `23503` foreign key violation | `NotFound` |
//! | anything else | `Storage` |
//!
//! Topic mutations lock the row with `SELECT … FOR UPDATE` inside a
//! transaction, run the caller's guard against it and only then write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::{BoxStream, StreamExt};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use forumhub_core::{ForumError, ForumResult};
use forumhub_models::{
    AuthorSummary, Course, CourseId, CourseSummary, NewCourse, NewTopic, NewUser, Topic,
    TopicChanges, TopicId, TopicRecord, User, UserCredentials, UserId,
};

use crate::ports::{CourseRepository, TopicGuard, TopicRepository, UserRepository};

macro_rules! topic_select {
    () => {
        r#"
        SELECT t.id, t.title, t.message, t.created_at, t.updated_at,
               u.id AS author_id, u.username AS author_username,
               c.id AS course_id, c.name AS course_name
        FROM topics t
        JOIN users u ON u.id = t.author_id
        JOIN courses c ON c.id = t.course_id
        "#
    };
}

const SELECT_TOPIC_BY_ID: &str = concat!(topic_select!(), "WHERE t.id = $1");
const SELECT_TOPICS: &str = concat!(topic_select!(), "ORDER BY t.created_at DESC, t.id DESC");

const LOCK_TOPIC: &str = r#"
    SELECT id, title, message, author_id, course_id, created_at, updated_at
    FROM topics
    WHERE id = $1
    FOR UPDATE
"#;

/// Flat row of the topic/author/course join.
#[derive(FromRow)]
struct TopicRow {
    id: TopicId,
    title: String,
    message: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_id: UserId,
    author_username: String,
    course_id: CourseId,
    course_name: String,
}

impl From<TopicRow> for Topic {
    fn from(row: TopicRow) -> Self {
        Topic {
            id: row.id,
            title: row.title,
            message: row.message,
            created_at: row.created_at,
            updated_at: row.updated_at,
            author: AuthorSummary {
                id: row.author_id,
                username: row.author_username,
            },
            course: CourseSummary {
                id: row.course_id,
                name: row.course_name,
            },
        }
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> ForumError {
    if let sqlx::Error::Database(db_err) = &err {
        debug!(
            operation,
            code = ?db_err.code(),
            constraint = ?db_err.constraint(),
            "database operation failed"
        );

        match db_err.code().as_deref() {
            Some("23505") => {
                return ForumError::conflict(match db_err.constraint() {
                    Some("users_username_key") => "Username already exists",
                    Some("users_email_key") => "Email already in use",
                    Some("courses_name_key") => "Course already exists",
                    _ => "Record already exists",
                });
            }
            Some("23503") => return ForumError::not_found("Referenced record not found"),
            _ => {}
        }
    }

    ForumError::storage(format!("{}: {}", operation, err))
}

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock_topic(
        tx: &mut Transaction<'_, Postgres>,
        id: TopicId,
    ) -> ForumResult<TopicRecord> {
        sqlx::query_as::<_, TopicRecord>(LOCK_TOPIC)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("lock_topic", e))?
            .ok_or_else(|| ForumError::not_found("Topic not found"))
    }

    async fn topic_view(tx: &mut Transaction<'_, Postgres>, id: TopicId) -> ForumResult<Topic> {
        sqlx::query_as::<_, TopicRow>(SELECT_TOPIC_BY_ID)
            .bind(id)
            .fetch_one(&mut **tx)
            .await
            .map(Topic::from)
            .map_err(|e| map_sqlx_error("topic_view", e))
    }
}

#[async_trait]
impl UserRepository for PgStore {
    #[instrument(skip(self, user), fields(username = %user.username), err)]
    async fn create(&self, user: NewUser) -> ForumResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))
    }

    async fn find_by_id(&self, id: UserId) -> ForumResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user", e))
    }

    async fn find_credentials(&self, username: &str) -> ForumResult<Option<UserCredentials>> {
        sqlx::query_as::<_, UserCredentials>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_credentials", e))
    }
}

#[async_trait]
impl CourseRepository for PgStore {
    async fn find_by_name(&self, name: &str) -> ForumResult<Option<Course>> {
        sqlx::query_as::<_, Course>(
            "SELECT id, name, description, created_at FROM courses WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_course", e))
    }

    #[instrument(skip(self, course), fields(name = %course.name), err)]
    async fn insert(&self, course: NewCourse) -> ForumResult<Course> {
        sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(&course.name)
        .bind(&course.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_course", e))
    }

    async fn list(&self) -> ForumResult<Vec<Course>> {
        sqlx::query_as::<_, Course>(
            "SELECT id, name, description, created_at FROM courses ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_courses", e))
    }

    #[instrument(skip(self, courses), fields(count = courses.len()), err)]
    async fn seed(&self, courses: &[NewCourse]) -> ForumResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("seed_courses", e))?;
        let mut inserted = 0;

        for course in courses {
            let result = sqlx::query(
                r#"
                INSERT INTO courses (name, description)
                VALUES ($1, $2)
                ON CONFLICT (name) DO NOTHING
                "#,
            )
            .bind(&course.name)
            .bind(&course.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("seed_courses", e))?;
            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("seed_courses", e))?;

        Ok(inserted)
    }
}

#[async_trait]
impl TopicRepository for PgStore {
    #[instrument(skip(self, topic), fields(author_id = %topic.author_id), err)]
    async fn create(&self, topic: NewTopic) -> ForumResult<Topic> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("create_topic", e))?;

        let id: TopicId = sqlx::query_scalar(
            r#"
            INSERT INTO topics (title, message, author_id, course_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&topic.title)
        .bind(&topic.message)
        .bind(topic.author_id)
        .bind(topic.course_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_topic", e))?;

        let view = Self::topic_view(&mut tx, id).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create_topic", e))?;

        Ok(view)
    }

    async fn find_by_id(&self, id: TopicId) -> ForumResult<Option<Topic>> {
        sqlx::query_as::<_, TopicRow>(SELECT_TOPIC_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(Topic::from))
            .map_err(|e| map_sqlx_error("find_topic", e))
    }

    async fn find_record(&self, id: TopicId) -> ForumResult<Option<TopicRecord>> {
        sqlx::query_as::<_, TopicRecord>(
            r#"
            SELECT id, title, message, author_id, course_id, created_at, updated_at
            FROM topics
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_topic_record", e))
    }

    fn list(&self) -> BoxStream<'_, ForumResult<Topic>> {
        sqlx::query_as::<_, TopicRow>(SELECT_TOPICS)
            .fetch(&self.pool)
            .map(|row| {
                row.map(Topic::from)
                    .map_err(|e| map_sqlx_error("list_topics", e))
            })
            .boxed()
    }

    #[instrument(skip(self, changes, guard), err)]
    async fn update(
        &self,
        id: TopicId,
        changes: TopicChanges,
        guard: TopicGuard<'_>,
    ) -> ForumResult<Topic> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update_topic", e))?;

        let current = Self::lock_topic(&mut tx, id).await?;
        guard(&current)?;

        sqlx::query(
            r#"
            UPDATE topics
            SET title = COALESCE($2, title),
                message = COALESCE($3, message),
                course_id = COALESCE($4, course_id),
                updated_at = GREATEST(NOW(), updated_at + INTERVAL '1 microsecond')
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.message)
        .bind(changes.course_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_topic", e))?;

        let view = Self::topic_view(&mut tx, id).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("update_topic", e))?;

        Ok(view)
    }

    #[instrument(skip(self, guard), err)]
    async fn delete(&self, id: TopicId, guard: TopicGuard<'_>) -> ForumResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("delete_topic", e))?;

        let current = Self::lock_topic(&mut tx, id).await?;
        guard(&current)?;

        sqlx::query("DELETE FROM topics WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_topic", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("delete_topic", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::TryStreamExt;

    use super::*;

    fn allow(_: &TopicRecord) -> ForumResult<()> {
        Ok(())
    }

    async fn create_test_user(store: &PgStore, username: &str) -> User {
        UserRepository::create(
            store,
            NewUser {
                username: username.to_string(),
                email: format!("{}@x.com", username),
                password_hash: "hashed".to_string(),
            },
        )
        .await
        .unwrap()
    }

    async fn create_test_topic(store: &PgStore, author: &User, course: &str) -> Topic {
        let course = match store.find_by_name(course).await.unwrap() {
            Some(course) => course,
            None => store.insert(NewCourse::named(course)).await.unwrap(),
        };

        TopicRepository::create(
            store,
            NewTopic {
                title: "Hello world".to_string(),
                message: "A long enough message".to_string(),
                author_id: author.id,
                course_id: course.id,
            },
        )
        .await
        .unwrap()
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a running PostgreSQL at DATABASE_URL"]
    async fn test_duplicate_username_maps_to_conflict(pool: PgPool) {
        let store = PgStore::new(pool);
        create_test_user(&store, "alice").await;

        let err = UserRepository::create(
            &store,
            NewUser {
                username: "alice".to_string(),
                email: "other@x.com".to_string(),
                password_hash: "hashed".to_string(),
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err, ForumError::conflict("Username already exists"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a running PostgreSQL at DATABASE_URL"]
    async fn test_longest_valid_email_fits(pool: PgPool) {
        let store = PgStore::new(pool);
        let domain = vec!["b".repeat(60); 3].join(".");
        let email = format!("{}@{}.com", "a".repeat(64), domain);

        let user = UserRepository::create(
            &store,
            NewUser {
                username: "alice".to_string(),
                email: email.clone(),
                password_hash: "hashed".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(user.email, email);
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a running PostgreSQL at DATABASE_URL"]
    async fn test_duplicate_course_maps_to_conflict(pool: PgPool) {
        let store = PgStore::new(pool);
        store.insert(NewCourse::named("Java")).await.unwrap();

        let err = store.insert(NewCourse::named("Java")).await.unwrap_err();
        assert_eq!(err, ForumError::conflict("Course already exists"));
        assert!(store.insert(NewCourse::named("java")).await.is_ok());
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a running PostgreSQL at DATABASE_URL"]
    async fn test_seed_courses_is_idempotent(pool: PgPool) {
        let store = PgStore::new(pool);
        let courses = crate::default_courses();

        assert_eq!(store.seed(&courses).await.unwrap() as usize, courses.len());
        assert_eq!(store.seed(&courses).await.unwrap(), 0);
        assert_eq!(
            CourseRepository::list(&store).await.unwrap().len(),
            courses.len()
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a running PostgreSQL at DATABASE_URL"]
    async fn test_topic_lifecycle(pool: PgPool) {
        let store = PgStore::new(pool);
        let alice = create_test_user(&store, "alice").await;
        let topic = create_test_topic(&store, &alice, "Python").await;

        assert_eq!(topic.created_at, topic.updated_at);
        assert_eq!(topic.author.username, "alice");
        assert_eq!(topic.course.name, "Python");

        let changes = TopicChanges {
            message: Some("A brand new message".to_string()),
            ..Default::default()
        };
        let updated = store.update(topic.id, changes, &allow).await.unwrap();
        assert_eq!(updated.title, topic.title);
        assert_eq!(updated.course, topic.course);
        assert!(updated.updated_at > topic.updated_at);

        let listed: Vec<Topic> = TopicRepository::list(&store).try_collect().await.unwrap();
        assert_eq!(listed.len(), 1);

        store.delete(topic.id, &allow).await.unwrap();
        assert!(
            TopicRepository::find_by_id(&store, topic.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a running PostgreSQL at DATABASE_URL"]
    async fn test_guard_rejection_rolls_back(pool: PgPool) {
        let store = PgStore::new(pool);
        let alice = create_test_user(&store, "alice").await;
        let topic = create_test_topic(&store, &alice, "Python").await;

        let deny = |_: &TopicRecord| -> ForumResult<()> { Err(ForumError::forbidden("no")) };
        let changes = TopicChanges {
            title: Some("Hijacked title".to_string()),
            ..Default::default()
        };

        assert!(matches!(
            store.update(topic.id, changes, &deny).await,
            Err(ForumError::Forbidden(_))
        ));
        assert!(matches!(
            store.delete(topic.id, &deny).await,
            Err(ForumError::Forbidden(_))
        ));

        let stored = TopicRepository::find_by_id(&store, topic.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, topic);
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a running PostgreSQL at DATABASE_URL"]
    async fn test_missing_topic_is_not_found(pool: PgPool) {
        let store = PgStore::new(pool);

        assert!(matches!(
            store.delete(TopicId::new(), &allow).await,
            Err(ForumError::NotFound(_))
        ));
    }
}
