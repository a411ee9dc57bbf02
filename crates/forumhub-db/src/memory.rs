//! In-process store.
//!
//! One [`RwLock`] guards all three tables, so a guard check and the write that
//! follows it happen under the same write lock. The lock is never held across
//! an `.await`.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures_util::stream::{self, BoxStream, StreamExt};

use forumhub_core::{ForumError, ForumResult};
use forumhub_models::{
    AuthorSummary, Course, CourseId, CourseSummary, NewCourse, NewTopic, NewUser, Topic,
    TopicChanges, TopicId, TopicRecord, User, UserCredentials, UserId,
};

use crate::ports::{CourseRepository, TopicGuard, TopicRepository, UserRepository};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, UserCredentials>,
    courses: HashMap<CourseId, Course>,
    course_names: HashMap<String, CourseId>,
    topics: HashMap<TopicId, TopicRecord>,
}

impl Tables {
    fn topic_view(&self, record: &TopicRecord) -> ForumResult<Topic> {
        let author = self
            .users
            .get(&record.author_id)
            .ok_or_else(|| ForumError::storage(format!("topic {} has no author", record.id)))?;
        let course = self
            .courses
            .get(&record.course_id)
            .ok_or_else(|| ForumError::storage(format!("topic {} has no course", record.id)))?;

        Ok(Topic {
            id: record.id,
            title: record.title.clone(),
            message: record.message.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            author: AuthorSummary {
                id: author.id,
                username: author.username.clone(),
            },
            course: CourseSummary::from(course),
        })
    }

    fn course_named(&self, name: &str) -> Option<&Course> {
        self.course_names
            .get(name)
            .and_then(|id| self.courses.get(id))
    }

    fn add_course(&mut self, course: Course) {
        self.course_names.insert(course.name.clone(), course.id);
        self.courses.insert(course.id, course);
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Next `updated_at` for a row last touched at `previous`. Always later than
/// `previous`, at the microsecond precision PostgreSQL stores.
fn advance(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    let floor = previous + Duration::microseconds(1);
    if now > floor { now } else { floor }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> ForumResult<User> {
        let mut tables = self.write();

        if tables.users.values().any(|u| u.username == user.username) {
            return Err(ForumError::conflict("Username already exists"));
        }
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(ForumError::conflict("Email already in use"));
        }

        let credentials = UserCredentials {
            id: UserId::new(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.insert(credentials.id, credentials.clone());

        Ok(credentials.into_user())
    }

    async fn find_by_id(&self, id: UserId) -> ForumResult<Option<User>> {
        Ok(self.read().users.get(&id).cloned().map(UserCredentials::into_user))
    }

    async fn find_credentials(&self, username: &str) -> ForumResult<Option<UserCredentials>> {
        Ok(self
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl CourseRepository for MemoryStore {
    async fn find_by_name(&self, name: &str) -> ForumResult<Option<Course>> {
        Ok(self.read().course_named(name).cloned())
    }

    async fn insert(&self, course: NewCourse) -> ForumResult<Course> {
        let mut tables = self.write();

        if tables.course_named(&course.name).is_some() {
            return Err(ForumError::conflict("Course already exists"));
        }

        let course = Course {
            id: CourseId::new(),
            name: course.name,
            description: course.description,
            created_at: Utc::now(),
        };
        tables.add_course(course.clone());

        Ok(course)
    }

    async fn list(&self) -> ForumResult<Vec<Course>> {
        let mut courses: Vec<Course> = self.read().courses.values().cloned().collect();
        courses.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(courses)
    }

    async fn seed(&self, courses: &[NewCourse]) -> ForumResult<u64> {
        let mut tables = self.write();
        let mut inserted = 0;

        for course in courses {
            if tables.course_named(&course.name).is_some() {
                continue;
            }
            let course = Course {
                id: CourseId::new(),
                name: course.name.clone(),
                description: course.description.clone(),
                created_at: Utc::now(),
            };
            tables.add_course(course);
            inserted += 1;
        }

        Ok(inserted)
    }
}

#[async_trait]
impl TopicRepository for MemoryStore {
    async fn create(&self, topic: NewTopic) -> ForumResult<Topic> {
        let mut tables = self.write();

        if !tables.users.contains_key(&topic.author_id) {
            return Err(ForumError::not_found("User not found"));
        }
        if !tables.courses.contains_key(&topic.course_id) {
            return Err(ForumError::not_found("Course not found"));
        }

        let now = Utc::now();
        let record = TopicRecord {
            id: TopicId::new(),
            title: topic.title,
            message: topic.message,
            author_id: topic.author_id,
            course_id: topic.course_id,
            created_at: now,
            updated_at: now,
        };
        let view = tables.topic_view(&record)?;
        tables.topics.insert(record.id, record);

        Ok(view)
    }

    async fn find_by_id(&self, id: TopicId) -> ForumResult<Option<Topic>> {
        let tables = self.read();
        tables
            .topics
            .get(&id)
            .map(|record| tables.topic_view(record))
            .transpose()
    }

    async fn find_record(&self, id: TopicId) -> ForumResult<Option<TopicRecord>> {
        Ok(self.read().topics.get(&id).cloned())
    }

    fn list(&self) -> BoxStream<'_, ForumResult<Topic>> {
        let tables = self.read();
        let mut records: Vec<&TopicRecord> = tables.topics.values().collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        let topics: Vec<ForumResult<Topic>> = records
            .into_iter()
            .map(|record| tables.topic_view(record))
            .collect();

        stream::iter(topics).boxed()
    }

    async fn update(
        &self,
        id: TopicId,
        changes: TopicChanges,
        guard: TopicGuard<'_>,
    ) -> ForumResult<Topic> {
        let mut tables = self.write();

        let current = tables
            .topics
            .get(&id)
            .cloned()
            .ok_or_else(|| ForumError::not_found("Topic not found"))?;
        guard(&current)?;

        if let Some(course_id) = changes.course_id {
            if !tables.courses.contains_key(&course_id) {
                return Err(ForumError::not_found("Course not found"));
            }
        }

        let mut updated = current;
        if let Some(title) = changes.title {
            updated.title = title;
        }
        if let Some(message) = changes.message {
            updated.message = message;
        }
        if let Some(course_id) = changes.course_id {
            updated.course_id = course_id;
        }
        updated.updated_at = advance(updated.updated_at);

        let view = tables.topic_view(&updated)?;
        tables.topics.insert(id, updated);

        Ok(view)
    }

    async fn delete(&self, id: TopicId, guard: TopicGuard<'_>) -> ForumResult<()> {
        let mut tables = self.write();

        let current = tables
            .topics
            .get(&id)
            .ok_or_else(|| ForumError::not_found("Topic not found"))?;
        guard(current)?;
        tables.topics.remove(&id);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures_util::TryStreamExt;

    use super::*;

    fn allow(_: &TopicRecord) -> ForumResult<()> {
        Ok(())
    }

    async fn seed_user(store: &MemoryStore, username: &str) -> User {
        UserRepository::create(
            store,
            NewUser {
                username: username.to_string(),
                email: format!("{}@x.com", username),
                password_hash: "digest".to_string(),
            },
        )
        .await
        .unwrap()
    }

    async fn seed_topic(store: &MemoryStore, author: &User, title: &str) -> Topic {
        let course = match store.find_by_name("Python").await.unwrap() {
            Some(course) => course,
            None => store.insert(NewCourse::named("Python")).await.unwrap(),
        };

        TopicRepository::create(
            store,
            NewTopic {
                title: title.to_string(),
                message: "A long enough message".to_string(),
                author_id: author.id,
                course_id: course.id,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = MemoryStore::new();
        seed_user(&store, "alice").await;

        let err = UserRepository::create(
            &store,
            NewUser {
                username: "alice".to_string(),
                email: "other@x.com".to_string(),
                password_hash: "digest".to_string(),
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err, ForumError::conflict("Username already exists"));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        seed_user(&store, "alice").await;

        let err = UserRepository::create(
            &store,
            NewUser {
                username: "bob".to_string(),
                email: "alice@x.com".to_string(),
                password_hash: "digest".to_string(),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ForumError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_find_credentials_is_case_sensitive() {
        let store = MemoryStore::new();
        seed_user(&store, "alice").await;

        assert!(store.find_credentials("alice").await.unwrap().is_some());
        assert!(store.find_credentials("Alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_course_insert_conflicts_on_exact_name_only() {
        let store = MemoryStore::new();
        store.insert(NewCourse::named("Java")).await.unwrap();

        assert!(matches!(
            store.insert(NewCourse::named("Java")).await,
            Err(ForumError::Conflict(_))
        ));
        assert!(store.insert(NewCourse::named("java")).await.is_ok());
        assert!(store.insert(NewCourse::named("Java ")).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_course_inserts_create_one_row() {
        let store = Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.insert(NewCourse::named("Java")).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(err) => assert!(matches!(err, ForumError::Conflict(_))),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(CourseRepository::list(&*store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = MemoryStore::new();
        store.insert(NewCourse::named("Python")).await.unwrap();

        let courses = crate::default_courses();
        let first = store.seed(&courses).await.unwrap();
        let second = store.seed(&courses).await.unwrap();

        assert_eq!(first as usize, courses.len() - 1);
        assert_eq!(second, 0);

        let names: Vec<String> = CourseRepository::list(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[tokio::test]
    async fn test_seeded_and_inserted_courses_are_found_by_name() {
        let store = MemoryStore::new();
        let inserted = store.insert(NewCourse::named("Rust")).await.unwrap();
        store.seed(&crate::default_courses()).await.unwrap();

        for course in CourseRepository::list(&store).await.unwrap() {
            let found = store.find_by_name(&course.name).await.unwrap().unwrap();
            assert_eq!(found.id, course.id);
        }
        assert_eq!(
            store.find_by_name("Rust").await.unwrap().unwrap().id,
            inserted.id
        );
        assert!(store.find_by_name("rust").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_topic_sets_equal_timestamps() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let topic = seed_topic(&store, &alice, "Hello world").await;

        assert_eq!(topic.created_at, topic.updated_at);
        assert_eq!(topic.author.username, "alice");
        assert_eq!(topic.course.name, "Python");
    }

    #[tokio::test]
    async fn test_create_topic_requires_existing_author() {
        let store = MemoryStore::new();
        let course = store.insert(NewCourse::named("Python")).await.unwrap();

        let err = TopicRepository::create(
            &store,
            NewTopic {
                title: "Hello world".to_string(),
                message: "A long enough message".to_string(),
                author_id: UserId::new(),
                course_id: course.id,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ForumError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let first = seed_topic(&store, &alice, "First topic").await;
        let second = seed_topic(&store, &alice, "Second topic").await;

        let topics: Vec<Topic> = TopicRepository::list(&store).try_collect().await.unwrap();

        assert_eq!(topics.len(), 2);
        if first.created_at == second.created_at {
            assert!(topics[0].id > topics[1].id);
        } else {
            assert_eq!(topics[0].id, second.id);
            assert_eq!(topics[1].id, first.id);
        }
    }

    #[tokio::test]
    async fn test_update_advances_updated_at() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let topic = seed_topic(&store, &alice, "Hello world").await;

        let changes = TopicChanges {
            message: Some("A brand new message".to_string()),
            ..Default::default()
        };
        let updated = store.update(topic.id, changes, &allow).await.unwrap();

        assert_eq!(updated.title, topic.title);
        assert_eq!(updated.course, topic.course);
        assert_eq!(updated.message, "A brand new message");
        assert!(updated.updated_at > topic.updated_at);
        assert_eq!(updated.created_at, topic.created_at);
    }

    #[tokio::test]
    async fn test_guard_rejection_leaves_topic_unchanged() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let topic = seed_topic(&store, &alice, "Hello world").await;

        let deny = |_: &TopicRecord| -> ForumResult<()> { Err(ForumError::forbidden("no")) };
        let changes = TopicChanges {
            title: Some("Hijacked title".to_string()),
            ..Default::default()
        };

        assert_eq!(
            store.update(topic.id, changes, &deny).await.unwrap_err(),
            ForumError::forbidden("no")
        );
        assert_eq!(
            store.delete(topic.id, &deny).await.unwrap_err(),
            ForumError::forbidden("no")
        );

        let stored = TopicRepository::find_by_id(&store, topic.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, topic);
    }

    #[tokio::test]
    async fn test_missing_topic_is_not_found_before_guard() {
        let store = MemoryStore::new();
        let deny = |_: &TopicRecord| -> ForumResult<()> { Err(ForumError::forbidden("no")) };

        assert!(matches!(
            store.delete(TopicId::new(), &deny).await,
            Err(ForumError::NotFound(_))
        ));
        assert!(matches!(
            store
                .update(TopicId::new(), TopicChanges::default(), &deny)
                .await,
            Err(ForumError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_topic() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let topic = seed_topic(&store, &alice, "Hello world").await;

        store.delete(topic.id, &allow).await.unwrap();

        assert!(
            TopicRepository::find_by_id(&store, topic.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_advance_is_strictly_later() {
        let future = Utc::now() + Duration::hours(1);
        assert_eq!(advance(future), future + Duration::microseconds(1));
        let past = Utc::now() - Duration::hours(1);
        assert!(advance(past) > past + Duration::minutes(59));
    }
}
