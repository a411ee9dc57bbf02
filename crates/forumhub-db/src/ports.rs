//! Repository ports.
//!
//! Services hold these as `Arc<dyn …>` so the same code runs against
//! PostgreSQL and against the in-process store.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use forumhub_core::ForumResult;
use forumhub_models::{
    Course, NewCourse, NewTopic, NewUser, Topic, TopicChanges, TopicId, TopicRecord, User,
    UserCredentials, UserId,
};

/// Check run against the locked topic row before a mutation is written.
///
/// Returning an error aborts the mutation and leaves the topic untouched.
pub type TopicGuard<'a> = &'a (dyn Fn(&TopicRecord) -> ForumResult<()> + Send + Sync);

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user.
    ///
    /// Fails with `Conflict` when the username or the email is already taken.
    async fn create(&self, user: NewUser) -> ForumResult<User>;

    async fn find_by_id(&self, id: UserId) -> ForumResult<Option<User>>;

    /// Looks a user up by exact username, digest included.
    async fn find_credentials(&self, username: &str) -> ForumResult<Option<UserCredentials>>;
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Exact, case-sensitive lookup.
    async fn find_by_name(&self, name: &str) -> ForumResult<Option<Course>>;

    /// Inserts a course. Fails with `Conflict` when the name already exists.
    async fn insert(&self, course: NewCourse) -> ForumResult<Course>;

    /// All courses ordered by name.
    async fn list(&self) -> ForumResult<Vec<Course>>;

    /// Inserts every course whose name is not taken yet and returns how many
    /// were added.
    async fn seed(&self, courses: &[NewCourse]) -> ForumResult<u64>;
}

#[async_trait]
pub trait TopicRepository: Send + Sync {
    async fn create(&self, topic: NewTopic) -> ForumResult<Topic>;

    async fn find_by_id(&self, id: TopicId) -> ForumResult<Option<Topic>>;

    async fn find_record(&self, id: TopicId) -> ForumResult<Option<TopicRecord>>;

    /// Topics newest first; ties on `created_at` are broken by id, descending.
    fn list(&self) -> BoxStream<'_, ForumResult<Topic>>;

    /// Applies `changes` and advances `updated_at`.
    ///
    /// The row is locked for the duration of the call. `guard` sees the locked
    /// row; an error from it is returned as is. A missing topic is `NotFound`.
    async fn update(
        &self,
        id: TopicId,
        changes: TopicChanges,
        guard: TopicGuard<'_>,
    ) -> ForumResult<Topic>;

    /// Hard-deletes the topic under the same locking and guard rules as
    /// [`TopicRepository::update`].
    async fn delete(&self, id: TopicId, guard: TopicGuard<'_>) -> ForumResult<()>;
}
