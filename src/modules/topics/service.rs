use futures_util::TryStreamExt;
use tracing::{info, instrument};

use forumhub_core::{ForumError, ForumResult};
use forumhub_models::{
    CreateTopicRequest, NewTopic, Topic, TopicChanges, TopicId, TopicRecord, UpdateTopicRequest,
    UserId,
};

use crate::metrics;
use crate::modules::courses::CourseService;
use crate::state::AppState;

use super::policy::{TopicAction, authorize};

pub struct TopicService;

fn topic_not_found() -> ForumError {
    ForumError::not_found("Topic not found")
}

impl TopicService {
    #[instrument(skip(state, dto), fields(course = %dto.course_name))]
    pub async fn create(
        state: &AppState,
        actor: UserId,
        dto: CreateTopicRequest,
    ) -> ForumResult<Topic> {
        authorize(Some(actor), None, TopicAction::Create).into_result(TopicAction::Create)?;

        // The token may outlive its user.
        if state.users.find_by_id(actor).await?.is_none() {
            return Err(ForumError::not_found("User not found"));
        }

        let course = CourseService::resolve_or_create(state.courses.as_ref(), &dto.course_name)
            .await?;

        let topic = state
            .topics
            .create(NewTopic {
                title: dto.title,
                message: dto.message,
                author_id: actor,
                course_id: course.id,
            })
            .await?;

        metrics::track_topic_created();
        info!(topic_id = %topic.id, "Topic created");

        Ok(topic)
    }

    #[instrument(skip(state))]
    pub async fn get(state: &AppState, id: TopicId) -> ForumResult<Topic> {
        state
            .topics
            .find_by_id(id)
            .await?
            .ok_or_else(topic_not_found)
    }

    /// Every topic, newest first.
    #[instrument(skip(state))]
    pub async fn list(state: &AppState) -> ForumResult<Vec<Topic>> {
        state.topics.list().try_collect().await
    }

    /// Applies a partial update on behalf of `actor`.
    ///
    /// Existence and ownership are checked before the named course is
    /// resolved, so a rejected update never creates a course. An update with
    /// no fields returns the topic as it is.
    #[instrument(skip(state, dto))]
    pub async fn update(
        state: &AppState,
        actor: UserId,
        id: TopicId,
        dto: UpdateTopicRequest,
    ) -> ForumResult<Topic> {
        let record = state
            .topics
            .find_record(id)
            .await?
            .ok_or_else(topic_not_found)?;
        authorize(Some(actor), Some(record.author_id), TopicAction::Update)
            .into_result(TopicAction::Update)?;

        let course_id = match dto.course_name.as_deref() {
            Some(name) => Some(
                CourseService::resolve_or_create(state.courses.as_ref(), name)
                    .await?
                    .id,
            ),
            None => None,
        };

        let changes = TopicChanges {
            title: dto.title,
            message: dto.message,
            course_id,
        };
        if changes.is_empty() {
            return Self::get(state, id).await;
        }

        let guard = move |locked: &TopicRecord| {
            authorize(Some(actor), Some(locked.author_id), TopicAction::Update)
                .into_result(TopicAction::Update)
        };
        let topic = state.topics.update(id, changes, &guard).await?;

        metrics::track_topic_updated();
        info!(topic_id = %topic.id, "Topic updated");

        Ok(topic)
    }

    #[instrument(skip(state))]
    pub async fn delete(state: &AppState, actor: UserId, id: TopicId) -> ForumResult<()> {
        let guard = move |locked: &TopicRecord| {
            authorize(Some(actor), Some(locked.author_id), TopicAction::Delete)
                .into_result(TopicAction::Delete)
        };
        state.topics.delete(id, &guard).await?;

        metrics::track_topic_deleted();
        info!(topic_id = %id, "Topic deleted");

        Ok(())
    }
}
