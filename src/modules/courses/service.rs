use tracing::{debug, info, instrument};

use forumhub_core::{ForumError, ForumResult};
use forumhub_db::CourseRepository;
use forumhub_models::{Course, NewCourse};

use crate::metrics;

pub struct CourseService;

impl CourseService {
    /// Returns the course named exactly `name`, creating it on first use.
    ///
    /// Two callers racing on an unseen name both end up with the same row:
    /// the loser's insert hits the unique constraint and it reads the
    /// winner's course instead.
    #[instrument(skip(courses))]
    pub async fn resolve_or_create(
        courses: &dyn CourseRepository,
        name: &str,
    ) -> ForumResult<Course> {
        if let Some(course) = courses.find_by_name(name).await? {
            return Ok(course);
        }

        match courses.insert(NewCourse::named(name)).await {
            Ok(course) => {
                metrics::track_course_created();
                info!(course_id = %course.id, "Course created");
                Ok(course)
            }
            Err(ForumError::Conflict(_)) => {
                debug!("Course created concurrently, re-reading");
                courses.find_by_name(name).await?.ok_or_else(|| {
                    ForumError::internal(format!("course {:?} vanished after conflict", name))
                })
            }
            Err(err) => Err(err),
        }
    }

    pub async fn list(courses: &dyn CourseRepository) -> ForumResult<Vec<Course>> {
        courses.list().await
    }
}
