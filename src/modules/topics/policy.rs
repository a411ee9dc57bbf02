//! The ownership rule for topics.
//!
//! [`authorize`] is a pure function of who is asking, who owns the topic and
//! what they want to do. Services consult it before any write, and the
//! stores consult it again against the locked row.

use forumhub_core::{AuthError, ForumError, ForumResult};
use forumhub_models::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicAction {
    Read,
    List,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    NotOwner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(DenyReason),
}

/// `owner` is the topic's author; it is `None` only for `Create` and `List`.
pub fn authorize(actor: Option<UserId>, owner: Option<UserId>, action: TopicAction) -> Decision {
    match action {
        TopicAction::Read | TopicAction::List => Decision::Allowed,
        TopicAction::Create => match actor {
            Some(_) => Decision::Allowed,
            None => Decision::Denied(DenyReason::Unauthenticated),
        },
        TopicAction::Update | TopicAction::Delete => match actor {
            None => Decision::Denied(DenyReason::Unauthenticated),
            Some(actor) if owner == Some(actor) => Decision::Allowed,
            Some(_) => Decision::Denied(DenyReason::NotOwner),
        },
    }
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allowed
    }

    pub fn into_result(self, action: TopicAction) -> ForumResult<()> {
        match self {
            Decision::Allowed => Ok(()),
            Decision::Denied(DenyReason::Unauthenticated) => Err(AuthError::TokenMissing.into()),
            Decision::Denied(DenyReason::NotOwner) => Err(ForumError::forbidden(match action {
                TopicAction::Delete => "You do not have permission to delete this topic",
                _ => "You do not have permission to edit this topic",
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_are_always_allowed() {
        let owner = Some(UserId::new());
        for action in [TopicAction::Read, TopicAction::List] {
            assert!(authorize(None, owner, action).is_allowed());
            assert!(authorize(Some(UserId::new()), owner, action).is_allowed());
        }
    }

    #[test]
    fn test_create_requires_actor() {
        assert!(authorize(Some(UserId::new()), None, TopicAction::Create).is_allowed());
        assert_eq!(
            authorize(None, None, TopicAction::Create),
            Decision::Denied(DenyReason::Unauthenticated)
        );
    }

    #[test]
    fn test_only_owner_may_mutate() {
        let owner = UserId::new();
        let stranger = UserId::new();

        for action in [TopicAction::Update, TopicAction::Delete] {
            assert!(authorize(Some(owner), Some(owner), action).is_allowed());
            assert_eq!(
                authorize(Some(stranger), Some(owner), action),
                Decision::Denied(DenyReason::NotOwner)
            );
            assert_eq!(
                authorize(None, Some(owner), action),
                Decision::Denied(DenyReason::Unauthenticated)
            );
        }
    }

    #[test]
    fn test_denials_map_to_errors() {
        assert_eq!(
            Decision::Denied(DenyReason::NotOwner)
                .into_result(TopicAction::Delete)
                .unwrap_err(),
            ForumError::forbidden("You do not have permission to delete this topic")
        );
        assert_eq!(
            Decision::Denied(DenyReason::Unauthenticated)
                .into_result(TopicAction::Update)
                .unwrap_err(),
            ForumError::Auth(AuthError::TokenMissing)
        );
        assert!(Decision::Allowed.into_result(TopicAction::Update).is_ok());
    }
}
