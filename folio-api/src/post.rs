use chrono::Utc;

use crate::{Error, Time, TopicId, UserId};

#[derive(
    Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct PostId(pub String);

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PostId {
    fn from(s: &str) -> PostId {
        PostId(String::from(s))
    }
}

/// A single user-authored message in a topic, optionally a reply to another post
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Post {
    pub id: PostId,

    /// Post this one is a reply to, `None` for a top-level post
    #[serde(default)]
    pub parent_id: Option<PostId>,

    #[serde(default)]
    pub topic_id: Option<TopicId>,

    pub content: String,
    pub author_id: UserId,
    pub created_at: Time,

    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub deleted_by_moderator: bool,
}

impl Post {
    pub fn now(id: PostId, parent_id: Option<PostId>, author_id: UserId, content: String) -> Post {
        Post {
            id,
            parent_id,
            topic_id: None,
            content,
            author_id,
            created_at: Utc::now(),
            is_deleted: false,
            deleted_by_moderator: false,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_id("id", &self.id.0)?;
        crate::validate_id("author_id", &self.author_id.0)?;
        if let Some(parent) = &self.parent_id {
            crate::validate_id("parent_id", &parent.0)?;
            if *parent == self.id {
                return Err(Error::SelfReply(self.id.clone()));
            }
        }
        if let Some(topic) = &self.topic_id {
            crate::validate_id("topic_id", &topic.0)?;
        }
        crate::validate_string(&self.content)
    }
}
