use crate::api::Post;

pub const DELETED_PLACEHOLDER: &str = "[deleted]";
pub const REMOVED_PLACEHOLDER: &str = "[removed by moderator]";

/// Soft-deletion state of a post, as shown to readers
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Moderation {
    Visible,
    DeletedByAuthor,
    RemovedByModerator,
}

impl Moderation {
    pub fn of(post: &Post) -> Moderation {
        match (post.deleted_by_moderator, post.is_deleted) {
            (true, _) => Moderation::RemovedByModerator,
            (false, true) => Moderation::DeletedByAuthor,
            (false, false) => Moderation::Visible,
        }
    }

    pub fn is_visible(&self) -> bool {
        *self == Moderation::Visible
    }
}

/// Text to render in place of the post body
pub fn display_content(post: &Post) -> &str {
    match Moderation::of(post) {
        Moderation::Visible => &post.content,
        Moderation::DeletedByAuthor => DELETED_PLACEHOLDER,
        Moderation::RemovedByModerator => REMOVED_PLACEHOLDER,
    }
}
