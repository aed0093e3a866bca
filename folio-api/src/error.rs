use crate::PostId;

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    #[error("Empty identifier in field {0}")]
    EmptyId(&'static str),

    #[error("Post {0} is marked as a reply to itself")]
    SelfReply(PostId),
}
