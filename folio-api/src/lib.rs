use chrono::Utc;

mod error;
pub use error::Error;

mod post;
pub use post::{Post, PostId};

mod topic;
pub use topic::TopicId;

mod user;
pub use user::UserId;

pub type Time = chrono::DateTime<Utc>;

pub const STUB_ID: &str = "ffffffff-ffff-ffff-ffff-ffffffffffff";

// Postgres text columns reject null bytes
pub fn validate_string(s: &str) -> Result<(), Error> {
    match s.contains('\0') {
        true => Err(Error::NullByteInString(String::from(s))),
        false => Ok(()),
    }
}

pub fn validate_id(field: &'static str, id: &str) -> Result<(), Error> {
    if id.is_empty() {
        return Err(Error::EmptyId(field));
    }
    validate_string(id)
}
