mod collapse;
pub use collapse::{reset_topic_collapse_state, visible_rows, CollapseState, DEFAULT_KEY_PREFIX};

mod moderation;
pub use moderation::{display_content, Moderation, DELETED_PLACEHOLDER, REMOVED_PLACEHOLDER};

mod session;
pub use session::{MemoryStore, SessionStore};

mod thread;
pub use thread::{
    build_threaded_posts, count_posts, find_orphans, thread_rows, Iter, OrphanPolicy,
    ThreadBuilder, ThreadRow, ThreadedPost, MAX_SERIALIZED_NESTING,
};

pub mod api {
    pub use folio_api::*;
}
