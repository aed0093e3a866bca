use std::collections::BTreeSet;

use crate::{
    api::{PostId, TopicId},
    SessionStore, ThreadedPost,
};

pub const DEFAULT_KEY_PREFIX: &str = "discussion";

const COLLAPSED: &str = "1";

/// Forgets which subtrees of a topic the viewer collapsed
///
/// Removes every session key starting with `{key_prefix}-{topic_id}`. Without a session
/// store (headless rendering) this does nothing. Store failures are logged and ignored,
/// the page stays usable with stale collapse state.
pub fn reset_topic_collapse_state(
    store: Option<&mut dyn SessionStore>,
    topic_id: &TopicId,
    key_prefix: &str,
) {
    let store = match store {
        Some(s) => s,
        None => return,
    };
    let prefix = format!("{key_prefix}-{topic_id}");
    let keys = match store.keys() {
        Ok(keys) => keys,
        Err(err) => {
            tracing::warn!(?err, %topic_id, "failed listing session keys, not resetting collapse state");
            return;
        }
    };
    let mut removed = 0;
    for key in keys.iter().filter(|k| k.starts_with(&prefix)) {
        match store.delete(key) {
            Ok(()) => removed += 1,
            Err(err) => tracing::warn!(?err, %key, "failed removing collapse state"),
        }
    }
    tracing::debug!(%topic_id, removed, "reset collapse state");
}

/// Posts of one topic whose replies the viewer chose to hide
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CollapseState {
    topic_id: TopicId,
    key_prefix: String,
    collapsed: BTreeSet<PostId>,
}

impl CollapseState {
    pub fn new(topic_id: TopicId) -> CollapseState {
        CollapseState::with_prefix(topic_id, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(topic_id: TopicId, key_prefix: &str) -> CollapseState {
        CollapseState {
            topic_id,
            key_prefix: String::from(key_prefix),
            collapsed: BTreeSet::new(),
        }
    }

    pub fn topic_id(&self) -> &TopicId {
        &self.topic_id
    }

    pub fn is_collapsed(&self, post: &PostId) -> bool {
        self.collapsed.contains(post)
    }

    pub fn collapsed(&self) -> impl Iterator<Item = &PostId> {
        self.collapsed.iter()
    }

    pub fn collapse(&mut self, post: PostId) {
        self.collapsed.insert(post);
    }

    pub fn expand(&mut self, post: &PostId) {
        self.collapsed.remove(post);
    }

    /// Returns whether `post` is now collapsed
    pub fn toggle(&mut self, post: &PostId) -> bool {
        if self.collapsed.remove(post) {
            false
        } else {
            self.collapsed.insert(post.clone());
            true
        }
    }

    pub fn clear(&mut self) {
        self.collapsed.clear();
    }

    fn key_root(&self) -> String {
        format!("{}-{}-collapsed-", self.key_prefix, self.topic_id)
    }

    pub fn storage_key(&self, post: &PostId) -> String {
        format!("{}{}", self.key_root(), post)
    }

    pub fn load(
        store: Option<&dyn SessionStore>,
        topic_id: TopicId,
        key_prefix: &str,
    ) -> CollapseState {
        let mut state = CollapseState::with_prefix(topic_id, key_prefix);
        let store = match store {
            Some(s) => s,
            None => return state,
        };
        let keys = match store.keys() {
            Ok(keys) => keys,
            Err(err) => {
                tracing::warn!(?err, topic_id = %state.topic_id, "failed listing session keys, starting fully expanded");
                return state;
            }
        };
        let root = state.key_root();
        for key in keys.iter() {
            let post = match key.strip_prefix(&root) {
                Some(p) if !p.is_empty() => PostId(String::from(p)),
                _ => continue,
            };
            match store.get(key) {
                Ok(Some(v)) if v == COLLAPSED => state.collapse(post),
                Ok(_) => (),
                Err(err) => tracing::warn!(?err, %key, "failed reading collapse state"),
            }
        }
        state
    }

    pub fn save(&self, store: Option<&mut dyn SessionStore>) {
        let store = match store {
            Some(s) => s,
            None => return,
        };
        let root = self.key_root();
        match store.keys() {
            Ok(keys) => {
                for key in keys.iter() {
                    let stale = match key.strip_prefix(&root) {
                        Some(p) => !self.collapsed.contains(&PostId(String::from(p))),
                        None => false,
                    };
                    if stale {
                        if let Err(err) = store.delete(key) {
                            tracing::warn!(?err, %key, "failed removing collapse state");
                        }
                    }
                }
            }
            Err(err) => {
                tracing::warn!(?err, topic_id = %self.topic_id, "failed listing session keys, expanded posts may reappear collapsed")
            }
        }
        for post in self.collapsed.iter() {
            let key = self.storage_key(post);
            if let Err(err) = store.set(&key, COLLAPSED) {
                tracing::warn!(?err, %key, "failed saving collapse state");
            }
        }
    }
}

/// Flattens the forest in display order, hiding the replies of collapsed posts
///
/// Collapsed posts themselves are kept, so that they can be expanded again.
pub fn visible_rows<'a>(forest: &'a [ThreadedPost], state: &CollapseState) -> Vec<&'a ThreadedPost> {
    let mut rows = Vec::new();
    let mut stack = forest.iter().rev().collect::<Vec<_>>();
    while let Some(node) = stack.pop() {
        rows.push(node);
        if !state.is_collapsed(node.id()) {
            stack.extend(node.replies.iter().rev());
        }
    }
    rows
}
