use anyhow::anyhow;
use folio_client::{api::TopicId, CollapseState, SessionStore, DEFAULT_KEY_PREFIX};
use gloo_storage::{errors::StorageError, SessionStorage, Storage};

pub fn init_logging() {
    #[cfg(target_arch = "wasm32")]
    tracing_wasm::set_as_global_default();
}

/// The browser tab's `sessionStorage`
///
/// Values go through gloo-storage, so they are stored JSON-encoded.
pub struct BrowserSession {
    _private: (),
}

impl BrowserSession {
    /// Returns `None` when not running in a browser window with session storage
    #[cfg(target_arch = "wasm32")]
    pub fn detect() -> Option<BrowserSession> {
        match web_sys::window().map(|w| w.session_storage()) {
            Some(Ok(Some(_))) => Some(BrowserSession { _private: () }),
            Some(Err(err)) => {
                tracing::warn!(?err, "sessionStorage is not accessible");
                None
            }
            _ => None,
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn detect() -> Option<BrowserSession> {
        None
    }
}

impl SessionStore for BrowserSession {
    fn keys(&self) -> anyhow::Result<Vec<String>> {
        let raw = SessionStorage::raw();
        let len = raw
            .length()
            .map_err(|e| anyhow!("reading sessionStorage length: {e:?}"))?;
        let mut keys = Vec::with_capacity(len as usize);
        for i in 0..len {
            let key = raw
                .key(i)
                .map_err(|e| anyhow!("reading sessionStorage key {i}: {e:?}"))?;
            keys.extend(key);
        }
        Ok(keys)
    }

    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        match SessionStorage::get::<String>(key) {
            Ok(v) => Ok(Some(v)),
            Err(StorageError::KeyNotFound(_)) => Ok(None),
            // StorageError can hold a JsValue, which is not Send
            Err(e) => Err(anyhow!("reading {key:?} from sessionStorage: {e}")),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        SessionStorage::set(key, value)
            .map_err(|e| anyhow!("writing {key:?} to sessionStorage: {e}"))
    }

    fn delete(&mut self, key: &str) -> anyhow::Result<()> {
        SessionStorage::delete(key);
        Ok(())
    }
}

/// Clears the topic's collapse state from this tab, if there is a tab
pub fn reset_topic_collapse_state(topic_id: &TopicId) {
    let mut session = BrowserSession::detect();
    folio_client::reset_topic_collapse_state(
        session.as_mut().map(|s| s as &mut dyn SessionStore),
        topic_id,
        DEFAULT_KEY_PREFIX,
    );
}

pub fn load_collapse_state(topic_id: TopicId) -> CollapseState {
    let session = BrowserSession::detect();
    CollapseState::load(
        session.as_ref().map(|s| s as &dyn SessionStore),
        topic_id,
        DEFAULT_KEY_PREFIX,
    )
}

pub fn save_collapse_state(state: &CollapseState) {
    let mut session = BrowserSession::detect();
    if session.is_none() {
        tracing::debug!(
            topic_id = %state.topic_id(),
            "no session storage, collapse state not saved"
        );
    }
    state.save(session.as_mut().map(|s| s as &mut dyn SessionStore));
}
