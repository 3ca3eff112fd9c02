//! Request-scoped correlation IDs
//!
//! The id lives in task-local storage, so concurrent tool calls never see
//! each other's value.

use std::cell::RefCell;
use std::future::Future;

use uuid::Uuid;

tokio::task_local! {
    static CORRELATION_ID: RefCell<Option<String>>;
}

/// Run `future` with its own correlation scope
///
/// `None` (or an empty id) leaves the slot unset; the first read then
/// generates one and keeps it for the rest of the scope.
pub async fn with_correlation_id<F>(id: Option<String>, future: F) -> F::Output
where
    F: Future,
{
    CORRELATION_ID
        .scope(RefCell::new(id.filter(|s| !s.is_empty())), future)
        .await
}

/// Current correlation id, generated lazily
///
/// Outside any scope a fresh id is returned on every call.
#[must_use]
pub fn correlation_id() -> String {
    CORRELATION_ID
        .try_with(|slot| {
            slot.borrow_mut()
                .get_or_insert_with(generate_correlation_id)
                .clone()
        })
        .unwrap_or_else(|_| generate_correlation_id())
}

/// Replace the id of the current scope
///
/// An empty id clears the slot. Returns `false` outside any scope.
pub fn set_correlation_id(id: impl Into<String>) -> bool {
    let id = id.into();
    CORRELATION_ID
        .try_with(|slot| {
            *slot.borrow_mut() = Some(id).filter(|s| !s.is_empty());
        })
        .is_ok()
}

/// First 8 characters of a v4 UUID
#[must_use]
pub fn generate_correlation_id() -> String {
    let mut id = Uuid::new_v4().to_string();
    id.truncate(8);
    id
}
