//! Lifecycle hooks invoked around document mutations.
//!
//! Each collection carries one optional slot per [`HookEvent`]. Hooks receive the
//! document mutably, so a `before_*` hook may amend it before it is stored. A hook
//! returning an error aborts the surrounding operation.

use std::{fmt, sync::Arc};

use crate::error::DocumentStoreResult;

/// A registered hook function.
pub type Hook<D> = Arc<dyn Fn(&mut D) -> DocumentStoreResult<()> + Send + Sync>;

/// The mutation events hooks can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    /// Before validation and key assignment of an inserted document.
    BeforeInsert,
    /// After an inserted document has been written.
    AfterInsert,
    /// Before an updated document is encoded and written.
    BeforeUpdate,
    /// After an updated document has been written.
    AfterUpdate,
    /// Before a document is removed.
    BeforeDelete,
    /// After a document has been removed.
    AfterDelete,
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookEvent::BeforeInsert => "before_insert",
            HookEvent::AfterInsert => "after_insert",
            HookEvent::BeforeUpdate => "before_update",
            HookEvent::AfterUpdate => "after_update",
            HookEvent::BeforeDelete => "before_delete",
            HookEvent::AfterDelete => "after_delete",
        };
        f.write_str(name)
    }
}

/// One optional hook per lifecycle event.
pub struct Hooks<D> {
    before_insert: Option<Hook<D>>,
    after_insert: Option<Hook<D>>,
    before_update: Option<Hook<D>>,
    after_update: Option<Hook<D>>,
    before_delete: Option<Hook<D>>,
    after_delete: Option<Hook<D>>,
}

impl<D> Hooks<D> {
    /// Creates an empty hook set.
    pub fn new() -> Self {
        Self {
            before_insert: None,
            after_insert: None,
            before_update: None,
            after_update: None,
            before_delete: None,
            after_delete: None,
        }
    }

    fn slot(&self, event: HookEvent) -> &Option<Hook<D>> {
        match event {
            HookEvent::BeforeInsert => &self.before_insert,
            HookEvent::AfterInsert => &self.after_insert,
            HookEvent::BeforeUpdate => &self.before_update,
            HookEvent::AfterUpdate => &self.after_update,
            HookEvent::BeforeDelete => &self.before_delete,
            HookEvent::AfterDelete => &self.after_delete,
        }
    }

    fn slot_mut(&mut self, event: HookEvent) -> &mut Option<Hook<D>> {
        match event {
            HookEvent::BeforeInsert => &mut self.before_insert,
            HookEvent::AfterInsert => &mut self.after_insert,
            HookEvent::BeforeUpdate => &mut self.before_update,
            HookEvent::AfterUpdate => &mut self.after_update,
            HookEvent::BeforeDelete => &mut self.before_delete,
            HookEvent::AfterDelete => &mut self.after_delete,
        }
    }

    /// Registers `hook` for `event`, replacing any previous one.
    pub fn set(&mut self, event: HookEvent, hook: Hook<D>) {
        *self.slot_mut(event) = Some(hook);
    }

    /// Removes the hook registered for `event`.
    pub fn clear(&mut self, event: HookEvent) {
        *self.slot_mut(event) = None;
    }

    /// Returns `true` if a hook is registered for `event`.
    pub fn is_set(&self, event: HookEvent) -> bool {
        self.slot(event).is_some()
    }

    /// Runs the hook registered for `event`, if any.
    ///
    /// # Errors
    ///
    /// Returns whatever error the hook returns.
    pub fn run(&self, event: HookEvent, document: &mut D) -> DocumentStoreResult<()> {
        match self.slot(event) {
            Some(hook) => {
                log::trace!("running {event} hook");
                hook(document)
            }
            None => Ok(()),
        }
    }
}

impl<D> Default for Hooks<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Clone for Hooks<D> {
    fn clone(&self) -> Self {
        Self {
            before_insert: self.before_insert.clone(),
            after_insert: self.after_insert.clone(),
            before_update: self.before_update.clone(),
            after_update: self.after_update.clone(),
            before_delete: self.before_delete.clone(),
            after_delete: self.after_delete.clone(),
        }
    }
}

impl<D> fmt::Debug for Hooks<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before_insert", &self.before_insert.is_some())
            .field("after_insert", &self.after_insert.is_some())
            .field("before_update", &self.before_update.is_some())
            .field("after_update", &self.after_update.is_some())
            .field("before_delete", &self.before_delete.is_some())
            .field("after_delete", &self.after_delete.is_some())
            .finish()
    }
}
