//! Change-notification hooks (spec §6 "Hook manager").
//!
//! The core itself never logs (see the crate root docs); this is where
//! that observability plugs back in. A caller registers a named,
//! prioritized handler against a [`HookKind`] and gets called with a
//! [`HookContext`] whenever the core reaches that point. The core invokes
//! hooks only through [`HookManager`]; `Rope`/`Transaction` never call
//! back into it directly. The bundled [`LoggingHook`] is the one place in
//! this crate that calls into the `log` facade.

use std::sync::Arc;

use crate::rope::Rope;
use crate::transaction::Transaction;

/// The points in the editing lifecycle a hook can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Fired with the transaction about to be applied, before it runs.
    BeforeEdit,
    /// Fired once a transaction has been applied.
    AfterEdit,
}

/// What a hook handler receives when it's called.
pub struct HookContext<'a> {
    pub kind: HookKind,
    pub before: &'a Rope,
    /// The rope after the edit. Equal to `before` for `BeforeEdit`, since
    /// the edit hasn't happened yet.
    pub after: &'a Rope,
    pub transaction: &'a Transaction,
}

/// Something registered against a [`HookKind`] to be called with a
/// [`HookContext`].
pub trait Hook: Send + Sync {
    fn call(&self, ctx: &HookContext);
}

struct Registered {
    id: String,
    priority: i32,
    hook: Arc<dyn Hook>,
}

/// Dispatches hook calls for each [`HookKind`], in priority order (higher
/// first, ties broken by registration order).
#[derive(Default)]
pub struct HookManager {
    before_edit: Vec<Registered>,
    after_edit: Vec<Registered>,
}

impl HookManager {
    /// An empty hook manager.
    pub fn new() -> Self {
        HookManager { before_edit: Vec::new(), after_edit: Vec::new() }
    }

    /// Registers `hook` under `id` for `kind`, with `priority` (higher
    /// runs first; ties broken by registration order). Re-registering the
    /// same `id` for the same `kind` adds a second entry rather than
    /// replacing the first — callers that want replace semantics should
    /// `unregister` first.
    pub fn register(&mut self, kind: HookKind, id: impl Into<String>, priority: i32, hook: Arc<dyn Hook>) {
        let list = self.list_mut(kind);
        list.push(Registered { id: id.into(), priority, hook });
        list.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// Removes every hook registered under `id` for `kind`. Returns the
    /// number removed.
    pub fn unregister(&mut self, kind: HookKind, id: &str) -> usize {
        let list = self.list_mut(kind);
        let before = list.len();
        list.retain(|r| r.id != id);
        before - list.len()
    }

    /// Number of hooks registered for `kind`.
    pub fn len(&self, kind: HookKind) -> usize {
        self.list(kind).len()
    }

    /// `true` if no hooks are registered for `kind`.
    pub fn is_empty(&self, kind: HookKind) -> bool {
        self.list(kind).is_empty()
    }

    /// Calls every hook registered for `ctx.kind`, in priority order.
    pub fn dispatch(&self, ctx: &HookContext) {
        for registered in self.list(ctx.kind) {
            registered.hook.call(ctx);
        }
    }

    /// Convenience for the common case: dispatches `BeforeEdit` then
    /// `AfterEdit` around an already-applied `(before, after, tx)` triple.
    pub fn notify_commit(&self, before: &Rope, after: &Rope, tx: &Transaction) {
        self.dispatch(&HookContext { kind: HookKind::BeforeEdit, before, after, transaction: tx });
        self.dispatch(&HookContext { kind: HookKind::AfterEdit, before, after, transaction: tx });
    }

    fn list(&self, kind: HookKind) -> &[Registered] {
        match kind {
            HookKind::BeforeEdit => &self.before_edit,
            HookKind::AfterEdit => &self.after_edit,
        }
    }

    fn list_mut(&mut self, kind: HookKind) -> &mut Vec<Registered> {
        match kind {
            HookKind::BeforeEdit => &mut self.before_edit,
            HookKind::AfterEdit => &mut self.after_edit,
        }
    }
}

/// A [`Hook`] that logs every call at `debug` level via the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHook;

impl Hook for LoggingHook {
    fn call(&self, ctx: &HookContext) {
        log::debug!(
            "{:?} at {}: {} chars -> {} chars",
            ctx.kind,
            ctx.transaction.timestamp(),
            ctx.before.len_chars(),
            ctx.after.len_chars(),
        );
    }
}
