//! Line-event hook and the execution tracer built on it.
//!
//! Each thread owns one hook slot. Step calls inserted by [`step!`](crate::step),
//! [`#[traced]`](crate::traced) and [`trace_lines!`](crate::trace_lines) report
//! the source line about to execute; the installed [`StepHook`] (if any)
//! receives it. Tracers open a session with [`enter_session`], which saves
//! the hook it replaces; [`exit_session`] puts the saved hook back. Sessions
//! may end in any order: ending one that is not the innermost unlinks it and
//! hands its saved hook to the session above, so a finished session's hook is
//! never reinstalled.

mod tracer;

pub use tracer::ExecutionTracer;

use crate::aggregator::SourceLocation;
use std::cell::{Cell, RefCell};

/// Receiver of line events on the current thread
pub trait StepHook {
    fn on_step(&mut self, location: SourceLocation);
}

thread_local! {
    static HOOK: RefCell<Option<Box<dyn StepHook>>> = const { RefCell::new(None) };
    static SESSIONS: RefCell<Vec<Session>> = const { RefCell::new(Vec::new()) };
    static NEXT_SESSION: Cell<u64> = const { Cell::new(0) };
}

/// Identity of one hook session on the current thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

struct Session {
    id: SessionId,
    /// Hook that was in the slot when the session started
    saved: Option<Box<dyn StepHook>>,
}

/// How [`exit_session`] left the hook slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// The session was innermost; the hook it replaced is back in the slot
    Restored,
    /// A newer session is still open and keeps the slot
    Unlinked,
    /// No open session has this id
    Unknown,
}

/// Install `hook` for the current thread, returning the one it replaces
pub fn install_hook(hook: Box<dyn StepHook>) -> Option<Box<dyn StepHook>> {
    HOOK.with(|slot| slot.borrow_mut().replace(hook))
}

/// Put `previous` back into the slot, returning the hook it replaces
pub fn restore_hook(previous: Option<Box<dyn StepHook>>) -> Option<Box<dyn StepHook>> {
    HOOK.with(|slot| std::mem::replace(&mut *slot.borrow_mut(), previous))
}

/// Install `hook` as the innermost session of the current thread
pub fn enter_session(hook: Box<dyn StepHook>) -> SessionId {
    let id = NEXT_SESSION.with(|next| {
        let id = next.get();
        next.set(id + 1);
        SessionId(id)
    });
    let saved = install_hook(hook);
    SESSIONS.with(|sessions| sessions.borrow_mut().push(Session { id, saved }));
    id
}

/// End the session `id`
///
/// The innermost session restores the hook it replaced. Any other session is
/// unlinked: the session opened right above it inherits its saved hook in
/// place of the ended session's own, and the slot is left alone.
pub fn exit_session(id: SessionId) -> SessionExit {
    let ended = SESSIONS.with(|sessions| {
        let mut sessions = sessions.borrow_mut();
        let index = sessions.iter().position(|session| session.id == id)?;
        let session = sessions.remove(index);
        if index == sessions.len() {
            return Some((session.saved, SessionExit::Restored));
        }
        let dead = std::mem::replace(&mut sessions[index].saved, session.saved);
        Some((dead, SessionExit::Unlinked))
    });

    match ended {
        None => SessionExit::Unknown,
        Some((saved, SessionExit::Restored)) => {
            drop(restore_hook(saved));
            SessionExit::Restored
        }
        Some((dead, exit)) => {
            drop(dead);
            exit
        }
    }
}

/// Number of sessions open on the current thread
pub fn open_sessions() -> usize {
    SESSIONS
        .try_with(|sessions| sessions.try_borrow().map(|s| s.len()).unwrap_or(0))
        .unwrap_or(0)
}

/// Whether a hook is installed on the current thread
pub fn is_active() -> bool {
    HOOK.try_with(|slot| slot.try_borrow().map(|h| h.is_some()).unwrap_or(true))
        .unwrap_or(false)
}

/// Deliver one line event to the current thread's hook
///
/// Called from instrumented code; does nothing when no hook is installed.
#[doc(hidden)]
pub fn step(location: SourceLocation) {
    let _ = HOOK.try_with(|slot| {
        // A step call reached from inside a hook is dropped rather than re-entering it
        if let Ok(mut hook) = slot.try_borrow_mut() {
            if let Some(hook) = hook.as_mut() {
                hook.on_step(location);
            }
        }
    });
}

/// Emit a line event for the current source line
///
/// Manual form of the step calls that [`#[traced]`](crate::traced) inserts.
///
/// ```ignore
/// let scope = scopeprof::ltimer().scope();
/// scopeprof::step!();
/// expensive();
/// scopeprof::step!();
/// cheap();
/// scope.finish()?;
/// ```
#[macro_export]
macro_rules! step {
    () => {
        $crate::trace::step($crate::SourceLocation::new(
            ::core::file!(),
            ::core::line!(),
        ))
    };
}
