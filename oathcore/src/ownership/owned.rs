use std::{
    cell::{Ref, RefMut},
    fmt,
    rc::Rc,
};

use crate::{
    base::config::OutstandingBorrowPolicy,
    ext::trace::{TraceEventKind, TraceLevel},
    magic::LOG_TARGET,
    oath_trace,
    ownership::{
        arena::{Arena, ResourceKey},
        borrowed::Borrowed,
        handle::Handle,
        stack::{Origin, OriginKind},
    },
    utils::{
        check::{Violation, ViolationKind, check},
        error::OathResult,
    },
};

/// The unique root owner of a resource.
///
/// `Owned` is neither `Clone` nor `Copy`. [`Owned::transfer`] moves ownership into a new value
/// and leaves the source null; any access through a null owner is a `NullAccess` violation.
///
/// Dropping the owner drops the resource. If borrows are still active at that point the
/// context's [`OutstandingBorrowPolicy`] decides whether this is ignored, logged, or reported
/// as a violation; the remaining `Borrowed` become stale in every case.
///
/// ```
/// use oathcore::ownership::owned::Owned;
///
/// let owned = Owned::make_owned(42);
/// let b1 = owned.borrow();
/// let b2 = b1.borrow();
/// assert_eq!(owned.depth(), 2);
/// drop(b2);
/// drop(b1);
/// assert_eq!(owned.depth(), 0);
/// assert_eq!(*owned.get(), 42);
/// ```
///
/// An owner cannot be duplicated:
///
/// ```compile_fail
/// use oathcore::ownership::owned::Owned;
///
/// let owned = Owned::make_owned(42);
/// let copy: Owned<i32> = owned.clone();
/// ```
pub struct Owned<T> {
    arena: Rc<Arena<T>>,
    key: Option<ResourceKey>,
    handle: Rc<Handle<T>>,
    origin: Origin,
}

impl<T> Owned<T> {
    /// Take ownership of `value` in a fresh arena bound to the process-wide context.
    #[track_caller]
    pub fn make_owned(value: T) -> Self {
        Arena::new().make_owned(value)
    }

    pub(crate) fn from_parts(
        arena: Rc<Arena<T>>,
        key: ResourceKey,
        handle: Rc<Handle<T>>,
        origin: Origin,
    ) -> Self {
        debug_assert!(origin.kind.is_owned());
        Self {
            arena,
            key: Some(key),
            handle,
            origin,
        }
    }

    pub fn arena(&self) -> &Rc<Arena<T>> {
        &self.arena
    }

    /// Slot key of the resource, `None` once the owner has been transferred away.
    pub fn key(&self) -> Option<ResourceKey> {
        self.key
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn is_null(&self) -> bool {
        self.key.is_none()
    }

    #[track_caller]
    fn live_key(&self) -> Result<ResourceKey, Violation> {
        match self.key {
            Some(key) => Ok(key),
            None => Err(Violation::new(ViolationKind::NullAccess, "handle != nullptr")),
        }
    }

    #[track_caller]
    pub fn try_get(&self) -> OathResult<Ref<'_, T>> {
        self.live_key()?;
        Ok(self.handle.try_read()?)
    }

    /// Shared access to the resource; violations go through the violation hook.
    #[track_caller]
    pub fn get(&self) -> Ref<'_, T> {
        self.try_get()
            .unwrap_or_else(|e| self.arena.context().raise(e))
    }

    #[track_caller]
    pub fn try_get_mut(&mut self) -> OathResult<RefMut<'_, T>> {
        self.live_key()?;
        Ok(self.handle.try_write()?)
    }

    /// Exclusive access to the resource; violations go through the violation hook.
    #[track_caller]
    pub fn get_mut(&mut self) -> RefMut<'_, T> {
        let context = self.arena.context().clone();
        self.try_get_mut().unwrap_or_else(|e| context.raise(e))
    }

    /// Push a frame with this owner as origin and return the matching `Borrowed`.
    #[track_caller]
    pub fn try_borrow(&self) -> OathResult<Borrowed<T>> {
        let key = self.live_key()?;
        let token = self.arena.push(key, &self.handle, self.origin)?;
        let origin = self.arena.allocate_origin(OriginKind::Borrowed);
        Ok(Borrowed::from_parts(
            self.arena.clone(),
            key,
            self.handle.clone(),
            token,
            origin,
        ))
    }

    #[track_caller]
    pub fn borrow(&self) -> Borrowed<T> {
        self.try_borrow()
            .unwrap_or_else(|e| self.arena.context().raise(e))
    }

    #[track_caller]
    pub fn try_depth(&self) -> OathResult<usize> {
        self.live_key()?;
        Ok(self.handle.depth())
    }

    /// Number of active borrows of the resource.
    #[track_caller]
    pub fn depth(&self) -> usize {
        self.try_depth()
            .unwrap_or_else(|e| self.arena.context().raise(e))
    }

    /// Move ownership into a new `Owned`, leaving `self` null.
    ///
    /// The new owner keeps the same origin, so frames it already pushed still name it.
    pub fn transfer(&mut self) -> Owned<T> {
        Owned {
            arena: self.arena.clone(),
            key: self.key.take(),
            handle: self.handle.clone(),
            origin: self.origin,
        }
    }

    /// Recover the resource if no borrow is active, otherwise hand the owner back.
    ///
    /// A null owner is handed back as well.
    pub fn try_into_inner(mut self) -> Result<T, Self> {
        let Some(key) = self.key else {
            return Err(self);
        };

        if self.handle.depth() != 0 {
            return Err(self);
        }

        match self.arena.remove(key) {
            Ok((value, _)) => {
                self.key = None;
                oath_trace!(
                    self.arena.context(),
                    TraceLevel::Debug,
                    TraceEventKind::OwnerDestroyed,
                    key,
                    self.origin,
                    0,
                    "Releasing resource of {} into a plain value",
                    self.origin
                );
                Ok(value)
            }
            Err(_) => Err(self),
        }
    }
}

impl<T> Drop for Owned<T> {
    fn drop(&mut self) {
        let Some(key) = self.key.take() else {
            return;
        };
        let context = self.arena.context().clone();

        let (value, depth) = match self.arena.remove(key) {
            Ok(removed) => removed,
            Err(e) if std::thread::panicking() => {
                log::error!(target: LOG_TARGET, "Failed to destroy {}: {}", self.origin, e);
                return;
            }
            Err(e) => context.raise(e),
        };

        oath_trace!(
            context,
            TraceLevel::Debug,
            TraceEventKind::OwnerDestroyed,
            key,
            self.origin,
            depth,
            "Destroying resource of {}",
            self.origin
        );

        // The resource goes first, before any policy report can unwind.
        drop(value);

        let Err(violation) = check(
            depth == 0,
            ViolationKind::OutstandingBorrows,
            "borrow_depth == 0",
        ) else {
            return;
        };

        match context.config().outstanding_borrows {
            OutstandingBorrowPolicy::Ignore => {}
            OutstandingBorrowPolicy::Warn => {
                log::warn!(
                    target: LOG_TARGET,
                    "{} destroyed with {} outstanding borrow(s); they are now stale",
                    self.origin,
                    depth
                );
            }
            OutstandingBorrowPolicy::Violation => {
                if std::thread::panicking() {
                    log::error!(
                        target: LOG_TARGET,
                        "{} ({} destroyed at depth {})",
                        violation,
                        self.origin,
                        depth
                    );
                } else {
                    context.report_violation(violation);
                }
            }
        }
    }
}

impl<T> fmt::Debug for Owned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owned")
            .field("key", &self.key)
            .field("origin", &self.origin)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{OathContext, config::OathConfig};

    fn arena<T>() -> Rc<Arena<T>> {
        Arena::with_context(OathContext::from_config(OathConfig::default()))
    }

    #[test]
    fn make_owned_derefs_to_value() {
        let owned = arena().make_owned(String::from("oath"));
        assert_eq!(*owned.get(), "oath");
        assert_eq!(owned.depth(), 0);
    }

    #[test]
    fn get_mut_updates_resource() {
        let mut owned = arena().make_owned(vec![1, 2]);
        owned.get_mut().push(3);
        assert_eq!(*owned.get(), vec![1, 2, 3]);
    }

    #[test]
    fn transfer_leaves_source_null() {
        let mut source = arena().make_owned(5u32);
        let target = source.transfer();

        assert!(source.is_null());
        assert_eq!(*target.get(), 5);
        assert_eq!(
            source.try_get().unwrap_err().violation_kind(),
            Some(ViolationKind::NullAccess)
        );
        assert_eq!(
            source.try_borrow().unwrap_err().violation_kind(),
            Some(ViolationKind::NullAccess)
        );
    }

    #[test]
    #[should_panic(expected = "(NullAccess): handle != nullptr")]
    fn get_on_null_owner_goes_through_funnel() {
        let mut source = arena().make_owned(5u32);
        let _target = source.transfer();
        let _ = source.get();
    }

    #[test]
    fn dropping_owner_removes_slot() {
        let arena = arena::<u32>();
        let owned = arena.make_owned(1);
        let key = owned.key().unwrap();
        assert!(arena.contains(key));
        drop(owned);
        assert!(!arena.contains(key));
        assert!(arena.is_empty());
    }

    #[test]
    fn try_into_inner_refuses_while_borrowed() {
        let owned = arena().make_owned(9u32);
        let b = owned.borrow();
        let owned = owned.try_into_inner().unwrap_err();
        drop(b);
        assert_eq!(owned.try_into_inner().unwrap(), 9);
    }
}
