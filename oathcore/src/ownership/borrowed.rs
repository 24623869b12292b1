use std::{
    cell::{Ref, RefMut},
    fmt,
    rc::Rc,
};

use crate::{
    magic::LOG_TARGET,
    ownership::{
        arena::{Arena, ResourceKey},
        handle::Handle,
        stack::{BorrowToken, Origin, OriginKind},
    },
    utils::{
        check::{Violation, ViolationKind},
        error::OathResult,
    },
};

/// A temporary, non-owning accessor issued by `borrow()` on an `Owned` or another `Borrowed`.
///
/// Each `Borrowed` owns exactly one frame of its resource's borrow stack and gives it back
/// when dropped (or earlier, through [`Borrowed::release`]). Once the owner is gone every access
/// fails with `StaleBorrow`.
pub struct Borrowed<T> {
    arena: Rc<Arena<T>>,
    key: Option<ResourceKey>,
    handle: Rc<Handle<T>>,
    token: BorrowToken,
    origin: Origin,
}

impl<T> Borrowed<T> {
    pub(crate) fn from_parts(
        arena: Rc<Arena<T>>,
        key: ResourceKey,
        handle: Rc<Handle<T>>,
        token: BorrowToken,
        origin: Origin,
    ) -> Self {
        debug_assert!(origin.kind.is_borrowed());
        Self {
            arena,
            key: Some(key),
            handle,
            token,
            origin,
        }
    }

    pub fn arena(&self) -> &Rc<Arena<T>> {
        &self.arena
    }

    pub fn key(&self) -> Option<ResourceKey> {
        self.key
    }

    /// Token of the frame pushed when this borrow was created.
    pub fn token(&self) -> BorrowToken {
        self.token
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn is_null(&self) -> bool {
        self.key.is_none()
    }

    /// Whether the owner of the resource has been destroyed.
    pub fn is_stale(&self) -> bool {
        self.key.is_some() && !self.handle.is_live()
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

    #[track_caller]
    pub fn get_mut(&mut self) -> RefMut<'_, T> {
        let context = self.arena.context().clone();
        self.try_get_mut().unwrap_or_else(|e| context.raise(e))
    }

    /// Push a nested frame with this borrow as origin.
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
        let key = self.live_key()?;
        if !self.handle.is_live() {
            return Err(Violation::new(
                ViolationKind::StaleBorrow,
                format!("slot {key:?} is no longer live"),
            )
            .into());
        }
        Ok(self.handle.depth())
    }

    #[track_caller]
    pub fn depth(&self) -> usize {
        self.try_depth()
            .unwrap_or_else(|e| self.arena.context().raise(e))
    }

    /// Origins leading to this borrow: the accessor that pushed each frame from the root up to
    /// this borrow's own frame, followed by this borrow.
    ///
    /// If this borrow's frame was already popped by an out-of-order release, the pushers of all
    /// frames still on the stack are listed instead.
    #[track_caller]
    pub fn provenance(&self) -> OathResult<Vec<Origin>> {
        self.try_depth()?;
        let frames = self.handle.stack().frames().to_vec();
        let end = frames
            .iter()
            .position(|node| node.token == self.token)
            .map_or(frames.len(), |index| index + 1);

        let mut chain: Vec<Origin> = frames[..end].iter().map(|node| node.origin).collect();
        chain.push(self.origin);
        Ok(chain)
    }

    /// Move this borrow into a new `Borrowed`, leaving `self` null. The frame moves along.
    pub fn transfer(&mut self) -> Borrowed<T> {
        Borrowed {
            arena: self.arena.clone(),
            key: self.key.take(),
            handle: self.handle.clone(),
            token: self.token,
            origin: self.origin,
        }
    }

    /// Give the frame back now instead of at drop.
    ///
    /// On success `self` becomes null. On failure (for example an out-of-order release under
    /// the strict release order) the borrow keeps its frame and can be released again later.
    #[track_caller]
    pub fn release(&mut self) -> OathResult<()> {
        let key = self.live_key()?;
        self.arena
            .release(key, &self.handle, self.token, self.origin)?;
        self.key = None;
        Ok(())
    }
}

impl<T> Drop for Borrowed<T> {
    fn drop(&mut self) {
        if self.key.is_none() {
            return;
        }

        // `release` only nulls the key once the frame is actually gone.
        if let Err(e) = self.release() {
            if std::thread::panicking() {
                log::error!(target: LOG_TARGET, "Failed to release {}: {}", self.origin, e);
            } else {
                self.arena.context().raise(e);
            }
        }
    }
}

impl<T> fmt::Debug for Borrowed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Borrowed")
            .field("key", &self.key)
            .field("token", &self.token)
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
    fn borrow_reads_owner_value() {
        let owned = arena().make_owned(42);
        let b = owned.borrow();
        assert_eq!(*b.get(), 42);
        assert_eq!(b.depth(), 1);
    }

    #[test]
    fn nested_borrow_records_parent_as_origin() {
        let owned = arena().make_owned(42);
        let b1 = owned.borrow();
        let b2 = b1.borrow();

        let frames = owned.arena().frames(owned.key().unwrap()).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].origin, owned.origin());
        assert_eq!(frames[1].origin, b1.origin());
        assert_eq!(
            b2.provenance().unwrap(),
            vec![owned.origin(), b1.origin(), b2.origin()]
        );
    }

    #[test]
    fn release_nulls_the_borrow() {
        let owned = arena().make_owned(1u8);
        let mut b = owned.borrow();
        b.release().unwrap();
        assert!(b.is_null());
        assert_eq!(owned.depth(), 0);
        assert_eq!(
            b.release().unwrap_err().violation_kind(),
            Some(ViolationKind::NullAccess)
        );
    }

    #[test]
    fn get_mut_through_borrow_is_visible_to_owner() {
        let owned = arena().make_owned(String::from("a"));
        let mut b = owned.borrow();
        b.get_mut().push('b');
        drop(b);
        assert_eq!(*owned.get(), "ab");
    }

    #[test]
    fn transferred_borrow_keeps_frame() {
        let owned = arena().make_owned(0u8);
        let mut b = owned.borrow();
        let moved = b.transfer();

        assert!(b.is_null());
        assert_eq!(moved.token(), b.token());
        assert_eq!(owned.depth(), 1);
        drop(b);
        assert_eq!(owned.depth(), 1);
        drop(moved);
        assert_eq!(owned.depth(), 0);
    }
}
