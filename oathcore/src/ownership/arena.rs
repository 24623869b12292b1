use std::{
    cell::{Cell, RefCell},
    panic::Location,
    rc::Rc,
    sync::Arc,
};

use slotmap::SlotMap;

use crate::{
    base::{OathContext, config::ReleaseOrder, global},
    ext::trace::{TraceEventKind, TraceLevel},
    oath_trace,
    ownership::{
        handle::Handle,
        owned::Owned,
        stack::{BorrowStackNode, BorrowToken, Origin, OriginId, OriginKind},
    },
    utils::{
        check::{Violation, ViolationKind},
        error::OathResult,
    },
};

slotmap::new_key_type! {
    /// Generation-checked key of one resource slot.
    ///
    /// A key stops resolving as soon as its slot is removed, even if the slot is later reused
    /// for another resource.
    pub struct ResourceKey;
}

/// Slot storage for [`Handle`]s.
///
/// `Owned` and `Borrowed` keep the arena alive through an `Rc`, and hold the resource's handle
/// themselves. The slot map is only borrowed for the duration of a lookup, insertion or
/// removal, so accessing one resource never blocks borrowing or releasing any other.
///
/// ```
/// use oathcore::ownership::arena::Arena;
///
/// let arena = Arena::new();
/// let a = arena.make_owned(String::from("a"));
/// let b = arena.make_owned(String::from("b"));
/// assert_eq!(arena.len(), 2);
///
/// let key = a.key().unwrap();
/// drop(a);
/// assert!(!arena.contains(key));
/// assert_eq!(*b.get(), "b");
/// ```
pub struct Arena<T> {
    slots: RefCell<SlotMap<ResourceKey, Rc<Handle<T>>>>,
    context: Arc<OathContext>,
    next_origin: Cell<u64>,
}

impl<T> Arena<T> {
    /// New arena bound to the process-wide context.
    ///
    /// Returned inside an `Rc`: every `Owned` and `Borrowed` keeps a strong reference to it.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> Rc<Self> {
        Self::with_context(global::current())
    }

    pub fn with_context(context: Arc<OathContext>) -> Rc<Self> {
        Rc::new(Self {
            slots: RefCell::new(SlotMap::with_key()),
            context,
            next_origin: Cell::new(1),
        })
    }

    pub fn context(&self) -> &Arc<OathContext> {
        &self.context
    }

    /// Number of live resources.
    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: ResourceKey) -> bool {
        self.slots.borrow().contains_key(key)
    }

    /// Handle of a live resource.
    #[track_caller]
    pub fn handle(&self, key: ResourceKey) -> Result<Rc<Handle<T>>, Violation> {
        let location = Location::caller();
        self.slots
            .borrow()
            .get(key)
            .cloned()
            .ok_or_else(|| stale(key, location))
    }

    /// Current borrow depth of a resource.
    #[track_caller]
    pub fn depth(&self, key: ResourceKey) -> OathResult<usize> {
        Ok(self.handle(key)?.depth())
    }

    /// Active frames of a resource, from the first borrow to the most recent one.
    #[track_caller]
    pub fn frames(&self, key: ResourceKey) -> OathResult<Vec<BorrowStackNode>> {
        Ok(self.handle(key)?.stack().frames().to_vec())
    }

    /// Take ownership of `value` in a new slot.
    #[track_caller]
    pub fn try_make_owned(self: &Rc<Self>, value: T) -> OathResult<Owned<T>> {
        let origin = self.allocate_origin(OriginKind::Owned);
        let handle = Rc::new(Handle::new(value));
        let key = self.slots.borrow_mut().insert(handle.clone());

        oath_trace!(
            self.context,
            TraceLevel::Debug,
            TraceEventKind::OwnerCreated,
            key,
            origin,
            0,
            "Creating owner {}",
            origin
        );

        Ok(Owned::from_parts(self.clone(), key, handle, origin))
    }

    /// Take ownership of `value` in a new slot, funnelling failures through the violation hook.
    #[track_caller]
    pub fn make_owned(self: &Rc<Self>, value: T) -> Owned<T> {
        self.try_make_owned(value)
            .unwrap_or_else(|e| self.context.raise(e))
    }

    /// Pop the top frame of `key` whoever pushed it, bypassing the configured release order.
    ///
    /// Fails with `ImbalancedPop` when no borrow is active.
    #[track_caller]
    pub fn return_handle(&self, key: ResourceKey) -> OathResult<BorrowStackNode> {
        Ok(self.handle(key)?.return_handle()?)
    }

    pub(crate) fn allocate_origin(&self, kind: OriginKind) -> Origin {
        let id = self.next_origin.get();
        self.next_origin.set(id + 1);
        Origin {
            id: OriginId::new_from_raw(id),
            kind,
        }
    }

    /// Push a frame on behalf of `origin`.
    #[track_caller]
    pub(crate) fn push(
        &self,
        key: ResourceKey,
        handle: &Handle<T>,
        origin: Origin,
    ) -> OathResult<BorrowToken> {
        if !handle.is_live() {
            return Err(stale(key, Location::caller()).into());
        }

        let token = handle.borrow_from(origin);
        oath_trace!(
            self.context,
            TraceLevel::Debug,
            TraceEventKind::BorrowCreated,
            key,
            origin,
            handle.depth(),
            "Creating borrow {} from {}",
            token,
            origin
        );

        Ok(token)
    }

    /// Give back the frame identified by `token` according to the configured release order.
    ///
    /// Releasing against a destroyed resource is not an error: the frames went away with the
    /// owner.
    #[track_caller]
    pub(crate) fn release(
        &self,
        key: ResourceKey,
        handle: &Handle<T>,
        token: BorrowToken,
        releaser: Origin,
    ) -> OathResult<()> {
        if !handle.is_live() {
            oath_trace!(
                self.context,
                TraceLevel::Debug,
                TraceEventKind::StaleRelease,
                key,
                releaser,
                0,
                "Releasing stale borrow {} from {}: owner already destroyed",
                token,
                releaser
            );
            return Ok(());
        }

        let node = match self.context.config().release_order {
            ReleaseOrder::Strict => handle.return_token(token)?,
            ReleaseOrder::Unchecked => handle.return_handle()?,
        };
        let depth = handle.depth();

        oath_trace!(
            self.context,
            TraceLevel::Debug,
            TraceEventKind::BorrowReleased,
            key,
            node.origin,
            depth,
            "Releasing borrow from {}@{}",
            if depth == 0 { "Owned" } else { "Borrowed" },
            node.origin.id
        );

        Ok(())
    }

    /// Take the resource out of its handle and free the slot, returning the resource and the
    /// borrow depth it had.
    ///
    /// Nothing changes if the resource is currently accessed.
    #[track_caller]
    pub(crate) fn remove(&self, key: ResourceKey) -> OathResult<(T, usize)> {
        let handle = self.handle(key)?;
        let value = handle.take()?;
        self.slots.borrow_mut().remove(key);
        Ok((value, handle.depth()))
    }
}

fn stale(key: ResourceKey, location: &'static Location<'static>) -> Violation {
    Violation::at(
        ViolationKind::StaleBorrow,
        format!("slot {key:?} is no longer live"),
        location,
    )
}
