use std::cell::{Cell, Ref, RefCell, RefMut};

use crate::{
    ownership::stack::{BorrowStack, BorrowStackNode, BorrowToken, Origin},
    utils::check::{Violation, ViolationKind, check},
};

/// A resource together with its borrow stack.
///
/// The arena slot and every accessor of the resource share one `Rc<Handle>`. The resource is
/// taken out (and dropped) when the owning `Owned` is destroyed, whatever the remaining borrow
/// depth; the stack stays reachable so late borrows can still be released.
///
/// Resource and stack sit behind separate `RefCell`s, so frames can be pushed and popped while
/// the resource is read or written.
#[derive(Debug)]
pub struct Handle<T> {
    data: RefCell<Option<T>>,
    stack: RefCell<BorrowStack>,
    live: Cell<bool>,
}

impl<T> Handle<T> {
    pub fn new(data: T) -> Self {
        Self {
            data: RefCell::new(Some(data)),
            stack: RefCell::new(BorrowStack::new()),
            live: Cell::new(true),
        }
    }

    /// Whether the resource is still held, i.e. the owner has not destroyed it.
    pub fn is_live(&self) -> bool {
        self.live.get()
    }

    /// Shared access to the resource.
    ///
    /// Fails with `AccessConflict` while the resource is mutably accessed, and with
    /// `StaleBorrow` once the resource has been destroyed.
    #[track_caller]
    pub fn try_read(&self) -> Result<Ref<'_, T>, Violation> {
        let data = self.data.try_borrow().map_err(|_| {
            Violation::new(
                ViolationKind::AccessConflict,
                "handle.data.try_borrow(): the resource is mutably accessed elsewhere",
            )
        })?;
        Ref::filter_map(data, Option::as_ref).map_err(|_| stale())
    }

    /// Exclusive access to the resource.
    #[track_caller]
    pub fn try_write(&self) -> Result<RefMut<'_, T>, Violation> {
        let data = self.data.try_borrow_mut().map_err(|_| {
            Violation::new(
                ViolationKind::AccessConflict,
                "handle.data.try_borrow_mut(): the resource is accessed elsewhere",
            )
        })?;
        RefMut::filter_map(data, Option::as_mut).map_err(|_| stale())
    }

    pub fn depth(&self) -> usize {
        self.stack.borrow().depth()
    }

    pub fn stack(&self) -> Ref<'_, BorrowStack> {
        self.stack.borrow()
    }

    /// Push a frame recording `origin` as the borrower. The new frame's parent is the previous
    /// top of the stack.
    pub fn borrow_from(&self, origin: Origin) -> BorrowToken {
        self.stack.borrow_mut().push(origin)
    }

    /// Pop the top frame without checking who releases it.
    ///
    /// If releases do not happen in reverse creation order, the frame removed here is not the
    /// caller's own frame and nothing reports it. See [`Handle::return_token`] for the checked
    /// variant.
    #[track_caller]
    pub fn return_handle(&self) -> Result<BorrowStackNode, Violation> {
        match self.stack.borrow_mut().pop() {
            Some(node) => Ok(node),
            None => Err(Violation::new(
                ViolationKind::ImbalancedPop,
                "borrow_stack.top().is_some()",
            )),
        }
    }

    /// Pop the top frame only if it is the frame identified by `token`.
    ///
    /// The stack is left untouched when the check fails.
    #[track_caller]
    pub fn return_token(&self, token: BorrowToken) -> Result<BorrowStackNode, Violation> {
        let Some(top) = self.stack.borrow().top().copied() else {
            return Err(Violation::new(
                ViolationKind::ImbalancedPop,
                format!("borrow_stack.top().is_some() (releasing {token})"),
            ));
        };

        if top.token != token {
            return Err(Violation::new(
                ViolationKind::OutOfOrderRelease,
                format!(
                    "released frame {token} but the top of the stack is frame {} pushed by {}",
                    top.token, top.origin
                ),
            ));
        }

        self.return_handle()
    }

    /// Take the resource out, marking the handle dead. Frames still on the stack stay there.
    ///
    /// Fails with `AccessConflict` if the resource is currently accessed; the handle is then
    /// left as it was.
    #[track_caller]
    pub fn take(&self) -> Result<T, Violation> {
        let mut data = self.data.try_borrow_mut().map_err(|_| {
            Violation::new(
                ViolationKind::AccessConflict,
                "handle.data.take(): the resource is accessed elsewhere",
            )
        })?;
        check(data.is_some(), ViolationKind::StaleBorrow, "handle.data.is_some()")?;
        self.live.set(false);
        data.take().ok_or_else(stale)
    }
}

#[track_caller]
fn stale() -> Violation {
    Violation::new(
        ViolationKind::StaleBorrow,
        "handle.is_live(): the owner has destroyed the resource",
    )
}
