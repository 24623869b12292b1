//! Borrow provenance stack.
//!
//! Each live resource carries one [`BorrowStack`]. A frame ([`BorrowStackNode`]) is pushed for
//! every borrow and records *who* borrowed (the [`Origin`]) together with the [`BorrowToken`]
//! the resulting `Borrowed` must present when it is released. Frame `N`'s parent is frame
//! `N - 1`; the empty stack is the root state, in which only the owner holds the resource.

use std::fmt;

use smallvec::SmallVec;
use strum::{Display, EnumIs};

/// Opaque identity of an `Owned` or `Borrowed`, unique within its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OriginId(u64);

impl OriginId {
    pub const fn new_from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Which kind of accessor an origin belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, Display)]
pub enum OriginKind {
    Owned,
    Borrowed,
}

/// Identity and kind of the accessor that pushed a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Origin {
    pub id: OriginId,
    pub kind: OriginKind,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.kind, self.id)
    }
}

/// Identifier of one pushed frame, handed to the `Borrowed` that owns the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BorrowToken(u64);

impl BorrowToken {
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BorrowToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One active borrow record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BorrowStackNode {
    /// The accessor that requested the borrow.
    pub origin: Origin,
    /// Token identifying this frame.
    pub token: BorrowToken,
}

/// LIFO chain of [`BorrowStackNode`]s for one resource.
///
/// The stack itself performs no validation; ordering rules are enforced by
/// [`Handle`](crate::ownership::handle::Handle).
#[derive(Debug, Clone, Default)]
pub struct BorrowStack {
    frames: SmallVec<[BorrowStackNode; 8]>,
    next_token: u64,
}

impl BorrowStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active frames (the borrow depth).
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn top(&self) -> Option<&BorrowStackNode> {
        self.frames.last()
    }

    /// Frames from the root (first borrow) to the top.
    pub fn frames(&self) -> &[BorrowStackNode] {
        &self.frames
    }

    /// Position of the frame identified by `token`, counted from the root.
    pub fn position(&self, token: BorrowToken) -> Option<usize> {
        self.frames.iter().position(|node| node.token == token)
    }

    /// Parent frame of the frame identified by `token`.
    ///
    /// Returns `None` both for the root frame and for unknown tokens.
    pub fn parent_of(&self, token: BorrowToken) -> Option<&BorrowStackNode> {
        match self.position(token)? {
            0 => None,
            index => self.frames.get(index - 1),
        }
    }

    /// Push a new frame whose parent is the current top.
    pub fn push(&mut self, origin: Origin) -> BorrowToken {
        let token = BorrowToken(self.next_token);
        self.next_token += 1;
        self.frames.push(BorrowStackNode { origin, token });
        token
    }

    /// Pop the top frame, whoever pushed it.
    pub fn pop(&mut self) -> Option<BorrowStackNode> {
        self.frames.pop()
    }
}
