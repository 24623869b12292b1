//! Runtime-checked ownership.
//!
//! - [`owned::Owned`]: the unique owner of a resource.
//! - [`borrowed::Borrowed`]: a temporary accessor pushed on the resource's borrow stack.
//! - [`handle::Handle`]: the resource and its [`stack::BorrowStack`].
//! - [`arena::Arena`]: generation-checked slots holding the handles.

pub mod arena;
pub mod borrowed;
pub mod handle;
pub mod owned;
pub mod stack;
