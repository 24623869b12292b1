//! Runtime-checked ownership and borrow provenance.
//!
//! A resource has exactly one [`Owned`](ownership::owned::Owned) and any number of nested
//! [`Borrowed`](ownership::borrowed::Borrowed) accessors. Every borrow pushes a frame on the
//! resource's borrow stack recording who borrowed it, and gives it back when dropped. Misuse
//! (access through a moved-from owner, popping an empty stack, out-of-order release, a borrow
//! outliving its owner) is detected at runtime and funnelled through a single violation hook
//! held by the [`OathContext`](base::OathContext).
//!
//! Example
//! ```
//! use oathcore::prelude::*;
//!
//! let owned = Owned::make_owned(42);
//! let b1 = owned.borrow();
//! let b2 = b1.borrow();
//! assert_eq!(b2.provenance().unwrap(), vec![owned.origin(), b1.origin(), b2.origin()]);
//! drop(b2);
//! drop(b1);
//! assert_eq!(*owned.get(), 42);
//! ```

pub mod base;
pub mod ext;
pub mod magic;
pub mod ownership;
#[cfg(any(test, feature = "test-utils"))]
pub mod tests_utils;
pub mod utils;

pub extern crate chrono;

pub mod prelude {
    //! Convenient re-exports for end users.
    pub use crate::base::{
        OathContext,
        api::ContextCreateInfo,
        config::{OathConfig, OutstandingBorrowPolicy, ReleaseOrder},
        global,
    };
    pub use crate::ownership::{
        arena::{Arena, ResourceKey},
        borrowed::Borrowed,
        owned::Owned,
        stack::{BorrowStackNode, BorrowToken, Origin, OriginKind},
    };
    pub use crate::utils::{
        check::{Violation, ViolationKind},
        error::{OathError, OathResult},
        value::Value,
    };
}
