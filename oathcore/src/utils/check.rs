use std::{borrow::Cow, panic::Location};

use strum::{Display, EnumIs};
use thiserror::Error;

/// Category of a runtime ownership check that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, Display)]
pub enum ViolationKind {
    /// An `Owned` or `Borrowed` was used after being nulled (moved-from).
    NullAccess,

    /// A frame was popped while the borrow stack was already empty.
    ImbalancedPop,

    /// A `Borrowed` outlived the `Owned` it was issued from.
    StaleBorrow,

    /// A borrow was released while another frame was on top of the stack.
    OutOfOrderRelease,

    /// An `Owned` was destroyed while borrows were still active.
    OutstandingBorrows,

    /// The resource is already accessed in a conflicting way (shared vs. exclusive).
    AccessConflict,
}

/// A failed runtime check together with the source location that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("OATH runtime check failed ({kind}): {expression} at {file}:{line}")]
pub struct Violation {
    pub kind: ViolationKind,
    pub expression: Cow<'static, str>,
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
}

impl Violation {
    /// Build a violation located at the caller.
    #[track_caller]
    pub fn new(kind: ViolationKind, expression: impl Into<Cow<'static, str>>) -> Self {
        Self::at(kind, expression, Location::caller())
    }

    /// Build a violation located at an explicit source location.
    pub fn at(
        kind: ViolationKind,
        expression: impl Into<Cow<'static, str>>,
        location: &'static Location<'static>,
    ) -> Self {
        Self {
            kind,
            expression: expression.into(),
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

/// Check `condition`, producing a [`Violation`] of the given kind when it does not hold.
///
/// This is the single checking primitive of the crate. Callers decide whether to propagate the
/// error (the `try_*` API) or to funnel it through
/// [`OathContext::report_violation`](crate::base::OathContext::report_violation).
///
/// ```
/// use oathcore::utils::check::{check, ViolationKind};
///
/// let depth = 0usize;
/// let err = check(depth > 0, ViolationKind::ImbalancedPop, "depth > 0").unwrap_err();
/// assert!(err.kind.is_imbalanced_pop());
/// assert!(err.to_string().starts_with("OATH runtime check failed (ImbalancedPop): depth > 0 at "));
/// ```
#[track_caller]
#[inline]
pub fn check(
    condition: bool,
    kind: ViolationKind,
    expression: impl Into<Cow<'static, str>>,
) -> Result<(), Violation> {
    if condition {
        Ok(())
    } else {
        Err(Violation::new(kind, expression))
    }
}
