//! Events observable on form items.

use futures::future::BoxFuture;

/// Events a form item can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// The item's value changed, or a consumer forced re-evaluation.
    Change,
    /// The item (a button) was activated.
    Click,
}

/// Future returned by an item observer. Observers have nowhere to report
/// errors to; every failure they care about must end in visible page state.
pub type HandlerFuture = BoxFuture<'static, ()>;

/// Future returned by an after-build setup handler.
pub type SetupFuture = BoxFuture<'static, crate::error::Result<()>>;
