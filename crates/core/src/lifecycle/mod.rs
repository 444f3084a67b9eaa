//! Page lifecycle capabilities.
//!
//! Pages and their view-models implement [`Lifecycle`] and opt into
//! individual capabilities by overriding the matching `as_*` accessor:
//!
//! ```
//! use pagenav_core::lifecycle::{Lifecycle, NavigationAware};
//! use pagenav_core::parameters::NavigationParameters;
//!
//! struct InboxViewModel;
//!
//! impl NavigationAware for InboxViewModel {
//!     fn on_navigated_to(&self, parameters: &NavigationParameters) {
//!         let _folder = parameters.try_get::<String>("folder");
//!     }
//! }
//!
//! impl Lifecycle for InboxViewModel {
//!     fn as_navigation_aware(&self) -> Option<&dyn NavigationAware> {
//!         Some(self)
//!     }
//! }
//! ```
//!
//! For every capability the page is asked first and its view-model second.
//! When both implement it, both are called.

mod dispatch;
mod intercept;

pub(crate) use dispatch::{
    can_navigate, destroy, initialize, initialization_targets, navigated_from, navigated_to,
    navigation_targets, objects,
};
pub use intercept::{InterceptHooks, InterceptKind};

use crate::parameters::NavigationParameters;
use async_trait::async_trait;
use downcast_rs::{impl_downcast, DowncastSync};

/// Capability lookup for a page or a view-model.
///
/// Every accessor defaults to `None`. Hosts can recover the concrete type of
/// a page with `downcast_ref`.
pub trait Lifecycle: DowncastSync {
    fn as_confirm_navigation(&self) -> Option<&dyn ConfirmNavigation> {
        None
    }

    fn as_confirm_navigation_async(&self) -> Option<&dyn ConfirmNavigationAsync> {
        None
    }

    fn as_initialize(&self) -> Option<&dyn Initialize> {
        None
    }

    fn as_initialize_async(&self) -> Option<&dyn InitializeAsync> {
        None
    }

    fn as_navigation_aware(&self) -> Option<&dyn NavigationAware> {
        None
    }

    fn as_destructible(&self) -> Option<&dyn Destructible> {
        None
    }

    fn as_stack_options(&self) -> Option<&dyn StackOptions> {
        None
    }

    fn as_master_detail_options(&self) -> Option<&dyn MasterDetailOptions> {
        None
    }

    fn as_navigation_intercept(&self) -> Option<&dyn NavigationIntercept> {
        None
    }
}
impl_downcast!(sync Lifecycle);

/// Gate consulted before a page is left or entered.
pub trait ConfirmNavigation {
    fn can_navigate(&self, parameters: &NavigationParameters) -> bool;
}

/// Asynchronous variant of [`ConfirmNavigation`]. Takes precedence over the
/// synchronous one on the same object.
#[async_trait]
pub trait ConfirmNavigationAsync: Send + Sync {
    async fn can_navigate_async(&self, parameters: &NavigationParameters) -> bool;
}

/// Called once per navigation into a page, before it is attached.
pub trait Initialize {
    fn initialize(&self, parameters: &NavigationParameters);
}

/// Runs after every synchronous [`Initialize`] of the same navigation.
#[async_trait]
pub trait InitializeAsync: Send + Sync {
    async fn initialize_async(&self, parameters: &NavigationParameters) -> anyhow::Result<()>;
}

pub trait NavigationAware {
    /// The page stopped being current.
    fn on_navigated_from(&self, _parameters: &NavigationParameters) {}

    /// The page became current.
    fn on_navigated_to(&self, _parameters: &NavigationParameters) {}
}

/// Teardown for pages removed from the tree.
pub trait Destructible {
    fn destroy(&self);
}

/// Policy of a stack page.
pub trait StackOptions {
    /// Whether forward navigation into the stack pops it to its root first.
    fn clear_stack_on_navigation(&self) -> bool;
}

/// Policy of a master-detail page.
pub trait MasterDetailOptions {
    /// Whether the master pane is shown after the detail changes.
    fn is_presented_after_navigation(&self) -> bool;
}

/// Background notifications fired after a push or pop commits.
///
/// These run on a spawned task. A newer notification of the same kind aborts
/// an older one that is still running.
#[async_trait]
pub trait NavigationIntercept: Send + Sync {
    async fn on_pushed(&self, _parameters: &NavigationParameters) {}

    async fn on_popped(&self, _parameters: &NavigationParameters) {}
}
