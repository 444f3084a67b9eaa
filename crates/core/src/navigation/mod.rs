//! The navigation service.
//!
//! [`NavigationService`] owns the [`PageTree`] and reconciles it with
//! navigation requests. A request names its target with a URI; the service
//! walks the URI one segment at a time, deciding per segment from the kind of
//! the page it stands on whether to push, reuse, replace or rebuild.
//!
//! ```no_run
//! # async fn demo(mut service: pagenav_core::navigation::NavigationService) {
//! use pagenav_core::navigation::NavigationOptions;
//! use pagenav_core::parameters::NavigationParameters;
//!
//! let result = service
//!     .navigate("/Nav/Inbox?folder=work", NavigationParameters::new(), NavigationOptions::default())
//!     .await;
//! if result.is_declined() {
//!     // a page asked to stay
//! }
//! # }
//! ```
//!
//! Every entry point resolves to a [`NavigationResult`]; the service never
//! returns `Err` to its caller.

mod engine;
mod error;
mod go_back;
#[cfg(test)]
mod tests;

pub use error::{ErrorKind, NavigationError};

use crate::lifecycle::{self, InterceptHooks};
use crate::logging::navigation_span;
use crate::page::{Mutation, PageId, PageTree};
use crate::parameters::{NavigationMode, NavigationParameters};
use crate::provider::{ApplicationHost, PageProvider};
use crate::settings::NavigationSettings;
use crate::uri::NavigationUri;
use std::sync::Arc;
use tracing::Instrument;

/// Per-request overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationOptions {
    /// Falls back to [`NavigationSettings::animated`] when unset.
    pub animated: Option<bool>,
    /// Forces modal (`true`) or stack (`false`) navigation.
    pub modal: Option<bool>,
}

impl NavigationOptions {
    pub fn modal(modal: bool) -> Self {
        NavigationOptions {
            animated: None,
            modal: Some(modal),
        }
    }
}

/// Outcome of a navigation request.
#[derive(Debug)]
pub struct NavigationResult {
    error: Option<NavigationError>,
}

impl NavigationResult {
    fn from_outcome(outcome: Result<(), NavigationError>) -> Self {
        NavigationResult {
            error: outcome.err(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// True when a page refused the navigation.
    pub fn is_declined(&self) -> bool {
        self.error.as_ref().is_some_and(NavigationError::is_declined)
    }

    pub fn error(&self) -> Option<&NavigationError> {
        self.error.as_ref()
    }
}

/// Values every step of one request shares.
#[derive(Debug, Clone, Copy)]
struct Request<'p> {
    parameters: &'p NavigationParameters,
    animated: bool,
}

pub struct NavigationService {
    tree: PageTree,
    provider: Arc<dyn PageProvider>,
    host: Arc<dyn ApplicationHost>,
    settings: NavigationSettings,
    hooks: InterceptHooks,
    /// Pages created by the running request.
    pending: Vec<PageId>,
    /// Pages told NavigatedTo by the running request.
    shown: Vec<PageId>,
}

impl NavigationService {
    pub fn new(
        provider: Arc<dyn PageProvider>,
        host: Arc<dyn ApplicationHost>,
        settings: &NavigationSettings,
    ) -> Self {
        NavigationService {
            tree: PageTree::new(),
            provider,
            host,
            settings: settings.clone(),
            hooks: InterceptHooks::new(settings.intercept_hooks),
            pending: Vec::new(),
            shown: Vec::new(),
        }
    }

    pub fn tree(&self) -> &PageTree {
        &self.tree
    }

    pub fn settings(&self) -> &NavigationSettings {
        &self.settings
    }

    /// Navigates to `uri`.
    ///
    /// Absolute URIs replace the main page. Relative ones start from the top
    /// layer: the last modal page, or the main page when nothing is modal.
    pub async fn navigate(
        &mut self,
        uri: &str,
        parameters: NavigationParameters,
        options: NavigationOptions,
    ) -> NavigationResult {
        async move {
            let origin = self.tree.top_layer();
            let outcome = self.navigate_uri(origin, uri, &parameters, options).await;
            self.finish(outcome)
        }
        .instrument(navigation_span("navigate", uri))
        .await
    }

    /// Navigates to a relative `uri` as seen from `origin`.
    pub async fn navigate_from(
        &mut self,
        origin: PageId,
        uri: &str,
        parameters: NavigationParameters,
        options: NavigationOptions,
    ) -> NavigationResult {
        async move {
            let outcome = match self.tree.node(origin) {
                Ok(_) => {
                    self.navigate_uri(Some(origin), uri, &parameters, options)
                        .await
                }
                Err(err) => Err(err),
            };
            self.finish(outcome)
        }
        .instrument(navigation_span("navigate", uri))
        .await
    }

    /// Pops the page the user currently sees.
    pub async fn go_back(
        &mut self,
        parameters: NavigationParameters,
        options: NavigationOptions,
    ) -> NavigationResult {
        async move {
            let outcome = self.go_back_inner(None, &parameters, options).await;
            self.finish(outcome)
        }
        .instrument(navigation_span("go-back", ""))
        .await
    }

    /// Pops `origin` off its stack or modal layer.
    pub async fn go_back_from(
        &mut self,
        origin: PageId,
        parameters: NavigationParameters,
        options: NavigationOptions,
    ) -> NavigationResult {
        let target = origin.to_string();
        async move {
            let outcome = self.go_back_inner(Some(origin), &parameters, options).await;
            self.finish(outcome)
        }
        .instrument(navigation_span("go-back", &target))
        .await
    }

    /// Pops the current stack down to its root page.
    pub async fn go_back_to_root(&mut self, parameters: NavigationParameters) -> NavigationResult {
        async move {
            let outcome = self.go_back_to_root_inner(&parameters).await;
            self.finish(outcome)
        }
        .instrument(navigation_span("go-back-to-root", ""))
        .await
    }

    /// Selects the tab named `name` in the tab set holding the current page.
    pub async fn select_tab(&mut self, name: &str, parameters: NavigationParameters) -> NavigationResult {
        async move {
            let outcome = self.select_tab_inner(name, &parameters).await;
            self.finish(outcome)
        }
        .instrument(navigation_span("select-tab", name))
        .await
    }

    /// Aborts running intercept hooks and waits for them to stop.
    pub async fn shutdown(&mut self) {
        self.hooks.shutdown().await;
    }

    async fn navigate_uri(
        &mut self,
        origin: Option<PageId>,
        uri: &str,
        parameters: &NavigationParameters,
        options: NavigationOptions,
    ) -> Result<(), NavigationError> {
        let uri = NavigationUri::parse(uri)?;
        let current = if uri.is_absolute() { None } else { origin };
        let request = Request {
            parameters,
            animated: options.animated.unwrap_or(self.settings.animated),
        };
        let mut cursor = uri.cursor();
        self.process_navigation(current, &mut cursor, request, options.modal)
            .await
    }

    /// Applies `mutation` to the tree and reports it to the host.
    fn commit(&mut self, mutation: Mutation) -> Result<(), NavigationError> {
        self.tree.apply(&mutation)?;
        tracing::debug!(mutation = mutation.name(), "committed");
        self.host.commit(&self.tree, &mutation);
        Ok(())
    }

    /// Runs Destroy on `page` and everything below it, children first, then
    /// drops the subtree.
    fn destroy_page(&mut self, page: PageId) {
        for id in self.tree.destroy_order(page) {
            lifecycle::destroy(&lifecycle::objects(&self.tree, id));
        }
        self.tree.remove(page);
    }

    fn finish(&mut self, outcome: Result<(), NavigationError>) -> NavigationResult {
        self.discard_pending();
        match &outcome {
            Ok(()) => tracing::debug!("navigation finished"),
            Err(err) if err.is_declined() => tracing::info!(reason = %err, "navigation declined"),
            Err(err) => tracing::warn!(error = %err, "navigation failed"),
        }
        NavigationResult::from_outcome(outcome)
    }

    /// Drops pages created by the request that never got attached.
    ///
    /// A detached page can still have been announced to, when a later step
    /// failed after it was pushed into another detached page. Such pages get
    /// NavigatedFrom and Destroy before the subtree is dropped.
    fn discard_pending(&mut self) {
        let shown = std::mem::take(&mut self.shown);
        for page in std::mem::take(&mut self.pending) {
            let unattached = self
                .tree
                .get(page)
                .is_some_and(|node| node.is_root() && self.tree.main_page() != Some(page));
            if !unattached {
                continue;
            }

            let announced: Vec<PageId> = self
                .tree
                .destroy_order(page)
                .into_iter()
                .filter(|id| shown.contains(id))
                .collect();
            if !announced.is_empty() {
                let mut parameters = NavigationParameters::new();
                parameters.set_navigation_mode(NavigationMode::Back);
                for &id in &announced {
                    lifecycle::navigated_from(&lifecycle::objects(&self.tree, id), &parameters);
                }
                for &id in &announced {
                    lifecycle::destroy(&lifecycle::objects(&self.tree, id));
                }
            }
            tracing::debug!(page = %page, announced = announced.len(), "discarding unattached page");
            self.tree.remove(page);
        }
    }
}
