//! URI-driven page navigation.
//!
//! An application describes its screens by name and asks the
//! [`NavigationService`](navigation::NavigationService) to reach a target
//! described by a navigation URI such as `Shell/Inbox/Message?id=7`. The
//! service resolves each segment through a [`PageProvider`](provider::PageProvider),
//! reconciles the request with the live [`PageTree`](page::PageTree), reports
//! every structural change to the [`ApplicationHost`](provider::ApplicationHost)
//! and notifies pages and their view-models through the capabilities declared
//! in [`lifecycle`].

pub mod helpers;
pub mod lifecycle;
pub mod logging;
pub mod navigation;
pub mod page;
pub mod parameters;
pub mod provider;
pub mod registry;
pub mod settings;
pub mod uri;

#[cfg(test)]
pub(crate) mod testing;

