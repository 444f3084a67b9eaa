//! Collaborators of the navigation service.
//!
//! - [`PageProvider`] turns a segment name into a fresh page.
//! - [`ApplicationHost`] mirrors committed structural changes in the UI
//!   toolkit. The main page itself is tracked by the
//!   [`PageTree`](crate::page::PageTree) and changes through
//!   [`Mutation::SetMainPage`](crate::page::Mutation::SetMainPage).

use crate::lifecycle::Lifecycle;
use crate::page::{Mutation, PageTree};
use crate::registry::{PageRegistry, TypeDescriptor};
use fxhash::FxHashMap;
use std::sync::Arc;

/// A page materialized by a [`PageProvider`], with any children it is
/// created with.
///
/// Preset children are interpreted by kind: stack entries bottom first, tabs
/// in order, or master then detail for a master-detail page.
pub struct ResolvedPage {
    pub descriptor: TypeDescriptor,
    pub page: Arc<dyn Lifecycle>,
    pub view_model: Option<Arc<dyn Lifecycle>>,
    pub title: Option<String>,
    pub icon: Option<String>,
    pub children: Vec<ResolvedPage>,
}

impl ResolvedPage {
    pub fn new(descriptor: TypeDescriptor, page: Arc<dyn Lifecycle>) -> Self {
        ResolvedPage {
            descriptor,
            page,
            view_model: None,
            title: None,
            icon: None,
            children: Vec::new(),
        }
    }

    pub fn with_view_model(mut self, view_model: Arc<dyn Lifecycle>) -> Self {
        self.view_model = Some(view_model);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_child(mut self, child: ResolvedPage) -> Self {
        self.children.push(child);
        self
    }
}

/// Source of pages.
pub trait PageProvider: Send + Sync {
    /// The registered type of `name`.
    fn page_type(&self, name: &str) -> Option<TypeDescriptor>;

    /// Creates a new page for `name`. `Ok(None)` means nothing is registered.
    fn resolve_page(&self, name: &str) -> anyhow::Result<Option<ResolvedPage>>;
}

type PageFactory = Box<dyn Fn(&TypeDescriptor) -> anyhow::Result<ResolvedPage> + Send + Sync>;

/// A [`PageProvider`] backed by a [`PageRegistry`] and one factory closure
/// per name.
///
/// ```
/// use pagenav_core::provider::{FactoryPageProvider, ResolvedPage};
/// use pagenav_core::registry::TypeDescriptor;
/// use pagenav_core::lifecycle::Lifecycle;
/// use std::sync::Arc;
///
/// struct Inbox;
/// impl Lifecycle for Inbox {}
///
/// let mut provider = FactoryPageProvider::new();
/// provider.register("Inbox", TypeDescriptor::content("InboxPage"), |descriptor| {
///     Ok(ResolvedPage::new(descriptor.clone(), Arc::new(Inbox)))
/// });
/// let provider = Arc::new(provider);
/// ```
#[derive(Default)]
pub struct FactoryPageProvider {
    registry: PageRegistry,
    factories: FxHashMap<String, PageFactory>,
}

impl FactoryPageProvider {
    pub fn new() -> Self {
        FactoryPageProvider::default()
    }

    /// Registers `name`. Returns `false`, keeping the existing factory, if
    /// the name is already taken.
    pub fn register<F>(&mut self, name: &str, descriptor: TypeDescriptor, factory: F) -> bool
    where
        F: Fn(&TypeDescriptor) -> anyhow::Result<ResolvedPage> + Send + Sync + 'static,
    {
        if !self.registry.register(name, descriptor) {
            return false;
        }
        self.factories.insert(name.to_string(), Box::new(factory));
        true
    }

    pub fn registry(&self) -> &PageRegistry {
        &self.registry
    }

    pub fn clear(&mut self) {
        self.registry.clear();
        self.factories.clear();
    }
}

impl PageProvider for FactoryPageProvider {
    fn page_type(&self, name: &str) -> Option<TypeDescriptor> {
        self.registry.lookup(name).cloned()
    }

    fn resolve_page(&self, name: &str) -> anyhow::Result<Option<ResolvedPage>> {
        let (Some(descriptor), Some(factory)) = (self.registry.lookup(name), self.factories.get(name))
        else {
            return Ok(None);
        };
        factory(descriptor).map(Some)
    }
}

/// The UI toolkit side of navigation.
pub trait ApplicationHost: Send + Sync {
    /// Called after `mutation` has been applied to `tree`.
    fn commit(&self, tree: &PageTree, mutation: &Mutation);
}
