//! Name to page type mapping.
//!
//! The registry is filled during start-up through `&mut` access and shared
//! read-only afterward (see [`FactoryPageProvider`](crate::provider::FactoryPageProvider)),
//! so no registration can race with a navigation.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Structural kind of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageKind {
    /// A leaf page without children.
    Content,
    /// An ordered push/pop container whose last entry is current.
    Stack,
    /// Sibling pages with one selected tab.
    TabSet,
    /// Sibling pages with one selected item.
    CarouselSet,
    /// A master slot and a replaceable detail slot.
    MasterDetail,
}

impl PageKind {
    /// Tab sets and carousels share their selection model.
    pub fn is_multi_child(self) -> bool {
        matches!(self, PageKind::TabSet | PageKind::CarouselSet)
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageKind::Content => "content",
            PageKind::Stack => "stack",
            PageKind::TabSet => "tab-set",
            PageKind::CarouselSet => "carousel-set",
            PageKind::MasterDetail => "master-detail",
        };
        f.write_str(name)
    }
}

/// Concrete identity of a page type plus its kind.
///
/// Two pages are "the same type" when their descriptors are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    name: Arc<str>,
    kind: PageKind,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<Arc<str>>, kind: PageKind) -> Self {
        TypeDescriptor {
            name: name.into(),
            kind,
        }
    }

    pub fn content(name: impl Into<Arc<str>>) -> Self {
        TypeDescriptor::new(name, PageKind::Content)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PageKind {
        self.kind
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Append-only table of segment names.
#[derive(Debug, Clone, Default)]
pub struct PageRegistry {
    entries: IndexMap<String, TypeDescriptor>,
}

impl PageRegistry {
    pub fn new() -> Self {
        PageRegistry::default()
    }

    /// Registers `name`. The first registration of a name wins; later ones
    /// are ignored and return `false`.
    pub fn register(&mut self, name: impl Into<String>, descriptor: TypeDescriptor) -> bool {
        let name = name.into();
        if self.entries.contains_key(&name) {
            tracing::debug!(name = %name, "page already registered, ignoring");
            return false;
        }

        tracing::trace!(name = %name, descriptor = %descriptor, kind = %descriptor.kind(), "page registered");
        self.entries.insert(name, descriptor);
        true
    }

    pub fn lookup(&self, name: &str) -> Option<&TypeDescriptor> {
        self.entries.get(name)
    }

    /// Returns the earliest registered name for `descriptor`.
    pub fn lookup_by_descriptor(&self, descriptor: &TypeDescriptor) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, registered)| *registered == descriptor)
            .map(|(name, _)| name.as_str())
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
