//! The page tree model.
//!
//! Pages live in an arena ([`PageTree`]) and refer to each other through
//! [`PageId`] handles. A page's structure is a closed [`PageContent`] sum
//! matching its [`PageKind`]. Parents own children top-down; the `parent`
//! field is a back-reference only.
//!
//! # Layers
//!
//! The main page and every page without a parent are *roots*. A root may
//! carry a modal stack: pages presented above it, each the root of its own
//! subtree. A modal page records the root presenting it. Pages resolved for a
//! navigation but not yet attached are detached roots and may already carry
//! modal pages of their own, which travel along once the root is attached.

mod mutation;
mod tree;

pub use mutation::Mutation;
pub use tree::PageTree;

use crate::lifecycle::Lifecycle;
use crate::registry::{PageKind, TypeDescriptor};
use std::fmt;
use std::sync::Arc;

/// Stable handle of a page in a [`PageTree`]. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(u64);

impl PageId {
    pub(crate) fn new(raw: u64) -> Self {
        PageId(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Structural slots of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageContent {
    Content,
    Stack {
        entries: Vec<PageId>,
    },
    TabSet {
        children: Vec<PageId>,
        current: Option<PageId>,
    },
    CarouselSet {
        children: Vec<PageId>,
        current: Option<PageId>,
    },
    MasterDetail {
        master: Option<PageId>,
        detail: Option<PageId>,
        is_presented: bool,
    },
}

impl PageContent {
    pub fn empty(kind: PageKind) -> Self {
        match kind {
            PageKind::Content => PageContent::Content,
            PageKind::Stack => PageContent::Stack {
                entries: Vec::new(),
            },
            PageKind::TabSet => PageContent::TabSet {
                children: Vec::new(),
                current: None,
            },
            PageKind::CarouselSet => PageContent::CarouselSet {
                children: Vec::new(),
                current: None,
            },
            PageKind::MasterDetail => PageContent::MasterDetail {
                master: None,
                detail: None,
                is_presented: false,
            },
        }
    }

    pub fn kind(&self) -> PageKind {
        match self {
            PageContent::Content => PageKind::Content,
            PageContent::Stack { .. } => PageKind::Stack,
            PageContent::TabSet { .. } => PageKind::TabSet,
            PageContent::CarouselSet { .. } => PageKind::CarouselSet,
            PageContent::MasterDetail { .. } => PageKind::MasterDetail,
        }
    }

    /// Children in structural order: stack bottom to top, tabs in display
    /// order, master before detail.
    pub fn children(&self) -> Vec<PageId> {
        match self {
            PageContent::Content => Vec::new(),
            PageContent::Stack { entries } => entries.clone(),
            PageContent::TabSet { children, .. } | PageContent::CarouselSet { children, .. } => {
                children.clone()
            }
            PageContent::MasterDetail { master, detail, .. } => {
                master.iter().chain(detail.iter()).copied().collect()
            }
        }
    }

    /// The child that is shown: a stack's top, the selected tab or the detail.
    pub fn current(&self) -> Option<PageId> {
        match self {
            PageContent::Content => None,
            PageContent::Stack { entries } => entries.last().copied(),
            PageContent::TabSet { current, .. } | PageContent::CarouselSet { current, .. } => {
                *current
            }
            PageContent::MasterDetail { detail, .. } => *detail,
        }
    }
}

/// A page in the tree.
pub struct PageNode {
    id: PageId,
    descriptor: TypeDescriptor,
    page: Arc<dyn Lifecycle>,
    view_model: Option<Arc<dyn Lifecycle>>,
    title: Option<String>,
    icon: Option<String>,
    parent: Option<PageId>,
    presenter: Option<PageId>,
    modal_stack: Vec<PageId>,
    content: PageContent,
}

impl PageNode {
    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn kind(&self) -> PageKind {
        self.content.kind()
    }

    pub fn page(&self) -> &Arc<dyn Lifecycle> {
        &self.page
    }

    /// The bound view-model, if any.
    pub fn view_model(&self) -> Option<&Arc<dyn Lifecycle>> {
        self.view_model.as_ref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn parent(&self) -> Option<PageId> {
        self.parent
    }

    /// For a modal page, the root whose modal stack holds it.
    pub fn presenter(&self) -> Option<PageId> {
        self.presenter
    }

    pub fn modal_stack(&self) -> &[PageId] {
        &self.modal_stack
    }

    pub fn content(&self) -> &PageContent {
        &self.content
    }

    /// True for pages that are neither a child nor a modal layer.
    pub fn is_root(&self) -> bool {
        self.parent.is_none() && self.presenter.is_none()
    }

    /// True when page and view-model are the same bound object.
    pub(crate) fn shares_view_model(&self, other: &PageNode) -> bool {
        match (&self.view_model, &other.view_model) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for PageNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageNode")
            .field("id", &self.id)
            .field("descriptor", &self.descriptor)
            .field("parent", &self.parent)
            .field("presenter", &self.presenter)
            .field("modal_stack", &self.modal_stack)
            .field("content", &self.content)
            .finish_non_exhaustive()
    }
}
