use super::{Mutation, PageContent, PageId, PageNode};
use crate::navigation::NavigationError;
use crate::provider::ResolvedPage;
use crate::registry::{PageKind, TypeDescriptor};
use fxhash::FxHashMap;
use std::fmt::Write;

/// Arena holding every live page.
#[derive(Debug, Default)]
pub struct PageTree {
    nodes: FxHashMap<PageId, PageNode>,
    next_id: u64,
    main_page: Option<PageId>,
}

impl PageTree {
    pub fn new() -> Self {
        PageTree::default()
    }

    /// Number of pages in the arena, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: PageId) -> Option<&PageNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: PageId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub(crate) fn node(&self, id: PageId) -> Result<&PageNode, NavigationError> {
        self.nodes
            .get(&id)
            .ok_or(NavigationError::UnknownPage { page: id })
    }

    fn node_mut(&mut self, id: PageId) -> Result<&mut PageNode, NavigationError> {
        self.nodes
            .get_mut(&id)
            .ok_or(NavigationError::UnknownPage { page: id })
    }

    pub fn main_page(&self) -> Option<PageId> {
        self.main_page
    }

    pub fn parent(&self, id: PageId) -> Option<PageId> {
        self.get(id).and_then(PageNode::parent)
    }

    pub fn kind(&self, id: PageId) -> Option<PageKind> {
        self.get(id).map(PageNode::kind)
    }

    pub fn descriptor(&self, id: PageId) -> Option<&TypeDescriptor> {
        self.get(id).map(PageNode::descriptor)
    }

    /// `"<type> #<id>"`, used in errors and logs.
    pub fn label(&self, id: PageId) -> String {
        match self.get(id) {
            Some(node) => format!("{} {}", node.descriptor(), id),
            None => id.to_string(),
        }
    }

    /// Entries of a stack, bottom first. Empty for other kinds.
    pub fn stack_entries(&self, id: PageId) -> &[PageId] {
        match self.get(id).map(PageNode::content) {
            Some(PageContent::Stack { entries }) => entries.as_slice(),
            _ => &[],
        }
    }

    pub fn children(&self, id: PageId) -> Vec<PageId> {
        self.get(id)
            .map(|node| node.content().children())
            .unwrap_or_default()
    }

    pub fn current_child(&self, id: PageId) -> Option<PageId> {
        self.get(id).and_then(|node| node.content().current())
    }

    pub fn detail(&self, id: PageId) -> Option<PageId> {
        match self.get(id).map(PageNode::content) {
            Some(PageContent::MasterDetail { detail, .. }) => *detail,
            _ => None,
        }
    }

    /// Follows current children down to the page actually shown.
    pub fn effective_current(&self, id: PageId) -> PageId {
        let mut page = id;
        while let Some(child) = self.current_child(page) {
            page = child;
        }
        page
    }

    /// The main page, or the top modal page presented above it.
    pub fn top_layer(&self) -> Option<PageId> {
        let main = self.main_page?;
        Some(self.modal_stack(main).last().copied().unwrap_or(main))
    }

    /// The page the user currently sees.
    pub fn current_page(&self) -> Option<PageId> {
        self.top_layer().map(|layer| self.effective_current(layer))
    }

    /// The parentless ancestor of `id` (possibly `id` itself).
    pub fn top_root(&self, id: PageId) -> PageId {
        let mut page = id;
        while let Some(parent) = self.parent(page) {
            page = parent;
        }
        page
    }

    /// The root whose modal stack applies to `id`: the presenter of the
    /// modal page containing it, or its own top root.
    pub fn layer_root(&self, id: PageId) -> PageId {
        let top = self.top_root(id);
        self.get(top).and_then(PageNode::presenter).unwrap_or(top)
    }

    pub fn modal_stack(&self, root: PageId) -> &[PageId] {
        self.get(root).map(PageNode::modal_stack).unwrap_or(&[])
    }

    /// Position of the modal layer containing `id` in its presenter's stack.
    pub fn modal_layer_index(&self, id: PageId) -> Option<usize> {
        let top = self.top_root(id);
        let presenter = self.get(top)?.presenter()?;
        self.modal_stack(presenter).iter().position(|&layer| layer == top)
    }

    /// True when `id` is reachable from the main page.
    pub fn is_attached(&self, id: PageId) -> bool {
        self.contains(id) && self.main_page == Some(self.layer_root(id))
    }

    /// The stack `id` navigates in: itself if it is a stack, else its nearest
    /// stack ancestor.
    pub fn navigation_stack(&self, id: PageId) -> Option<PageId> {
        let mut page = Some(id);
        while let Some(current) = page {
            let node = self.get(current)?;
            if node.kind() == PageKind::Stack {
                return Some(current);
            }
            page = node.parent();
        }
        None
    }

    pub fn direct_stack_parent(&self, id: PageId) -> Option<PageId> {
        self.parent(id)
            .filter(|&parent| self.kind(parent) == Some(PageKind::Stack))
    }

    /// The stack `id` belongs to, directly or through a tab set or carousel.
    pub fn stack_parent(&self, id: PageId) -> Option<PageId> {
        let parent = self.parent(id)?;
        match self.kind(parent)? {
            PageKind::Stack => Some(parent),
            PageKind::TabSet | PageKind::CarouselSet => self.direct_stack_parent(parent),
            PageKind::Content | PageKind::MasterDetail => None,
        }
    }

    /// Pages to destroy for `id`, children before parents: master before
    /// detail, tabs last to first, stack entries top to bottom.
    pub fn destroy_order(&self, id: PageId) -> Vec<PageId> {
        let mut order = Vec::new();
        self.collect_destroy_order(id, &mut order);
        order
    }

    fn collect_destroy_order(&self, id: PageId, order: &mut Vec<PageId>) {
        let Some(node) = self.get(id) else {
            return;
        };
        match node.content() {
            PageContent::Content => {}
            PageContent::MasterDetail { master, detail, .. } => {
                for child in master.iter().chain(detail.iter()) {
                    self.collect_destroy_order(*child, order);
                }
            }
            PageContent::Stack { entries: children }
            | PageContent::TabSet { children, .. }
            | PageContent::CarouselSet { children, .. } => {
                for child in children.iter().rev() {
                    self.collect_destroy_order(*child, order);
                }
            }
        }
        order.push(id);
    }

    /// Adds a resolved page and its preset children as a detached subtree.
    ///
    /// Tab sets and carousels select their first child. A master-detail
    /// takes its first child as master and the second as detail.
    pub(crate) fn insert(&mut self, resolved: ResolvedPage) -> PageId {
        let ResolvedPage {
            descriptor,
            page,
            view_model,
            title,
            icon,
            mut children,
        } = resolved;

        let id = PageId::new(self.next_id);
        self.next_id += 1;

        let kind = descriptor.kind();
        let limit = match kind {
            PageKind::Content => 0,
            PageKind::MasterDetail => 2,
            PageKind::Stack | PageKind::TabSet | PageKind::CarouselSet => usize::MAX,
        };
        if children.len() > limit {
            tracing::warn!(
                page = %descriptor,
                kind = %kind,
                ignored = children.len() - limit,
                "extra preset children ignored"
            );
            children.truncate(limit);
        }

        let child_ids: Vec<PageId> = children.into_iter().map(|child| self.insert(child)).collect();
        let content = match kind {
            PageKind::Content => PageContent::Content,
            PageKind::Stack => PageContent::Stack { entries: child_ids },
            PageKind::TabSet => PageContent::TabSet {
                current: child_ids.first().copied(),
                children: child_ids,
            },
            PageKind::CarouselSet => PageContent::CarouselSet {
                current: child_ids.first().copied(),
                children: child_ids,
            },
            PageKind::MasterDetail => {
                let mut slots = child_ids.into_iter();
                PageContent::MasterDetail {
                    master: slots.next(),
                    detail: slots.next(),
                    is_presented: false,
                }
            }
        };

        for child in content.children() {
            if let Some(node) = self.nodes.get_mut(&child) {
                node.parent = Some(id);
            }
        }

        self.nodes.insert(
            id,
            PageNode {
                id,
                descriptor,
                page,
                view_model,
                title,
                icon,
                parent: None,
                presenter: None,
                modal_stack: Vec::new(),
                content,
            },
        );
        id
    }

    pub(crate) fn set_title(&mut self, id: PageId, title: Option<String>, icon: Option<String>) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.title = title;
            node.icon = icon;
        }
    }

    /// Removes `id` with all of its descendants and modal pages from the
    /// arena, unlinking it from its parent or presenter first.
    pub(crate) fn remove(&mut self, id: PageId) -> Vec<PageId> {
        if !self.contains(id) {
            return Vec::new();
        }
        self.unlink(id);

        let mut removed = Vec::new();
        let mut pending = vec![id];
        while let Some(page) = pending.pop() {
            let Some(node) = self.nodes.remove(&page) else {
                continue;
            };
            pending.extend(node.content.children());
            pending.extend(node.modal_stack.iter().copied());
            removed.push(page);
        }

        if self.main_page.is_some_and(|main| removed.contains(&main)) {
            self.main_page = None;
        }
        removed
    }

    fn unlink(&mut self, id: PageId) {
        let (parent, presenter) = match self.nodes.get_mut(&id) {
            Some(node) => (node.parent.take(), node.presenter.take()),
            None => return,
        };

        if let Some(node) = parent.and_then(|parent| self.nodes.get_mut(&parent)) {
            match &mut node.content {
                PageContent::Content => {}
                PageContent::Stack { entries } => entries.retain(|&entry| entry != id),
                PageContent::TabSet { children, current }
                | PageContent::CarouselSet { children, current } => {
                    children.retain(|&child| child != id);
                    if *current == Some(id) {
                        *current = children.first().copied();
                    }
                }
                PageContent::MasterDetail { master, detail, .. } => {
                    if *master == Some(id) {
                        *master = None;
                    }
                    if *detail == Some(id) {
                        *detail = None;
                    }
                }
            }
        }

        if let Some(node) = presenter.and_then(|presenter| self.nodes.get_mut(&presenter)) {
            node.modal_stack.retain(|&layer| layer != id);
        }
    }

    fn ensure_detached(&self, page: PageId) -> Result<(), NavigationError> {
        let node = self.node(page)?;
        if !node.is_root() || self.main_page == Some(page) {
            return Err(invalid(format!("{} is already attached", self.label(page))));
        }
        Ok(())
    }

    fn stack_entries_mut(&mut self, stack: PageId) -> Result<&mut Vec<PageId>, NavigationError> {
        let label = self.label(stack);
        match &mut self.node_mut(stack)?.content {
            PageContent::Stack { entries } => Ok(entries),
            _ => Err(invalid(format!("{} is not a stack", label))),
        }
    }

    fn set_parent(&mut self, page: PageId, parent: Option<PageId>) -> Result<(), NavigationError> {
        self.node_mut(page)?.parent = parent;
        Ok(())
    }

    /// Moves the modal pages a freshly attached `page` presented while it was
    /// detached onto the root it now belongs to, keeping their order.
    fn adopt_modal_layers(&mut self, page: PageId) -> Result<(), NavigationError> {
        let root = self.layer_root(page);
        if root == page {
            return Ok(());
        }
        let layers = std::mem::take(&mut self.node_mut(page)?.modal_stack);
        for layer in &layers {
            self.node_mut(*layer)?.presenter = Some(root);
        }
        self.node_mut(root)?.modal_stack.extend(layers);
        Ok(())
    }

    /// Applies a structural change, validating it against the current shape.
    pub(crate) fn apply(&mut self, mutation: &Mutation) -> Result<(), NavigationError> {
        match mutation {
            Mutation::SetMainPage { page, .. } => {
                self.ensure_detached(*page)?;
                self.main_page = Some(*page);
            }
            Mutation::Push { stack, page, .. } => {
                self.ensure_detached(*page)?;
                self.stack_entries_mut(*stack)?.push(*page);
                self.set_parent(*page, Some(*stack))?;
                self.adopt_modal_layers(*page)?;
            }
            Mutation::InsertBefore {
                stack,
                page,
                before,
            } => {
                self.ensure_detached(*page)?;
                let label = self.label(*before);
                let entries = self.stack_entries_mut(*stack)?;
                let index = entries
                    .iter()
                    .position(|entry| entry == before)
                    .ok_or_else(|| invalid(format!("{} is not in the stack", label)))?;
                entries.insert(index, *page);
                self.set_parent(*page, Some(*stack))?;
                self.adopt_modal_layers(*page)?;
            }
            Mutation::Pop { stack, page, .. } => {
                let entries = self.stack_entries_mut(*stack)?;
                if entries.len() < 2 || entries.last() != Some(page) {
                    return Err(invalid(format!("{} is not the poppable top of its stack", page)));
                }
                entries.pop();
                self.set_parent(*page, None)?;
            }
            Mutation::PopToRoot { stack, removed, .. } => {
                let entries = self.stack_entries_mut(*stack)?;
                let expected: Vec<PageId> = entries.iter().skip(1).rev().copied().collect();
                if &expected != removed {
                    return Err(invalid(format!("pop to root of {} doesn't match the stack", stack)));
                }
                entries.truncate(1);
                for page in removed {
                    self.set_parent(*page, None)?;
                }
            }
            Mutation::Remove { stack, page } => {
                let entries = self.stack_entries_mut(*stack)?;
                let Some(index) = entries.iter().position(|entry| entry == page) else {
                    return Err(invalid(format!("{} is not in stack {}", page, stack)));
                };
                entries.remove(index);
                self.set_parent(*page, None)?;
            }
            Mutation::PushModal {
                presenter, page, ..
            } => {
                self.ensure_detached(*page)?;
                if self.node(*presenter)?.parent().is_some() {
                    return Err(invalid(format!("{} can't present modal pages", presenter)));
                }
                self.node_mut(*presenter)?.modal_stack.push(*page);
                self.node_mut(*page)?.presenter = Some(*presenter);
                self.adopt_modal_layers(*page)?;
            }
            Mutation::PopModal {
                presenter, page, ..
            } => {
                let node = self.node_mut(*presenter)?;
                if node.modal_stack.last() != Some(page) {
                    return Err(invalid(format!("{} is not the top modal page", page)));
                }
                node.modal_stack.pop();
                self.node_mut(*page)?.presenter = None;
            }
            Mutation::AddChild { container, page } => {
                self.ensure_detached(*page)?;
                let label = self.label(*container);
                match &mut self.node_mut(*container)?.content {
                    PageContent::TabSet { children, current }
                    | PageContent::CarouselSet { children, current } => {
                        children.push(*page);
                        current.get_or_insert(*page);
                    }
                    _ => return Err(invalid(format!("{} has no child list", label))),
                }
                self.set_parent(*page, Some(*container))?;
                self.adopt_modal_layers(*page)?;
            }
            Mutation::SelectChild { container, page } => {
                let label = self.label(*container);
                match &mut self.node_mut(*container)?.content {
                    PageContent::TabSet { children, current }
                    | PageContent::CarouselSet { children, current }
                        if children.contains(page) =>
                    {
                        *current = Some(*page);
                    }
                    _ => return Err(invalid(format!("{} is not a child of {}", page, label))),
                }
            }
            Mutation::SetDetail {
                shell,
                page,
                previous,
            } => {
                self.ensure_detached(*page)?;
                let label = self.label(*shell);
                match &mut self.node_mut(*shell)?.content {
                    PageContent::MasterDetail { detail, .. } if detail == previous => {
                        *detail = Some(*page);
                    }
                    _ => return Err(invalid(format!("{} detail doesn't match", label))),
                }
                if let Some(previous) = previous {
                    self.set_parent(*previous, None)?;
                }
                self.set_parent(*page, Some(*shell))?;
                self.adopt_modal_layers(*page)?;
            }
            Mutation::SetPresented { shell, presented } => {
                let label = self.label(*shell);
                match &mut self.node_mut(*shell)?.content {
                    PageContent::MasterDetail { is_presented, .. } => *is_presented = *presented,
                    _ => return Err(invalid(format!("{} is not a master-detail page", label))),
                }
            }
        }
        Ok(())
    }

    /// Indented rendering of the main page, its children and modal layers.
    ///
    /// ```text
    /// Shell #0
    ///   master: Menu #1
    ///   detail: Nav #2
    ///     Inbox #3
    /// modal: Compose #4
    /// ```
    pub fn outline(&self) -> String {
        let mut out = String::new();
        match self.main_page {
            Some(main) => self.write_outline(&mut out, main, 0, ""),
            None => out.push_str("(empty)\n"),
        }
        out
    }

    fn write_outline(&self, out: &mut String, id: PageId, depth: usize, prefix: &str) {
        let Some(node) = self.get(id) else {
            return;
        };
        let indent = "  ".repeat(depth);
        let _ = writeln!(out, "{}{}{} {}", indent, prefix, node.descriptor(), id);

        match node.content() {
            PageContent::Content => {}
            PageContent::Stack { entries } => {
                for entry in entries {
                    self.write_outline(out, *entry, depth + 1, "");
                }
            }
            PageContent::TabSet { children, current }
            | PageContent::CarouselSet { children, current } => {
                for child in children {
                    let prefix = if *current == Some(*child) { "* " } else { "" };
                    self.write_outline(out, *child, depth + 1, prefix);
                }
            }
            PageContent::MasterDetail { master, detail, .. } => {
                if let Some(master) = master {
                    self.write_outline(out, *master, depth + 1, "master: ");
                }
                if let Some(detail) = detail {
                    self.write_outline(out, *detail, depth + 1, "detail: ");
                }
            }
        }

        for layer in node.modal_stack() {
            self.write_outline(out, *layer, depth, "modal: ");
        }
    }
}

fn invalid(message: String) -> NavigationError {
    NavigationError::InvalidStructure { message }
}
