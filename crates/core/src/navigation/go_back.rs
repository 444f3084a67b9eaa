use super::{NavigationError, NavigationOptions, NavigationService};
use crate::lifecycle::{self, InterceptKind};
use crate::page::{Mutation, PageId};
use crate::parameters::{NavigationMode, NavigationParameters};
use crate::registry::PageKind;
use crate::uri::Segment;

impl NavigationService {
    pub(super) async fn go_back_inner(
        &mut self,
        origin: Option<PageId>,
        parameters: &NavigationParameters,
        options: NavigationOptions,
    ) -> Result<(), NavigationError> {
        let page = match origin {
            Some(page) => self.tree.node(page)?.id(),
            None => self
                .tree
                .current_page()
                .ok_or_else(|| NavigationError::NothingToPop {
                    page: "(empty)".to_string(),
                })?,
        };

        let mut parameters = parameters.clone();
        parameters.set_navigation_mode(NavigationMode::Back);
        self.confirm_leave(page, &parameters).await?;

        let use_modal = self.use_modal_go_back(page, options.modal);
        let target = self.go_back_target(page, use_modal);
        let animated = options.animated.unwrap_or(self.settings.animated);

        let Some(popped) = self.pop(page, use_modal, animated)? else {
            return Err(self.go_back_error(page));
        };
        tracing::debug!(
            page = %self.tree.label(popped),
            modal = use_modal,
            "popped"
        );

        lifecycle::navigated_from(&lifecycle::objects(&self.tree, page), &parameters);
        if let Some(target) = target {
            lifecycle::navigated_to(&lifecycle::objects(&self.tree, target), &parameters);
        }
        self.hooks.fire(
            InterceptKind::Popped,
            lifecycle::objects(&self.tree, popped),
            parameters,
        );
        self.destroy_page(popped);
        Ok(())
    }

    pub(super) async fn go_back_to_root_inner(
        &mut self,
        parameters: &NavigationParameters,
    ) -> Result<(), NavigationError> {
        let page = self
            .tree
            .current_page()
            .ok_or_else(|| NavigationError::NothingToPop {
                page: "(empty)".to_string(),
            })?;

        let mut parameters = parameters.clone();
        parameters.set_navigation_mode(NavigationMode::Back);
        self.confirm_leave(page, &parameters).await?;

        let stack = self
            .tree
            .navigation_stack(page)
            .ok_or_else(|| NavigationError::NothingToPop {
                page: self.tree.label(page),
            })?;
        let entries = self.tree.stack_entries(stack).to_vec();
        let Some(&root) = entries.first() else {
            return Err(NavigationError::NothingToPop {
                page: self.tree.label(stack),
            });
        };

        let removed: Vec<PageId> = entries[1..].iter().rev().copied().collect();
        if !removed.is_empty() {
            self.commit(Mutation::PopToRoot {
                stack,
                removed: removed.clone(),
                animated: self.settings.animated,
            })?;
        }
        for page in removed {
            lifecycle::navigated_from(&lifecycle::objects(&self.tree, page), &parameters);
            self.destroy_page(page);
        }
        lifecycle::navigated_to(&lifecycle::objects(&self.tree, root), &parameters);
        Ok(())
    }

    pub(super) async fn select_tab_inner(
        &mut self,
        name: &str,
        parameters: &NavigationParameters,
    ) -> Result<(), NavigationError> {
        let page = self
            .tree
            .current_page()
            .ok_or_else(|| NavigationError::NoTabSet {
                page: "(empty)".to_string(),
            })?;
        if !lifecycle::can_navigate(&lifecycle::objects(&self.tree, page), parameters).await {
            return Err(NavigationError::Declined {
                page: self.tree.label(page),
            });
        }

        let tab_set = self
            .enclosing_tab_set(page)
            .ok_or_else(|| NavigationError::NoTabSet {
                page: self.tree.label(page),
            })?;

        let segment = Segment::parse(name);
        let wanted = self
            .provider
            .page_type(segment.name())
            .ok_or_else(|| NavigationError::NotFound {
                segment: segment.name().to_string(),
            })?;
        let target = self
            .find_child(tab_set, &wanted, true)
            .ok_or_else(|| NavigationError::TabNotFound {
                name: name.to_string(),
            })?;

        let mut tab_parameters = segment.parameters();
        tab_parameters.extend_from(parameters);

        if self.tree.current_child(tab_set) != Some(target) {
            self.commit(Mutation::SelectChild {
                container: tab_set,
                page: target,
            })?;
        }
        lifecycle::navigated_from(&lifecycle::objects(&self.tree, page), &tab_parameters);
        lifecycle::navigated_to(&lifecycle::objects(&self.tree, target), &tab_parameters);
        Ok(())
    }

    async fn confirm_leave(
        &self,
        page: PageId,
        parameters: &NavigationParameters,
    ) -> Result<(), NavigationError> {
        if lifecycle::can_navigate(&lifecycle::objects(&self.tree, page), parameters).await {
            Ok(())
        } else {
            Err(NavigationError::Declined {
                page: self.tree.label(page),
            })
        }
    }

    /// The tab set that directly holds `page`, or holds the stack `page` is in.
    fn enclosing_tab_set(&self, page: PageId) -> Option<PageId> {
        let parent = self.tree.parent(page)?;
        match self.tree.kind(parent)? {
            PageKind::TabSet => Some(parent),
            PageKind::Stack => self
                .tree
                .parent(parent)
                .filter(|&grand| self.tree.kind(grand) == Some(PageKind::TabSet)),
            _ => None,
        }
    }

    fn use_modal_go_back(&self, page: PageId, requested: Option<bool>) -> bool {
        if let Some(modal) = requested {
            return modal;
        }
        if self.tree.kind(page) == Some(PageKind::Stack) {
            return self.go_back_modal(page);
        }
        match self.tree.stack_parent(page) {
            Some(stack) => self.go_back_modal(stack),
            None => true,
        }
    }

    /// A stack is left modally only when it holds nothing but its root and
    /// isn't itself what the application shows as its base.
    fn go_back_modal(&self, stack: PageId) -> bool {
        let entries = self.tree.stack_entries(stack);
        if entries.last() != entries.first() {
            return false;
        }
        match self.tree.parent(stack) {
            None => self.tree.main_page() != Some(stack),
            Some(parent) => match self.tree.kind(parent) {
                Some(PageKind::TabSet | PageKind::CarouselSet) => {
                    self.tree.main_page() != Some(parent)
                }
                _ => false,
            },
        }
    }

    /// The page that becomes current once `page` is gone.
    fn go_back_target(&self, page: PageId, modal: bool) -> Option<PageId> {
        if !modal {
            if let Some(stack) = self.tree.navigation_stack(page) {
                let entries = self.tree.stack_entries(stack);
                let index = entries
                    .iter()
                    .position(|&entry| entry == page)
                    .unwrap_or(entries.len().saturating_sub(1));
                if let Some(&below) = index.checked_sub(1).and_then(|i| entries.get(i)) {
                    return Some(self.tree.effective_current(below));
                }
            }
        }

        let root = self.tree.layer_root(page);
        let layers = self.tree.modal_stack(root);
        let index = self
            .tree
            .modal_layer_index(page)
            .unwrap_or(layers.len().saturating_sub(1));
        let below = match index.checked_sub(1).and_then(|i| layers.get(i)) {
            Some(&layer) => layer,
            None => root,
        };
        Some(self.tree.effective_current(below))
    }

    /// Commits the pop and returns the page that was removed.
    fn pop(&mut self, page: PageId, modal: bool, animated: bool) -> Result<Option<PageId>, NavigationError> {
        if modal {
            let presenter = self.tree.layer_root(page);
            let Some(&top) = self.tree.modal_stack(presenter).last() else {
                return Ok(None);
            };
            self.commit(Mutation::PopModal {
                presenter,
                page: top,
                animated,
            })?;
            return Ok(Some(top));
        }

        let Some(stack) = self.tree.navigation_stack(page) else {
            return Ok(None);
        };
        let entries = self.tree.stack_entries(stack);
        if entries.len() < 2 {
            return Ok(None);
        }
        let Some(&top) = entries.last() else {
            return Ok(None);
        };
        self.commit(Mutation::Pop {
            stack,
            page: top,
            animated,
        })?;
        Ok(Some(top))
    }

    fn go_back_error(&self, page: PageId) -> NavigationError {
        let label = self.tree.label(page);
        if self.is_main_page(page) {
            return NavigationError::PopMainPage { page: label };
        }

        let top_level_stack =
            |id: PageId| self.tree.kind(id) == Some(PageKind::Stack) && self.tree.parent(id).is_none();
        if top_level_stack(page) || self.tree.parent(page).is_some_and(top_level_stack) {
            NavigationError::PopStackRoot { page: label }
        } else {
            NavigationError::NothingToPop { page: label }
        }
    }

    /// Whether `page` is, or is the visible base of, the main page.
    fn is_main_page(&self, page: PageId) -> bool {
        let Some(main) = self.tree.main_page() else {
            return false;
        };
        if page == main || self.tree.detail(main) == Some(page) {
            return true;
        }
        let Some(parent) = self.tree.parent(page) else {
            return false;
        };
        match self.tree.kind(parent) {
            Some(PageKind::TabSet | PageKind::CarouselSet) => parent == main,
            Some(PageKind::Stack) => {
                self.tree.get(parent).is_some_and(|node| node.is_root()) && self.is_main_page(parent)
            }
            _ => false,
        }
    }
}
