//! Segment-by-segment reconciliation of a URI with the page tree.
//!
//! Pages are resolved pre-order: a new page first navigates through the
//! remaining segments while still detached, and is attached once everything
//! below it is in place. A step's gates run before its target consumes the
//! remaining segments, so a refusal precedes every NavigatedTo of the request.

use super::{NavigationError, NavigationService, Request};
use crate::lifecycle::{self, InterceptKind};
use crate::page::{Mutation, PageContent, PageId, PageTree};
use crate::parameters::{keys, NavigationMode, NavigationParameters};
use crate::registry::{PageKind, TypeDescriptor};
use crate::uri::{Segment, SegmentCursor};
use futures::future::{BoxFuture, FutureExt};

/// Structural change made once a step's gates have passed.
enum Action {
    None,
    SetMainPage,
    Push {
        from: PageId,
        modal: Option<bool>,
        /// Insert below the entry at this depth instead of pushing on top.
        insert_at: Option<usize>,
    },
}

/// Bookkeeping run after NavigatedFrom and before NavigatedTo.
enum Completion {
    None,
    SelectTab { container: PageId, segment: Segment },
    Present { shell: PageId, presented: bool },
    AssignDetail {
        shell: PageId,
        page: PageId,
        presented: bool,
    },
    ReuseDetail {
        shell: PageId,
        presented: bool,
        select_tab: Option<(PageId, Segment)>,
    },
    ReplaceDetail {
        shell: PageId,
        page: PageId,
        previous: PageId,
        presented: bool,
    },
}

struct Transition {
    from: Option<PageId>,
    to: PageId,
    action: Action,
    completion: Completion,
}

impl Transition {
    fn push(from: PageId, to: PageId, modal: Option<bool>) -> Self {
        Transition {
            from: Some(from),
            to,
            action: Action::Push {
                from,
                modal,
                insert_at: None,
            },
            completion: Completion::None,
        }
    }
}

fn invalid(message: String) -> NavigationError {
    NavigationError::InvalidStructure { message }
}

/// Segment parameters followed by the request's own, in New mode.
fn step_parameters(segment: &Segment, request: Request<'_>) -> NavigationParameters {
    let mut parameters = segment.parameters();
    parameters.extend_from(request.parameters);
    parameters.set_navigation_mode(NavigationMode::New);
    parameters
}

/// CanNavigate on the source, then on the target when it differs.
async fn gate(tree: &PageTree, transition: &Transition, parameters: &NavigationParameters) -> Result<(), NavigationError> {
    if let Some(from) = transition.from {
        confirm(tree, from, parameters).await?;
    }
    if transition.from != Some(transition.to) {
        confirm(tree, transition.to, parameters).await?;
    }
    Ok(())
}

async fn confirm(tree: &PageTree, page: PageId, parameters: &NavigationParameters) -> Result<(), NavigationError> {
    if lifecycle::can_navigate(&lifecycle::objects(tree, page), parameters).await {
        return Ok(());
    }
    Err(NavigationError::Declined {
        page: tree.label(page),
    })
}

impl NavigationService {
    /// Consumes the next segment of `cursor` relative to `current`, which is
    /// `None` when the segment becomes the new main page.
    pub(super) fn process_navigation<'a>(
        &'a mut self,
        current: Option<PageId>,
        cursor: &'a mut SegmentCursor,
        request: Request<'a>,
        modal: Option<bool>,
    ) -> BoxFuture<'a, Result<(), NavigationError>> {
        async move {
            if cursor.is_empty() {
                return Ok(());
            }

            tokio::task::yield_now().await;
            let Some(segment) = cursor.next_segment() else {
                return Ok(());
            };

            let modal = segment
                .parameters()
                .get::<bool>(keys::USE_MODAL_NAVIGATION)?
                .or(modal);

            tracing::debug!(
                segment = %segment,
                current = %current.map(|page| self.tree.label(page)).unwrap_or_default(),
                modal = ?modal,
                "processing segment"
            );

            if segment.is_remove() {
                return self.process_remove(current, cursor, request, modal).await;
            }

            let Some(current) = current else {
                return self.process_root(segment, cursor, request, modal).await;
            };

            match self.tree.node(current)?.kind() {
                PageKind::Content => {
                    self.process_content(current, segment, cursor, request, modal)
                        .await
                }
                PageKind::Stack => self.process_stack(current, segment, cursor, request).await,
                PageKind::TabSet | PageKind::CarouselSet => {
                    self.push_new(current, segment, cursor, request, modal)
                        .await
                }
                PageKind::MasterDetail => {
                    self.process_master_detail(current, segment, cursor, request, modal)
                        .await
                }
            }
        }
        .boxed()
    }

    async fn process_root(
        &mut self,
        segment: Segment,
        cursor: &mut SegmentCursor,
        request: Request<'_>,
        modal: Option<bool>,
    ) -> Result<(), NavigationError> {
        let page = self.create_page(&segment)?;
        let previous = self.tree.main_page();
        let transition = Transition {
            from: self.tree.current_page(),
            to: page,
            action: Action::SetMainPage,
            completion: Completion::None,
        };
        self.descend_and_complete(transition, &segment, cursor, request, modal)
            .await?;

        if let Some(previous) = previous {
            self.destroy_with_modal_stack(previous);
        }
        Ok(())
    }

    async fn process_content(
        &mut self,
        current: PageId,
        segment: Segment,
        cursor: &mut SegmentCursor,
        request: Request<'_>,
        modal: Option<bool>,
    ) -> Result<(), NavigationError> {
        let next_is_content = self
            .provider
            .page_type(segment.name())
            .is_some_and(|descriptor| descriptor.kind() == PageKind::Content);

        if self.tree.stack_parent(current).is_some() && next_is_content && modal != Some(true) {
            return self
                .reverse_navigation(current, segment, cursor, request, modal)
                .await;
        }
        self.push_new(current, segment, cursor, request, modal).await
    }

    /// Resolves `segment`, lets it consume the rest of the cursor and pushes
    /// it from `current`.
    async fn push_new(
        &mut self,
        current: PageId,
        segment: Segment,
        cursor: &mut SegmentCursor,
        request: Request<'_>,
        modal: Option<bool>,
    ) -> Result<(), NavigationError> {
        let page = self.create_page(&segment)?;
        self.descend_and_complete(Transition::push(current, page, modal), &segment, cursor, request, modal)
            .await
    }

    /// Gates `transition`, lets its target consume the rest of `cursor` with
    /// `modal`, then completes it.
    async fn descend_and_complete(
        &mut self,
        transition: Transition,
        segment: &Segment,
        cursor: &mut SegmentCursor,
        request: Request<'_>,
        modal: Option<bool>,
    ) -> Result<(), NavigationError> {
        let parameters = step_parameters(segment, request);
        gate(&self.tree, &transition, &parameters).await?;
        self.process_navigation(Some(transition.to), cursor, request, modal)
            .await?;
        self.complete_step(transition, parameters, request).await
    }

    async fn process_stack(
        &mut self,
        stack: PageId,
        segment: Segment,
        cursor: &mut SegmentCursor,
        request: Request<'_>,
    ) -> Result<(), NavigationError> {
        let entries = self.tree.stack_entries(stack).to_vec();
        let Some(&root) = entries.first() else {
            return self
                .reverse_navigation(stack, segment, cursor, request, Some(false))
                .await;
        };

        let clear = self.clear_stack_on_navigation(stack);
        let mut popped = Vec::new();
        let mut doomed = Vec::new();
        if clear {
            doomed = entries.iter().rev().copied().collect();
            popped = entries[1..].to_vec();
            if !popped.is_empty() {
                self.commit(Mutation::PopToRoot {
                    stack,
                    removed: popped.iter().rev().copied().collect(),
                    animated: false,
                })?;
            }
        }

        let top = if clear {
            root
        } else {
            entries.last().copied().unwrap_or(root)
        };
        let reuse_top = self.provider.page_type(segment.name()).as_ref() == self.tree.descriptor(top);
        if reuse_top && clear {
            doomed.pop();
        }

        let outcome = if reuse_top {
            self.reenter_stack_top(top, segment, cursor, request).await
        } else {
            self.replace_stack_top(stack, top, clear, segment, cursor, request)
                .await
        };

        if let Err(err) = outcome {
            self.restore_stack(stack, popped);
            return Err(err);
        }
        for page in doomed {
            self.destroy_page(page);
        }
        Ok(())
    }

    /// The stack already shows a page of the requested type: navigate into it
    /// again instead of creating a new one.
    async fn reenter_stack_top(
        &mut self,
        top: PageId,
        segment: Segment,
        cursor: &mut SegmentCursor,
        request: Request<'_>,
    ) -> Result<(), NavigationError> {
        let completion = if segment.has_parameter(keys::SELECTED_TAB) {
            Completion::SelectTab {
                container: top,
                segment: segment.clone(),
            }
        } else {
            Completion::None
        };
        let transition = Transition {
            from: Some(top),
            to: top,
            action: Action::None,
            completion,
        };
        let Some(next) = cursor.next_segment() else {
            return self.do_navigate_action(transition, &segment, request).await;
        };

        // The rebuild asks `top` as its source before it pushes anything.
        self.reverse_navigation(top, next, cursor, request, Some(false))
            .await?;
        self.complete_step(transition, step_parameters(&segment, request), request)
            .await
    }

    async fn replace_stack_top(
        &mut self,
        stack: PageId,
        top: PageId,
        cleared: bool,
        segment: Segment,
        cursor: &mut SegmentCursor,
        request: Request<'_>,
    ) -> Result<(), NavigationError> {
        self.reverse_navigation(stack, segment, cursor, request, Some(false))
            .await?;
        if cleared {
            self.commit(Mutation::Remove { stack, page: top })?;
        }
        Ok(())
    }

    /// Puts pages popped by a failed clear-stack navigation back, or destroys
    /// them when the stack has changed since.
    fn restore_stack(&mut self, stack: PageId, popped: Vec<PageId>) {
        let intact = self.tree.stack_entries(stack).len() == 1;
        for page in popped {
            let restored = intact
                && self
                    .commit(Mutation::Push {
                        stack,
                        page,
                        animated: false,
                    })
                    .is_ok();
            if !restored {
                self.destroy_page(page);
            }
        }
    }

    async fn process_master_detail(
        &mut self,
        shell: PageId,
        segment: Segment,
        cursor: &mut SegmentCursor,
        request: Request<'_>,
        modal: Option<bool>,
    ) -> Result<(), NavigationError> {
        let presented = self.is_presented_after_navigation(shell);

        let Some(detail) = self.tree.detail(shell) else {
            let page = self.create_page(&segment)?;
            let transition = Transition {
                from: None,
                to: page,
                action: Action::None,
                completion: Completion::AssignDetail {
                    shell,
                    page,
                    presented,
                },
            };
            return self
                .descend_and_complete(transition, &segment, cursor, request, modal)
                .await;
        };

        if modal == Some(true) {
            let page = self.create_page(&segment)?;
            let mut transition = Transition::push(shell, page, Some(true));
            transition.completion = Completion::Present { shell, presented };
            return self
                .descend_and_complete(transition, &segment, cursor, request, modal)
                .await;
        }

        let next_type = self.provider.page_type(segment.name());
        let detail_is_stack = self.tree.kind(detail) == Some(PageKind::Stack);

        // A stack detail survives only when its policy keeps it or it already
        // shows the page the segment after this one asks for.
        let mut reuse_stack = false;
        if detail_is_stack && next_type.as_ref().map(TypeDescriptor::kind) == Some(PageKind::Stack) {
            reuse_stack = !self.clear_stack_on_navigation(detail);
            if !reuse_stack {
                let peeked = cursor
                    .peek()
                    .and_then(|next| self.provider.page_type(next.name()));
                let shown = self
                    .tree
                    .current_child(detail)
                    .and_then(|page| self.tree.descriptor(page));
                reuse_stack = peeked.is_some() && peeked.as_ref() == shown;
            }
        }

        let same_type = next_type.as_ref() == self.tree.descriptor(detail);
        if (detail_is_stack && reuse_stack) || (!detail_is_stack && same_type) {
            let select_tab = (self.tree.kind(detail) == Some(PageKind::TabSet)
                && segment.has_parameter(keys::SELECTED_TAB))
            .then(|| (detail, segment.clone()));
            let transition = Transition {
                from: None,
                to: detail,
                action: Action::None,
                completion: Completion::ReuseDetail {
                    shell,
                    presented,
                    select_tab,
                },
            };
            return self
                .descend_and_complete(transition, &segment, cursor, request, modal)
                .await;
        }

        let page = self.create_page(&segment)?;
        let nested_modal = Some(self.tree.kind(page) != Some(PageKind::Stack));
        let transition = Transition {
            from: Some(detail),
            to: page,
            action: Action::None,
            completion: Completion::ReplaceDetail {
                shell,
                page,
                previous: detail,
                presented,
            },
        };
        self.descend_and_complete(transition, &segment, cursor, request, nested_modal)
            .await
    }

    /// Rebuilds the stack of `current` so it ends with `segment` followed by
    /// every remaining segment that can live in a stack.
    ///
    /// The last page is pushed first; the rest are inserted below it in turn,
    /// which leaves them in URI order without popping anything. Segments from
    /// the first one that must be modal onward are navigated modally from the
    /// new top afterwards.
    async fn reverse_navigation(
        &mut self,
        current: PageId,
        segment: Segment,
        cursor: &mut SegmentCursor,
        request: Request<'_>,
        modal: Option<bool>,
    ) -> Result<(), NavigationError> {
        let mut legal = vec![segment];
        let mut illegal = Vec::new();
        for item in cursor.drain() {
            if !illegal.is_empty() {
                illegal.push(item);
                continue;
            }
            let stays_in_stack = match item.parameters().get::<bool>(keys::USE_MODAL_NAVIGATION)? {
                Some(modal) => !modal,
                None => self
                    .provider
                    .page_type(item.name())
                    .map_or(true, |descriptor| descriptor.kind() != PageKind::MasterDetail),
            };
            if stays_in_stack {
                legal.push(item);
            } else {
                illegal.push(item);
            }
        }

        let depth = self
            .tree
            .navigation_stack(current)
            .map_or(0, |stack| self.tree.stack_entries(stack).len());
        let from = if self.tree.kind(current) == Some(PageKind::Stack) {
            self.tree.current_child(current).unwrap_or(current)
        } else {
            current
        };

        tracing::debug!(
            page = %self.tree.label(current),
            depth,
            legal = legal.len(),
            deferred = illegal.len(),
            "rebuilding stack"
        );

        // Every page is resolved and asked before the first push, so a refusal
        // anywhere in the run leaves the stack as it was.
        let mut steps = Vec::with_capacity(legal.len());
        for segment in &legal {
            let page = self.create_page(segment)?;
            steps.push((page, step_parameters(segment, request)));
        }
        if let Some((_, parameters)) = steps.first() {
            confirm(&self.tree, from, parameters).await?;
        }
        for (page, parameters) in &steps {
            confirm(&self.tree, *page, parameters).await?;
        }

        let mut insert_at = None;
        for (page, parameters) in steps.into_iter().rev() {
            let transition = Transition {
                from: Some(from),
                to: page,
                action: Action::Push {
                    from: current,
                    modal,
                    insert_at,
                },
                completion: Completion::None,
            };
            self.complete_step(transition, parameters, request).await?;
            insert_at = Some(depth);
        }

        if illegal.is_empty() {
            return Ok(());
        }
        let top = self
            .tree
            .navigation_stack(current)
            .and_then(|stack| self.tree.stack_entries(stack).last().copied())
            .ok_or_else(|| invalid(format!("{} has no stack to continue from", self.tree.label(current))))?;
        let mut deferred = SegmentCursor::from_segments(illegal);
        self.process_navigation(Some(top), &mut deferred, request, Some(true))
            .await
    }

    async fn process_remove(
        &mut self,
        current: Option<PageId>,
        cursor: &mut SegmentCursor,
        request: Request<'_>,
        modal: Option<bool>,
    ) -> Result<(), NavigationError> {
        let located = current.and_then(|page| Some((page, self.tree.direct_stack_parent(page)?)));
        let Some((current, stack)) = located else {
            return Err(NavigationError::RemoveRequiresStack {
                page: current
                    .map(|page| self.tree.label(page))
                    .unwrap_or_else(|| "the application".to_string()),
            });
        };

        let entries = self.tree.stack_entries(stack).to_vec();
        let mut index = entries
            .iter()
            .position(|&entry| entry == current)
            .unwrap_or(entries.len().saturating_sub(1));
        let underflow = || invalid(format!("more remove segments than pages below {}", current));

        if cursor.can_remove_and_push() {
            let mut doomed = vec![current];
            while cursor.peek().is_some_and(Segment::is_remove) {
                index = index.checked_sub(1).ok_or_else(underflow)?;
                doomed.push(entries[index]);
                cursor.next_segment();
            }

            self.process_navigation(Some(current), cursor, request, modal)
                .await?;
            self.remove_pages(stack, doomed)
        } else {
            let mut doomed = Vec::new();
            for _ in cursor.drain() {
                index = index.checked_sub(1).ok_or_else(underflow)?;
                doomed.push(entries[index]);
            }

            self.remove_pages(stack, doomed)?;
            let options = super::NavigationOptions {
                animated: Some(request.animated),
                modal: None,
            };
            self.go_back_inner(Some(current), request.parameters, options)
                .await
        }
    }

    fn remove_pages(&mut self, stack: PageId, pages: Vec<PageId>) -> Result<(), NavigationError> {
        for page in pages {
            self.commit(Mutation::Remove { stack, page })?;
            self.destroy_page(page);
        }
        Ok(())
    }

    /// Gates, initializes, commits and announces one step.
    ///
    /// Order: CanNavigate on the source then the target, Initialize on the
    /// target, the structural action, NavigatedFrom on the source, the
    /// completion, NavigatedTo on the target.
    async fn do_navigate_action(
        &mut self,
        transition: Transition,
        segment: &Segment,
        request: Request<'_>,
    ) -> Result<(), NavigationError> {
        let parameters = step_parameters(segment, request);
        gate(&self.tree, &transition, &parameters).await?;
        self.complete_step(transition, parameters, request).await
    }

    /// Everything after the gates of [`Self::do_navigate_action`].
    async fn complete_step(
        &mut self,
        transition: Transition,
        parameters: NavigationParameters,
        request: Request<'_>,
    ) -> Result<(), NavigationError> {
        let Transition {
            from,
            to,
            action,
            completion,
        } = transition;

        // Children of a page that is already shown were initialized with it.
        let targets = if self.tree.is_attached(to) {
            lifecycle::objects(&self.tree, to)
        } else {
            lifecycle::initialization_targets(&self.tree, to)
        };
        if let Err(source) = lifecycle::initialize(&targets, &parameters).await {
            return Err(NavigationError::Initialize {
                page: self.tree.label(to),
                source,
            });
        }

        let pushed = self.run_action(action, to, request.animated)?;

        if let Some(from) = from {
            lifecycle::navigated_from(&lifecycle::navigation_targets(&self.tree, from), &parameters);
        }
        self.run_completion(completion, &parameters)?;
        lifecycle::navigated_to(&lifecycle::navigation_targets(&self.tree, to), &parameters);
        self.shown.push(to);

        if pushed {
            self.hooks.fire(
                InterceptKind::Pushed,
                lifecycle::objects(&self.tree, to),
                parameters,
            );
        }
        Ok(())
    }

    /// Returns true when `page` was pushed.
    fn run_action(&mut self, action: Action, page: PageId, animated: bool) -> Result<bool, NavigationError> {
        match action {
            Action::None => Ok(false),
            Action::SetMainPage => {
                let previous = self.tree.main_page();
                self.commit(Mutation::SetMainPage { page, previous })?;
                Ok(false)
            }
            Action::Push {
                from,
                modal,
                insert_at,
            } => {
                self.push_page(from, page, modal, insert_at, animated)?;
                Ok(true)
            }
        }
    }

    fn push_page(
        &mut self,
        from: PageId,
        page: PageId,
        modal: Option<bool>,
        insert_at: Option<usize>,
        animated: bool,
    ) -> Result<(), NavigationError> {
        let use_modal = modal.unwrap_or_else(|| {
            self.tree.kind(from) != Some(PageKind::Stack) && self.tree.stack_parent(from).is_none()
        });
        if use_modal {
            let presenter = self.tree.layer_root(from);
            return self.commit(Mutation::PushModal {
                presenter,
                page,
                animated,
            });
        }

        let stack = self
            .tree
            .navigation_stack(from)
            .ok_or_else(|| invalid(format!("{} is not inside a stack", self.tree.label(from))))?;
        match insert_at {
            Some(depth) => {
                let before = self
                    .tree
                    .stack_entries(stack)
                    .get(depth)
                    .copied()
                    .ok_or_else(|| invalid(format!("{} has no entry at depth {}", stack, depth)))?;
                self.commit(Mutation::InsertBefore {
                    stack,
                    page,
                    before,
                })
            }
            None => self.commit(Mutation::Push {
                stack,
                page,
                animated,
            }),
        }
    }

    fn run_completion(
        &mut self,
        completion: Completion,
        parameters: &NavigationParameters,
    ) -> Result<(), NavigationError> {
        match completion {
            Completion::None => Ok(()),
            Completion::SelectTab { container, segment } => {
                self.select_child(container, &segment.parameters())
            }
            Completion::Present { shell, presented } => self.set_presented(shell, presented),
            Completion::AssignDetail {
                shell,
                page,
                presented,
            } => {
                self.set_presented(shell, presented)?;
                let previous = self.tree.detail(shell);
                self.commit(Mutation::SetDetail {
                    shell,
                    page,
                    previous,
                })
            }
            Completion::ReuseDetail {
                shell,
                presented,
                select_tab,
            } => {
                if let Some((detail, segment)) = select_tab {
                    self.select_child(detail, &segment.parameters())?;
                }
                self.set_presented(shell, presented)
            }
            Completion::ReplaceDetail {
                shell,
                page,
                previous,
                presented,
            } => {
                if self.tree.kind(previous) == Some(PageKind::Stack) {
                    if let Some(shown) = self.tree.current_child(previous) {
                        lifecycle::navigated_from(&lifecycle::objects(&self.tree, shown), parameters);
                    }
                }
                self.set_presented(shell, presented)?;
                self.commit(Mutation::SetDetail {
                    shell,
                    page,
                    previous: Some(previous),
                })?;
                self.destroy_page(previous);
                Ok(())
            }
        }
    }

    fn set_presented(&mut self, shell: PageId, presented: bool) -> Result<(), NavigationError> {
        let unchanged = matches!(
            self.tree.get(shell).map(|node| node.content()),
            Some(PageContent::MasterDetail { is_presented, .. }) if *is_presented == presented
        );
        if unchanged {
            return Ok(());
        }
        self.commit(Mutation::SetPresented { shell, presented })
    }

    /// Creates the page for `segment` as a detached root.
    fn create_page(&mut self, segment: &Segment) -> Result<PageId, NavigationError> {
        let name = segment.name();
        let resolved = match self.provider.resolve_page(name) {
            Ok(Some(resolved)) => resolved,
            Ok(None) => {
                return Err(NavigationError::NotFound {
                    segment: name.to_string(),
                })
            }
            Err(source) if self.provider.page_type(name).is_some() => {
                return Err(NavigationError::CreatePage {
                    segment: name.to_string(),
                    source,
                })
            }
            Err(source) => {
                tracing::debug!(segment = %name, error = %source, "resolution failed for unregistered page");
                return Err(NavigationError::NotFound {
                    segment: name.to_string(),
                });
            }
        };

        let page = self.tree.insert(resolved);
        self.pending.push(page);
        tracing::debug!(segment = %name, page = %self.tree.label(page), "page created");

        self.configure_page(page, segment)?;
        Ok(page)
    }

    /// Adds the tabs a segment asks for and applies its tab selection.
    fn configure_page(&mut self, page: PageId, segment: &Segment) -> Result<(), NavigationError> {
        let kind = self.tree.node(page)?.kind();
        if !kind.is_multi_child() {
            return Ok(());
        }

        let parameters = segment.parameters();
        if kind == PageKind::TabSet {
            for tab in parameters.get_all::<String>(keys::CREATE_TAB)? {
                let created = match tab.split_once('|') {
                    Some((stack, child)) => self.create_stack_tab(stack, child)?,
                    None => Some(self.create_page(&Segment::parse(&tab))?),
                };
                if let Some(created) = created {
                    self.commit(Mutation::AddChild {
                        container: page,
                        page: created,
                    })?;
                }
            }
        }

        self.select_child(page, &parameters)
    }

    /// Builds the `Stack|Child` form of a created tab: a stack holding only
    /// `child`, titled after it. `None` when `stack` isn't a stack.
    fn create_stack_tab(&mut self, stack: &str, child: &str) -> Result<Option<PageId>, NavigationError> {
        let stack_page = self.create_page(&Segment::parse(stack))?;
        if self.tree.kind(stack_page) != Some(PageKind::Stack) {
            tracing::warn!(tab = %stack, "created tab container is not a stack, skipped");
            self.tree.remove(stack_page);
            return Ok(None);
        }

        let child_page = self.create_page(&Segment::parse(child))?;
        self.commit(Mutation::Push {
            stack: stack_page,
            page: child_page,
            animated: false,
        })?;

        let entries = self.tree.stack_entries(stack_page).to_vec();
        if entries.len() > 1 {
            let placeholder = entries[0];
            self.commit(Mutation::Remove {
                stack: stack_page,
                page: placeholder,
            })?;
            self.tree.remove(placeholder);
        }

        let (title, icon) = match self.tree.get(child_page) {
            Some(node) => (node.title().map(str::to_string), node.icon().map(str::to_string)),
            None => (None, None),
        };
        self.tree.set_title(stack_page, title, icon);
        Ok(Some(stack_page))
    }

    /// Makes the child named by the `selectedTab` parameter current.
    ///
    /// Only the selection pointer changes; no lifecycle calls are made.
    fn select_child(&mut self, container: PageId, parameters: &NavigationParameters) -> Result<(), NavigationError> {
        if !self.tree.kind(container).is_some_and(PageKind::is_multi_child) {
            return Ok(());
        }
        let Some(selected) = parameters
            .try_get::<String>(keys::SELECTED_TAB)
            .filter(|value| !value.trim().is_empty())
        else {
            return Ok(());
        };

        let name = Segment::parse(&selected).name().to_string();
        let Some(wanted) = self.provider.page_type(&name) else {
            tracing::warn!(tab = %name, "selected tab is not registered");
            return Ok(());
        };
        let Some(child) = self.find_child(container, &wanted, false) else {
            tracing::warn!(tab = %name, container = %self.tree.label(container), "no child matches selected tab");
            return Ok(());
        };

        if self.tree.current_child(container) != Some(child) {
            self.commit(Mutation::SelectChild {
                container,
                page: child,
            })?;
        }
        Ok(())
    }

    /// The first child of a tab set or carousel whose type is `wanted`. For a
    /// tab set, stack tabs also match by their current page, or by their root
    /// when `match_root` is set.
    pub(super) fn find_child(&self, container: PageId, wanted: &TypeDescriptor, match_root: bool) -> Option<PageId> {
        let look_into_stacks = self.tree.kind(container) == Some(PageKind::TabSet);
        self.tree.children(container).into_iter().find(|&child| {
            if self.tree.descriptor(child) == Some(wanted) {
                return true;
            }
            if !look_into_stacks || self.tree.kind(child) != Some(PageKind::Stack) {
                return false;
            }
            let shown = self.tree.current_child(child);
            let root = self.tree.stack_entries(child).first().copied();
            shown.and_then(|page| self.tree.descriptor(page)) == Some(wanted)
                || (match_root && root.and_then(|page| self.tree.descriptor(page)) == Some(wanted))
        })
    }

    fn clear_stack_on_navigation(&self, stack: PageId) -> bool {
        lifecycle::objects(&self.tree, stack)
            .iter()
            .find_map(|object| {
                object
                    .as_stack_options()
                    .map(|options| options.clear_stack_on_navigation())
            })
            .unwrap_or(self.settings.clear_stack_on_navigation)
    }

    fn is_presented_after_navigation(&self, shell: PageId) -> bool {
        lifecycle::objects(&self.tree, shell)
            .iter()
            .find_map(|object| {
                object
                    .as_master_detail_options()
                    .map(|options| options.is_presented_after_navigation())
            })
            .unwrap_or(false)
    }

    /// Destroys a former main page: its modal layers top first, then itself.
    fn destroy_with_modal_stack(&mut self, root: PageId) {
        let layers = self.tree.modal_stack(root).to_vec();
        for layer in layers.into_iter().rev() {
            self.destroy_page(layer);
        }
        self.destroy_page(root);
    }
}
