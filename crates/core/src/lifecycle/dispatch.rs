use super::Lifecycle;
use crate::page::{PageContent, PageId, PageTree};
use crate::parameters::NavigationParameters;
use crate::registry::PageKind;
use std::sync::Arc;

/// The page object of `id` followed by its view-model.
pub(crate) fn objects(tree: &PageTree, id: PageId) -> Vec<Arc<dyn Lifecycle>> {
    let Some(node) = tree.get(id) else {
        return Vec::new();
    };
    let mut objects = vec![Arc::clone(node.page())];
    if let Some(view_model) = node.view_model() {
        objects.push(Arc::clone(view_model));
    }
    objects
}

/// Objects initialized when `id` is navigated to.
///
/// A tab set also initializes every tab, using the current page of tabs that
/// are stacks. A carousel initializes all of its items.
pub(crate) fn initialization_targets(tree: &PageTree, id: PageId) -> Vec<Arc<dyn Lifecycle>> {
    let mut targets = objects(tree, id);
    let Some(node) = tree.get(id) else {
        return targets;
    };

    match node.content() {
        PageContent::TabSet { children, .. } => {
            for &child in children {
                if tree.kind(child) == Some(PageKind::Stack) {
                    if let Some(top) = tree.current_child(child) {
                        targets.extend(objects(tree, top));
                    }
                } else {
                    targets.extend(objects(tree, child));
                }
            }
        }
        PageContent::CarouselSet { children, .. } => {
            for &child in children {
                targets.extend(objects(tree, child));
            }
        }
        PageContent::Content | PageContent::Stack { .. } | PageContent::MasterDetail { .. } => {}
    }
    targets
}

/// Objects told about `id` being entered or left.
///
/// For a tab set this includes the selected tab (or, for a stack tab, its
/// current page) unless the tab shares the tab set's view-model. For a
/// carousel it includes the current item.
pub(crate) fn navigation_targets(tree: &PageTree, id: PageId) -> Vec<Arc<dyn Lifecycle>> {
    let mut targets = objects(tree, id);
    let Some(node) = tree.get(id) else {
        return targets;
    };

    match node.content() {
        PageContent::TabSet {
            current: Some(tab), ..
        } => {
            let Some(tab_node) = tree.get(*tab) else {
                return targets;
            };
            if tab_node.kind() == PageKind::Stack {
                if let Some(top) = tree.current_child(*tab) {
                    targets.extend(objects(tree, top));
                }
            } else if !node.shares_view_model(tab_node) {
                targets.extend(objects(tree, *tab));
            }
        }
        PageContent::CarouselSet {
            current: Some(item), ..
        } => targets.extend(objects(tree, *item)),
        _ => {}
    }
    targets
}

/// Asks every object that confirms navigation, page then view-model, and
/// allows only when all of them agree. The asynchronous capability wins over
/// the synchronous one.
pub(crate) async fn can_navigate(
    objects: &[Arc<dyn Lifecycle>],
    parameters: &NavigationParameters,
) -> bool {
    let mut allowed = true;
    for object in objects {
        allowed &= if let Some(confirm) = object.as_confirm_navigation_async() {
            confirm.can_navigate_async(parameters).await
        } else if let Some(confirm) = object.as_confirm_navigation() {
            confirm.can_navigate(parameters)
        } else {
            true
        };
    }
    allowed
}

/// Synchronous initialization of every object, then asynchronous.
pub(crate) async fn initialize(
    objects: &[Arc<dyn Lifecycle>],
    parameters: &NavigationParameters,
) -> anyhow::Result<()> {
    for object in objects {
        if let Some(initialize) = object.as_initialize() {
            initialize.initialize(parameters);
        }
    }
    for object in objects {
        if let Some(initialize) = object.as_initialize_async() {
            initialize.initialize_async(parameters).await?;
        }
    }
    Ok(())
}

pub(crate) fn navigated_from(objects: &[Arc<dyn Lifecycle>], parameters: &NavigationParameters) {
    for object in objects {
        if let Some(aware) = object.as_navigation_aware() {
            aware.on_navigated_from(parameters);
        }
    }
}

pub(crate) fn navigated_to(objects: &[Arc<dyn Lifecycle>], parameters: &NavigationParameters) {
    for object in objects {
        if let Some(aware) = object.as_navigation_aware() {
            aware.on_navigated_to(parameters);
        }
    }
}

pub(crate) fn destroy(objects: &[Arc<dyn Lifecycle>]) {
    for object in objects {
        if let Some(destructible) = object.as_destructible() {
            destructible.destroy();
        }
    }
}
