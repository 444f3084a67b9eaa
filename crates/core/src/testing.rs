//! Fixtures shared by the unit tests: a recording page, a journal of the
//! lifecycle calls it receives, a provider with a fixed set of page types and
//! a host that keeps every committed mutation.

use crate::lifecycle::{
    ConfirmNavigation, Destructible, Initialize, InitializeAsync, Lifecycle, MasterDetailOptions,
    NavigationAware, NavigationIntercept, StackOptions,
};
use crate::page::{Mutation, PageTree};
use crate::parameters::NavigationParameters;
use crate::provider::{ApplicationHost, FactoryPageProvider, ResolvedPage};
use crate::registry::{PageKind, TypeDescriptor};
use async_trait::async_trait;
use fxhash::{FxHashMap, FxHashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum EventKind {
    CanNavigate,
    Initialize,
    InitializeAsync,
    NavigatedFrom,
    NavigatedTo,
    Destroy,
    Pushed,
    Popped,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Event {
    pub kind: EventKind,
    pub label: String,
}

impl Event {
    fn new(kind: EventKind, label: &str) -> Self {
        Event {
            kind,
            label: label.to_string(),
        }
    }

    pub fn can_navigate(label: &str) -> Self {
        Event::new(EventKind::CanNavigate, label)
    }

    pub fn initialize(label: &str) -> Self {
        Event::new(EventKind::Initialize, label)
    }

    pub fn initialize_async(label: &str) -> Self {
        Event::new(EventKind::InitializeAsync, label)
    }

    pub fn navigated_from(label: &str) -> Self {
        Event::new(EventKind::NavigatedFrom, label)
    }

    pub fn navigated_to(label: &str) -> Self {
        Event::new(EventKind::NavigatedTo, label)
    }

    pub fn destroy(label: &str) -> Self {
        Event::new(EventKind::Destroy, label)
    }
}

#[derive(Default)]
struct JournalState {
    events: Vec<(Event, NavigationParameters)>,
    intercepts: Vec<Event>,
    refused: FxHashSet<String>,
    failing: FxHashSet<String>,
    stack_policy: FxHashMap<String, bool>,
    presented: FxHashMap<String, bool>,
}

/// Shared log of lifecycle calls plus the behavior recorders should show.
#[derive(Clone, Default)]
pub(crate) struct Journal {
    state: Arc<Mutex<JournalState>>,
}

impl Journal {
    fn state(&self) -> MutexGuard<'_, JournalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, kind: EventKind, label: &str, parameters: &NavigationParameters) {
        self.state()
            .events
            .push((Event::new(kind, label), parameters.clone()));
    }

    pub fn recorder(&self, label: &str) -> Arc<dyn Lifecycle> {
        Arc::new(Recorder {
            label: label.to_string(),
            journal: self.clone(),
        })
    }

    /// A content page named `name` with a view-model labelled `<name>.vm`.
    pub fn page_with_view_model(&self, name: &str) -> ResolvedPage {
        content(self, name).with_view_model(self.recorder(&format!("{}.vm", name)))
    }

    /// Recorders labelled `label` refuse navigation from now on.
    pub fn refuse(&self, label: &str) {
        self.state().refused.insert(label.to_string());
    }

    pub fn allow(&self, label: &str) {
        self.state().refused.remove(label);
    }

    /// Asynchronous initialization of `label` fails from now on.
    pub fn fail_initialize(&self, label: &str) {
        self.state().failing.insert(label.to_string());
    }

    /// Stack recorders labelled `label` answer the clear-stack policy.
    pub fn set_clear_stack(&self, label: &str, clear: bool) {
        self.state().stack_policy.insert(label.to_string(), clear);
    }

    /// Master-detail recorders labelled `label` answer the presentation policy.
    pub fn set_presented(&self, label: &str, presented: bool) {
        self.state().presented.insert(label.to_string(), presented);
    }

    pub fn events(&self) -> Vec<Event> {
        self.state()
            .events
            .iter()
            .map(|(event, _)| event.clone())
            .collect()
    }

    pub fn intercepts(&self) -> Vec<Event> {
        self.state().intercepts.clone()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.state()
            .events
            .iter()
            .filter(|(event, _)| event.kind == kind)
            .count()
    }

    pub fn position(&self, event: &Event) -> Option<usize> {
        self.state()
            .events
            .iter()
            .position(|(recorded, _)| recorded == event)
    }

    /// Parameters delivered with the last occurrence of `event`.
    pub fn parameters_of(&self, event: &Event) -> Option<NavigationParameters> {
        self.state()
            .events
            .iter()
            .rev()
            .find(|(recorded, _)| recorded == event)
            .map(|(_, parameters)| parameters.clone())
    }

    pub fn clear(&self) {
        let mut state = self.state();
        state.events.clear();
        state.intercepts.clear();
    }
}

struct Recorder {
    label: String,
    journal: Journal,
}

impl ConfirmNavigation for Recorder {
    fn can_navigate(&self, parameters: &NavigationParameters) -> bool {
        self.journal
            .record(EventKind::CanNavigate, &self.label, parameters);
        !self.journal.state().refused.contains(&self.label)
    }
}

impl Initialize for Recorder {
    fn initialize(&self, parameters: &NavigationParameters) {
        self.journal
            .record(EventKind::Initialize, &self.label, parameters);
    }
}

#[async_trait]
impl InitializeAsync for Recorder {
    async fn initialize_async(&self, parameters: &NavigationParameters) -> anyhow::Result<()> {
        self.journal
            .record(EventKind::InitializeAsync, &self.label, parameters);
        if self.journal.state().failing.contains(&self.label) {
            anyhow::bail!("{} failed to load", self.label);
        }
        Ok(())
    }
}

impl NavigationAware for Recorder {
    fn on_navigated_from(&self, parameters: &NavigationParameters) {
        self.journal
            .record(EventKind::NavigatedFrom, &self.label, parameters);
    }

    fn on_navigated_to(&self, parameters: &NavigationParameters) {
        self.journal
            .record(EventKind::NavigatedTo, &self.label, parameters);
    }
}

impl Destructible for Recorder {
    fn destroy(&self) {
        self.journal
            .record(EventKind::Destroy, &self.label, &NavigationParameters::new());
    }
}

impl StackOptions for Recorder {
    fn clear_stack_on_navigation(&self) -> bool {
        self.journal
            .state()
            .stack_policy
            .get(&self.label)
            .copied()
            .unwrap_or(true)
    }
}

impl MasterDetailOptions for Recorder {
    fn is_presented_after_navigation(&self) -> bool {
        self.journal
            .state()
            .presented
            .get(&self.label)
            .copied()
            .unwrap_or(false)
    }
}

#[async_trait]
impl NavigationIntercept for Recorder {
    async fn on_pushed(&self, _parameters: &NavigationParameters) {
        self.journal
            .state()
            .intercepts
            .push(Event::new(EventKind::Pushed, &self.label));
    }

    async fn on_popped(&self, _parameters: &NavigationParameters) {
        self.journal
            .state()
            .intercepts
            .push(Event::new(EventKind::Popped, &self.label));
    }
}

impl Lifecycle for Recorder {
    fn as_confirm_navigation(&self) -> Option<&dyn ConfirmNavigation> {
        Some(self)
    }

    fn as_initialize(&self) -> Option<&dyn Initialize> {
        Some(self)
    }

    fn as_initialize_async(&self) -> Option<&dyn InitializeAsync> {
        Some(self)
    }

    fn as_navigation_aware(&self) -> Option<&dyn NavigationAware> {
        Some(self)
    }

    fn as_destructible(&self) -> Option<&dyn Destructible> {
        Some(self)
    }

    fn as_stack_options(&self) -> Option<&dyn StackOptions> {
        if self.journal.state().stack_policy.contains_key(&self.label) {
            Some(self)
        } else {
            None
        }
    }

    fn as_master_detail_options(&self) -> Option<&dyn MasterDetailOptions> {
        if self.journal.state().presented.contains_key(&self.label) {
            Some(self)
        } else {
            None
        }
    }

    fn as_navigation_intercept(&self) -> Option<&dyn NavigationIntercept> {
        Some(self)
    }
}

/// A content page of type `name`, recording under the same label.
pub(crate) fn content(journal: &Journal, name: &str) -> ResolvedPage {
    ResolvedPage::new(TypeDescriptor::content(name), journal.recorder(name))
}

/// A container page with preset children, recording under its type name.
pub(crate) fn with_children(
    journal: &Journal,
    descriptor: TypeDescriptor,
    children: Vec<ResolvedPage>,
) -> ResolvedPage {
    let page = journal.recorder(descriptor.name());
    children
        .into_iter()
        .fold(ResolvedPage::new(descriptor, page), ResolvedPage::with_child)
}

pub(crate) const CONTENT_PAGES: &[&str] = &[
    "A", "B", "C", "D", "Home", "X", "Y", "NewPage", "TabA", "TabB", "TabC", "Detail", "Menu",
];

/// Provider used by the engine tests.
///
/// Every content page is registered under its own name. Containers:
///
/// - `Nav`, `OtherNav`: empty stacks
/// - `Tabs`: tab set preset with `TabA` and `TabB`
/// - `EmptyTabs`: tab set without children, for `createTab`
/// - `Carousel`: carousel preset with `A` and `B`
/// - `Shell`: master-detail with `Menu` as master and no detail
/// - `Broken`: a content page whose factory always fails
pub(crate) fn provider(journal: &Journal) -> FactoryPageProvider {
    let mut provider = FactoryPageProvider::new();

    for &name in CONTENT_PAGES {
        let journal = journal.clone();
        provider.register(name, TypeDescriptor::content(name), move |descriptor| {
            Ok(ResolvedPage::new(
                descriptor.clone(),
                journal.recorder(descriptor.name()),
            ))
        });
    }

    for name in ["Nav", "OtherNav"] {
        let journal = journal.clone();
        provider.register(
            name,
            TypeDescriptor::new(name, PageKind::Stack),
            move |descriptor| Ok(with_children(&journal, descriptor.clone(), Vec::new())),
        );
    }

    let tabs_journal = journal.clone();
    provider.register(
        "Tabs",
        TypeDescriptor::new("Tabs", PageKind::TabSet),
        move |descriptor| {
            let tabs = vec![content(&tabs_journal, "TabA"), content(&tabs_journal, "TabB")];
            Ok(with_children(&tabs_journal, descriptor.clone(), tabs))
        },
    );

    let empty_tabs_journal = journal.clone();
    provider.register(
        "EmptyTabs",
        TypeDescriptor::new("EmptyTabs", PageKind::TabSet),
        move |descriptor| Ok(with_children(&empty_tabs_journal, descriptor.clone(), Vec::new())),
    );

    let carousel_journal = journal.clone();
    provider.register(
        "Carousel",
        TypeDescriptor::new("Carousel", PageKind::CarouselSet),
        move |descriptor| {
            let items = vec![content(&carousel_journal, "A"), content(&carousel_journal, "B")];
            Ok(with_children(&carousel_journal, descriptor.clone(), items))
        },
    );

    let shell_journal = journal.clone();
    provider.register(
        "Shell",
        TypeDescriptor::new("Shell", PageKind::MasterDetail),
        move |descriptor| {
            let master = vec![content(&shell_journal, "Menu")];
            Ok(with_children(&shell_journal, descriptor.clone(), master))
        },
    );

    provider.register("Broken", TypeDescriptor::content("Broken"), |_| {
        anyhow::bail!("page constructor panicked")
    });

    provider
}

/// Host that keeps every committed mutation.
#[derive(Default)]
pub(crate) struct RecordingHost {
    mutations: Mutex<Vec<Mutation>>,
}

impl RecordingHost {
    pub fn mutations(&self) -> Vec<Mutation> {
        self.mutations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.mutations().iter().map(Mutation::name).collect()
    }

    pub fn clear(&self) {
        self.mutations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl ApplicationHost for RecordingHost {
    fn commit(&self, _tree: &PageTree, mutation: &Mutation) {
        self.mutations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(mutation.clone());
    }
}
