use super::*;
use crate::page::PageContent;
use crate::parameters::NavigationMode;
use crate::registry::PageKind;
use crate::testing::{provider, Event, EventKind, Journal, RecordingHost};

struct Harness {
    journal: Journal,
    host: Arc<RecordingHost>,
    service: NavigationService,
}

impl Harness {
    fn new() -> Self {
        Harness::with_settings(NavigationSettings::default())
    }

    fn with_settings(settings: NavigationSettings) -> Self {
        let journal = Journal::default();
        let host = Arc::new(RecordingHost::default());
        let service = NavigationService::new(
            Arc::new(provider(&journal)),
            Arc::clone(&host) as Arc<dyn ApplicationHost>,
            &settings,
        );
        Harness {
            journal,
            host,
            service,
        }
    }

    async fn navigate(&mut self, uri: &str) -> NavigationResult {
        self.service
            .navigate(uri, NavigationParameters::new(), NavigationOptions::default())
            .await
    }

    /// Navigates relative to the page the user sees.
    async fn navigate_here(&mut self, uri: &str) -> NavigationResult {
        let origin = self.current_id();
        self.service
            .navigate_from(origin, uri, NavigationParameters::new(), NavigationOptions::default())
            .await
    }

    async fn go_back(&mut self) -> NavigationResult {
        self.service
            .go_back(NavigationParameters::new(), NavigationOptions::default())
            .await
    }

    fn tree(&self) -> &PageTree {
        self.service.tree()
    }

    fn main(&self) -> PageId {
        self.tree().main_page().expect("main page")
    }

    fn current_id(&self) -> PageId {
        self.tree().current_page().expect("current page")
    }

    fn name(&self, id: PageId) -> String {
        self.tree()
            .descriptor(id)
            .map(|descriptor| descriptor.name().to_string())
            .unwrap_or_default()
    }

    fn names(&self, ids: &[PageId]) -> Vec<String> {
        ids.iter().map(|&id| self.name(id)).collect()
    }

    fn current(&self) -> String {
        self.name(self.current_id())
    }

    /// Entries of the stack holding the current page.
    fn stack(&self) -> Vec<String> {
        let stack = self
            .tree()
            .navigation_stack(self.current_id())
            .expect("current page is in a stack");
        self.names(self.tree().stack_entries(stack))
    }

    fn modal_names(&self) -> Vec<String> {
        self.names(self.tree().modal_stack(self.main()))
    }

    fn position(&self, event: Event) -> usize {
        self.journal
            .position(&event)
            .unwrap_or_else(|| panic!("{:?} was not recorded", event))
    }

    fn events_for(&self, label: &str) -> Vec<EventKind> {
        self.journal
            .events()
            .into_iter()
            .filter(|event| event.label == label)
            .map(|event| event.kind)
            .collect()
    }

    async fn wait_for_intercept(&self, expected: &Event) -> bool {
        for _ in 0..100 {
            if self.journal.intercepts().contains(expected) {
                return true;
            }
            tokio::task::yield_now().await;
        }
        false
    }
}

fn assert_ok(result: NavigationResult) {
    assert!(result.is_success(), "navigation failed: {:?}", result.error());
}

fn error_kind(result: &NavigationResult) -> Option<ErrorKind> {
    result.error().map(NavigationError::kind)
}

#[tokio::test]
async fn test_absolute_uri_builds_stack_in_segment_order() {
    let mut harness = Harness::new();

    assert_ok(harness.navigate("/Nav/A/B/C").await);

    assert_eq!(harness.tree().kind(harness.main()), Some(PageKind::Stack));
    assert_eq!(harness.stack(), vec!["A", "B", "C"]);
    assert_eq!(harness.current(), "C");
    for page in ["A", "B", "C"] {
        assert_eq!(
            harness.events_for(page).iter().filter(|&&kind| kind == EventKind::Initialize).count(),
            1,
            "{} initialized once",
            page
        );
    }
}

#[tokio::test]
async fn test_go_back_undoes_pushes() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Nav/Home").await);
    let main = harness.main();
    let pages_before = harness.tree().len();

    assert_ok(harness.navigate_here("A/B/C").await);
    assert_eq!(harness.stack(), vec!["Home", "A", "B", "C"]);

    harness.journal.clear();
    for _ in 0..3 {
        assert_ok(harness.go_back().await);
    }

    assert_eq!(harness.main(), main);
    assert_eq!(harness.stack(), vec!["Home"]);
    assert_eq!(harness.tree().len(), pages_before);
    assert_eq!(harness.journal.count(EventKind::Destroy), 3);
    for (popped, below) in [("C", "B"), ("B", "A"), ("A", "Home")] {
        let left = harness.position(Event::navigated_from(popped));
        let entered = harness.position(Event::navigated_to(below));
        let destroyed = harness.position(Event::destroy(popped));
        assert!(left < entered, "{} left before {} is entered", popped, below);
        assert!(entered < destroyed, "{} entered before {} is destroyed", below, popped);
    }
}

#[tokio::test]
async fn test_go_back_from_main_stack_root_fails() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Nav/Home").await);

    let result = harness.go_back().await;

    assert!(matches!(result.error(), Some(NavigationError::PopMainPage { .. })));
    assert_eq!(error_kind(&result), Some(ErrorKind::InvalidOperation));
    assert_eq!(harness.stack(), vec!["Home"]);
}

#[tokio::test]
async fn test_clear_stack_replaces_previous_entries() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Nav/X").await);

    assert_ok(harness.navigate("Y").await);

    assert_eq!(harness.stack(), vec!["Y"]);
    assert_eq!(harness.journal.count(EventKind::Destroy), 1);
    assert!(harness.journal.position(&Event::destroy("X")).is_some());
}

#[tokio::test]
async fn test_stack_policy_can_keep_entries() {
    let mut harness = Harness::new();
    harness.journal.set_clear_stack("Nav", false);
    assert_ok(harness.navigate("/Nav/X").await);

    assert_ok(harness.navigate("Y").await);

    assert_eq!(harness.stack(), vec!["X", "Y"]);
    assert_eq!(harness.journal.count(EventKind::Destroy), 0);
}

#[tokio::test]
async fn test_settings_decide_when_stack_has_no_policy() {
    let settings = NavigationSettings {
        clear_stack_on_navigation: false,
        ..NavigationSettings::default()
    };
    let mut harness = Harness::with_settings(settings);
    assert_ok(harness.navigate("/Nav/X").await);

    assert_ok(harness.navigate("Y").await);

    assert_eq!(harness.stack(), vec!["X", "Y"]);
}

#[tokio::test]
async fn test_root_of_matching_type_is_reused() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Nav/A/B").await);
    let nav = harness.main();
    let root = harness.tree().stack_entries(nav)[0];

    assert_ok(harness.navigate("A/C").await);

    assert_eq!(harness.stack(), vec!["A", "C"]);
    assert_eq!(harness.tree().stack_entries(nav)[0], root);
    assert_eq!(harness.journal.count(EventKind::Destroy), 1);
    assert!(harness.journal.position(&Event::destroy("B")).is_some());
}

#[tokio::test]
async fn test_declined_navigation_leaves_tree_untouched() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Nav/Home").await);
    let outline = harness.tree().outline();
    let pages = harness.tree().len();
    harness.journal.refuse("A");
    harness.journal.clear();
    harness.host.clear();

    let result = harness.navigate_here("A").await;

    assert!(result.is_declined());
    assert!(!result.is_success());
    assert_eq!(error_kind(&result), Some(ErrorKind::Declined));
    assert_eq!(harness.tree().outline(), outline);
    assert_eq!(harness.tree().len(), pages);
    assert_eq!(harness.journal.count(EventKind::NavigatedTo), 0);
    assert_eq!(harness.journal.count(EventKind::Destroy), 0);
    assert!(harness.host.mutations().is_empty());
}

#[tokio::test]
async fn test_declined_source_keeps_its_page() {
    let mut harness = Harness::new();
    harness.journal.set_clear_stack("Nav", false);
    assert_ok(harness.navigate("/Nav/Home").await);
    harness.journal.refuse("Home");

    let result = harness.navigate("A").await;

    assert!(result.is_declined());
    assert_eq!(harness.stack(), vec!["Home"]);
    assert_eq!(harness.journal.count(EventKind::Initialize), 2, "only Nav and Home");
}

#[tokio::test]
async fn test_declined_clear_stack_navigation_restores_popped_pages() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Nav/A/B").await);
    let nav = harness.main();
    let entries = harness.tree().stack_entries(nav).to_vec();
    harness.journal.refuse("C");

    let result = harness.navigate("C").await;

    assert!(result.is_declined());
    assert_eq!(harness.tree().stack_entries(nav), entries.as_slice());
    assert_eq!(harness.journal.count(EventKind::Destroy), 0);
}

#[tokio::test]
async fn test_declined_first_segment_of_relative_run_pushes_nothing() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Nav/Home").await);
    let outline = harness.tree().outline();
    let pages = harness.tree().len();
    harness.journal.refuse("A");
    harness.journal.clear();
    harness.host.clear();

    let result = harness.navigate_here("A/B").await;

    assert!(result.is_declined());
    assert_eq!(harness.tree().outline(), outline);
    assert_eq!(harness.tree().len(), pages);
    assert_eq!(harness.journal.count(EventKind::NavigatedTo), 0);
    assert!(harness.events_for("B").is_empty(), "B is never asked, initialized or shown");
    assert!(harness.host.mutations().is_empty());
}

#[tokio::test]
async fn test_declined_last_segment_of_relative_run_pushes_nothing() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Nav/Home").await);
    let outline = harness.tree().outline();
    harness.journal.refuse("B");
    harness.journal.clear();
    harness.host.clear();

    let result = harness.navigate_here("A/B/C").await;

    assert!(result.is_declined());
    assert_eq!(harness.tree().outline(), outline);
    assert_eq!(harness.events_for("A"), vec![EventKind::CanNavigate]);
    assert_eq!(harness.events_for("B"), vec![EventKind::CanNavigate]);
    assert!(harness.events_for("C").is_empty());
    assert_eq!(harness.journal.count(EventKind::Initialize), 0);
    assert!(harness.host.mutations().is_empty());
}

#[tokio::test]
async fn test_declined_absolute_run_keeps_main_page() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Nav/Home").await);
    let main = harness.main();
    let outline = harness.tree().outline();
    let pages = harness.tree().len();
    harness.journal.refuse("A");
    harness.journal.clear();
    harness.host.clear();

    let result = harness.navigate("/Nav/A/B").await;

    assert!(result.is_declined());
    assert_eq!(harness.main(), main);
    assert_eq!(harness.tree().outline(), outline);
    assert_eq!(harness.tree().len(), pages, "the new stack and its pages are discarded");
    assert_eq!(harness.journal.count(EventKind::NavigatedTo), 0);
    assert_eq!(harness.journal.count(EventKind::Destroy), 0);
    assert!(harness.events_for("B").is_empty());
    assert!(harness.host.mutations().is_empty());
}

#[tokio::test]
async fn test_declined_run_after_clear_restores_popped_pages() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Nav/X").await);
    assert_ok(harness.navigate_here("Y").await);
    let nav = harness.main();
    let entries = harness.tree().stack_entries(nav).to_vec();
    let outline = harness.tree().outline();
    let pages = harness.tree().len();
    harness.journal.refuse("B");
    harness.journal.clear();

    let result = harness.navigate("A/B").await;

    assert!(result.is_declined());
    assert_eq!(harness.tree().stack_entries(nav), entries.as_slice());
    assert_eq!(harness.tree().outline(), outline);
    assert_eq!(harness.tree().len(), pages);
    assert_eq!(harness.current(), "Y");
    assert_eq!(harness.journal.count(EventKind::NavigatedTo), 0);
    assert_eq!(harness.journal.count(EventKind::NavigatedFrom), 0);
    assert_eq!(harness.journal.count(EventKind::Destroy), 0);
    assert!(harness.events_for("A").iter().all(|&kind| kind == EventKind::CanNavigate));
}

#[tokio::test]
async fn test_discarded_stack_destroys_pages_it_showed() {
    let mut harness = Harness::new();
    harness.journal.fail_initialize("A");

    let result = harness.navigate("/Nav/A/B").await;

    assert_eq!(error_kind(&result), Some(ErrorKind::Unexpected));
    assert!(harness.tree().is_empty());
    let b_events = harness.events_for("B");
    assert_eq!(
        b_events[b_events.len().saturating_sub(3)..],
        [EventKind::NavigatedTo, EventKind::NavigatedFrom, EventKind::Destroy]
    );
    assert!(!harness.events_for("A").contains(&EventKind::NavigatedTo));
    assert!(!harness.events_for("A").contains(&EventKind::Destroy));
}

#[tokio::test]
async fn test_uri_with_fragment_is_rejected() {
    let mut harness = Harness::new();

    let result = harness.navigate("/Nav/A#top").await;

    assert!(matches!(result.error(), Some(NavigationError::Uri(_))));
    assert_eq!(error_kind(&result), Some(ErrorKind::InvalidOperation));
    assert!(harness.tree().is_empty());
}

#[tokio::test]
async fn test_remove_and_push_attaches_before_destroying() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Nav/A/B/C").await);

    assert_ok(harness.navigate_here("__Remove/NewPage").await);

    assert_eq!(harness.stack(), vec!["A", "B", "NewPage"]);
    assert!(
        harness.position(Event::navigated_to("NewPage")) < harness.position(Event::destroy("C"))
    );
}

#[tokio::test]
async fn test_relative_pops_remove_ancestors() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Nav/A/B/C").await);

    assert_ok(harness.navigate_here("../../D").await);

    assert_eq!(harness.stack(), vec!["A", "D"]);
    assert!(harness.position(Event::destroy("C")) < harness.position(Event::destroy("B")));
}

#[tokio::test]
async fn test_trailing_relative_pops_go_back() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Nav/A/B/C").await);

    assert_ok(harness.navigate_here("../../").await);

    assert_eq!(harness.stack(), vec!["A"]);
    assert_eq!(harness.current(), "A");
    assert_eq!(harness.journal.count(EventKind::Destroy), 2);
}

#[tokio::test]
async fn test_remove_requires_stack_parent() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Home").await);

    let result = harness.navigate("../A").await;

    assert!(matches!(
        result.error(),
        Some(NavigationError::RemoveRequiresStack { .. })
    ));
    assert_eq!(error_kind(&result), Some(ErrorKind::InvalidOperation));
}

#[tokio::test]
async fn test_selected_tab_only_moves_pointer() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Nav/Tabs").await);
    assert_eq!(harness.current(), "TabA");
    harness.journal.clear();

    assert_ok(harness.navigate("Tabs?selectedTab=TabB").await);

    assert_eq!(harness.current(), "TabB");
    for tab in ["TabA", "TabB"] {
        let kinds = harness.events_for(tab);
        assert!(
            !kinds.iter().any(|kind| matches!(
                kind,
                EventKind::Initialize | EventKind::InitializeAsync | EventKind::Destroy
            )),
            "{} got {:?}",
            tab,
            kinds
        );
    }
    assert!(harness.host.names().contains(&"select-child"));
}

#[tokio::test]
async fn test_selected_tab_applies_to_new_tab_set() {
    let mut harness = Harness::new();

    assert_ok(harness.navigate("/Tabs?selectedTab=TabB").await);

    assert_eq!(harness.current(), "TabB");
}

#[tokio::test]
async fn test_selected_item_applies_to_carousel() {
    let mut harness = Harness::new();

    assert_ok(harness.navigate("/Carousel?selectedTab=B").await);

    assert_eq!(harness.current(), "B");
}

#[tokio::test]
async fn test_create_tab_builds_tabs_and_stack_tabs() {
    let mut harness = Harness::new();

    assert_ok(
        harness
            .navigate("/EmptyTabs?createTab=A&createTab=Nav|TabC&selectedTab=TabC")
            .await,
    );

    let tabs = harness.main();
    let children = harness.tree().children(tabs);
    assert_eq!(harness.names(&children), vec!["A", "Nav"]);
    assert_eq!(harness.names(harness.tree().stack_entries(children[1])), vec!["TabC"]);
    assert_eq!(harness.current(), "TabC");
}

#[tokio::test]
async fn test_create_tab_skips_containers_that_are_not_stacks() {
    let mut harness = Harness::new();

    assert_ok(harness.navigate("/EmptyTabs?createTab=Home|A&createTab=B").await);

    let children = harness.tree().children(harness.main());
    assert_eq!(harness.names(&children), vec!["B"]);
    assert_eq!(harness.tree().len(), 2);
}

#[tokio::test]
async fn test_page_outside_stack_is_pushed_modally() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Home").await);

    assert_ok(harness.navigate("A").await);

    assert_eq!(harness.modal_names(), vec!["A"]);
    assert_eq!(harness.current(), "A");
    harness.journal.clear();

    assert_ok(harness.go_back().await);

    assert!(harness.modal_names().is_empty());
    assert_eq!(harness.current(), "Home");
    assert!(harness.position(Event::navigated_to("Home")) < harness.position(Event::destroy("A")));
}

#[tokio::test]
async fn test_modal_stack_root_goes_back_modally() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Home").await);
    assert_ok(harness.navigate("Nav/A").await);
    assert_eq!(harness.modal_names(), vec!["Nav"]);
    assert_eq!(harness.current(), "A");

    assert_ok(harness.go_back().await);

    assert!(harness.modal_names().is_empty());
    assert!(harness.position(Event::destroy("A")) < harness.position(Event::destroy("Nav")));
}

#[tokio::test]
async fn test_stack_go_back_from_modal_stack_root_fails() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Home").await);
    assert_ok(harness.navigate("Nav/A").await);

    let result = harness
        .service
        .go_back(NavigationParameters::new(), NavigationOptions::modal(false))
        .await;

    assert!(matches!(result.error(), Some(NavigationError::PopStackRoot { .. })));
    assert_eq!(harness.current(), "A");
}

#[tokio::test]
async fn test_use_modal_parameter_presents_over_stack() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Nav/A").await);

    assert_ok(harness.navigate_here("B?useModalNavigation=true").await);

    assert_eq!(harness.modal_names(), vec!["B"]);
    assert_eq!(harness.names(harness.tree().stack_entries(harness.main())), vec!["A"]);
}

#[tokio::test]
async fn test_segments_after_master_detail_are_presented_modally() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Nav/A").await);

    assert_ok(harness.navigate_here("B/Shell/Detail").await);

    assert_eq!(harness.names(harness.tree().stack_entries(harness.main())), vec!["A", "B"]);
    assert_eq!(harness.modal_names(), vec!["Shell"]);
    assert_eq!(harness.current(), "Detail");
}

#[tokio::test]
async fn test_master_detail_assigns_first_detail() {
    let mut harness = Harness::new();

    assert_ok(harness.navigate("/Shell/Detail").await);

    let shell = harness.main();
    let detail = harness.tree().detail(shell).expect("detail");
    assert_eq!(harness.name(detail), "Detail");
    assert_eq!(harness.current(), "Detail");
    let names = harness.host.names();
    assert!(names.contains(&"set-detail"));
    assert!(!names.contains(&"set-presented"));
}

#[tokio::test]
async fn test_master_detail_reuses_detail_of_same_type() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Shell/Detail").await);
    let detail = harness.tree().detail(harness.main());

    assert_ok(harness.navigate("Detail").await);

    assert_eq!(harness.tree().detail(harness.main()), detail);
    assert_eq!(harness.journal.count(EventKind::Destroy), 0);
}

#[tokio::test]
async fn test_master_detail_replaces_detail_of_other_type() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Shell/Detail").await);

    assert_ok(harness.navigate("A").await);

    assert_eq!(harness.current(), "A");
    assert!(
        harness.position(Event::navigated_from("Detail")) < harness.position(Event::destroy("Detail"))
    );
}

#[tokio::test]
async fn test_master_detail_presentation_policy() {
    let mut harness = Harness::new();
    harness.journal.set_presented("Shell", true);

    assert_ok(harness.navigate("/Shell/Detail").await);

    let shell = harness.main();
    assert!(matches!(
        harness.tree().get(shell).map(|node| node.content()),
        Some(PageContent::MasterDetail {
            is_presented: true,
            ..
        })
    ));
    assert!(harness.host.names().contains(&"set-presented"));
}

#[tokio::test]
async fn test_master_detail_stack_reused_when_next_page_is_shown() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Shell/Nav/A").await);
    let detail = harness.tree().detail(harness.main());

    assert_ok(harness.navigate("Nav/A").await);
    assert_eq!(harness.tree().detail(harness.main()), detail);
    assert_eq!(harness.journal.count(EventKind::Destroy), 0);

    assert_ok(harness.navigate("Nav/B").await);
    assert_ne!(harness.tree().detail(harness.main()), detail);
    assert_eq!(harness.stack(), vec!["B"]);
    assert!(harness.position(Event::destroy("A")) < harness.position(Event::destroy("Nav")));
}

#[tokio::test]
async fn test_master_detail_modal_segment_keeps_detail() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Shell/Detail").await);
    let detail = harness.tree().detail(harness.main());

    assert_ok(harness.navigate("A?useModalNavigation=true").await);

    assert_eq!(harness.tree().detail(harness.main()), detail);
    assert_eq!(harness.modal_names(), vec!["A"]);
}

#[tokio::test]
async fn test_unknown_segment_is_not_found() {
    let mut harness = Harness::new();

    let result = harness.navigate("/Nope").await;

    assert_eq!(error_kind(&result), Some(ErrorKind::NotFound));
    assert!(harness.tree().is_empty());
}

#[tokio::test]
async fn test_factory_failure_is_unexpected() {
    let mut harness = Harness::new();

    let result = harness.navigate("/Nav/Broken").await;

    assert!(matches!(result.error(), Some(NavigationError::CreatePage { .. })));
    assert_eq!(error_kind(&result), Some(ErrorKind::Unexpected));
    assert!(harness.tree().is_empty(), "unattached pages are discarded");
}

#[tokio::test]
async fn test_initialize_failure_keeps_stack() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Nav/A").await);
    harness.journal.fail_initialize("B");

    let result = harness.navigate("B").await;

    assert!(matches!(result.error(), Some(NavigationError::Initialize { .. })));
    assert_eq!(error_kind(&result), Some(ErrorKind::Unexpected));
    assert_eq!(harness.stack(), vec!["A"]);
    assert_eq!(harness.tree().len(), 2);
}

#[tokio::test]
async fn test_go_back_to_root_pops_everything_above_root() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Nav/A/B/C").await);
    harness.journal.clear();

    assert_ok(harness.service.go_back_to_root(NavigationParameters::new()).await);

    assert_eq!(harness.stack(), vec!["A"]);
    assert!(harness.position(Event::destroy("C")) < harness.position(Event::destroy("B")));
    assert!(harness.position(Event::destroy("B")) < harness.position(Event::navigated_to("A")));
}

#[tokio::test]
async fn test_select_tab_switches_selection() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Tabs").await);
    harness.journal.clear();

    assert_ok(harness.service.select_tab("TabB", NavigationParameters::new()).await);

    assert_eq!(harness.current(), "TabB");
    assert_eq!(harness.events_for("TabA"), vec![EventKind::CanNavigate, EventKind::NavigatedFrom]);
    assert_eq!(harness.events_for("TabB"), vec![EventKind::NavigatedTo]);
}

#[tokio::test]
async fn test_select_tab_requires_tab_set() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Home").await);

    let result = harness.service.select_tab("A", NavigationParameters::new()).await;

    assert!(matches!(result.error(), Some(NavigationError::NoTabSet { .. })));
}

#[tokio::test]
async fn test_select_tab_reports_missing_tab() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Tabs").await);

    let result = harness.service.select_tab("A", NavigationParameters::new()).await;

    assert!(matches!(result.error(), Some(NavigationError::TabNotFound { .. })));
    assert_eq!(error_kind(&result), Some(ErrorKind::NotFound));
    assert_eq!(harness.current(), "TabA");
}

#[tokio::test]
async fn test_absolute_navigation_destroys_previous_main_and_its_modals() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Home").await);
    assert_ok(harness.navigate("A").await);

    assert_ok(harness.navigate("/X").await);

    assert_eq!(harness.current(), "X");
    assert!(harness.modal_names().is_empty());
    assert!(harness.position(Event::navigated_from("A")) < harness.position(Event::navigated_to("X")));
    assert!(harness.position(Event::destroy("A")) < harness.position(Event::destroy("Home")));
    assert_eq!(harness.tree().len(), 1);
}

#[tokio::test]
async fn test_parameters_reach_lifecycle_calls() {
    let mut harness = Harness::new();
    let parameters: NavigationParameters = [("user", "ann")].into_iter().collect();

    assert_ok(
        harness
            .service
            .navigate("/Nav/A?id=7", parameters, NavigationOptions::default())
            .await,
    );

    let delivered = harness
        .journal
        .parameters_of(&Event::navigated_to("A"))
        .expect("A was entered");
    assert_eq!(delivered.try_get::<String>("id").as_deref(), Some("7"));
    assert_eq!(delivered.try_get::<String>("user").as_deref(), Some("ann"));
    assert_eq!(delivered.navigation_mode(), Some(NavigationMode::New));
}

#[tokio::test]
async fn test_go_back_delivers_back_mode() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Nav/A/B").await);

    assert_ok(harness.go_back().await);

    let delivered = harness
        .journal
        .parameters_of(&Event::navigated_to("A"))
        .expect("A was entered again");
    assert_eq!(delivered.navigation_mode(), Some(NavigationMode::Back));
}

#[tokio::test]
async fn test_intercept_hooks_report_push_and_pop() {
    let mut harness = Harness::new();
    harness.journal.set_clear_stack("Nav", false);
    assert_ok(harness.navigate("/Nav/A").await);

    assert_ok(harness.navigate_here("B").await);
    let pushed = Event {
        kind: EventKind::Pushed,
        label: "B".to_string(),
    };
    assert!(harness.wait_for_intercept(&pushed).await);

    assert_ok(harness.go_back().await);
    let popped = Event {
        kind: EventKind::Popped,
        label: "B".to_string(),
    };
    assert!(harness.wait_for_intercept(&popped).await);

    harness.service.shutdown().await;
}

#[tokio::test]
async fn test_intercept_hooks_can_be_disabled() {
    let settings = NavigationSettings {
        intercept_hooks: false,
        ..NavigationSettings::default()
    };
    let mut harness = Harness::with_settings(settings);
    assert_ok(harness.navigate("/Nav/A/B").await);
    assert_ok(harness.go_back().await);

    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    assert!(harness.journal.intercepts().is_empty());
}

#[tokio::test]
async fn test_navigate_from_unknown_page_fails() {
    let mut harness = Harness::new();
    assert_ok(harness.navigate("/Home").await);
    let stale = harness.main();
    assert_ok(harness.navigate("/X").await);

    let result = harness
        .service
        .navigate_from(stale, "A", NavigationParameters::new(), NavigationOptions::default())
        .await;

    assert!(matches!(result.error(), Some(NavigationError::UnknownPage { .. })));
}
