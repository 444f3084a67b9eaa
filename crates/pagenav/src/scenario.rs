//! Scenario files: the pages an application registers and the navigation
//! steps to run against them.
//!
//! ```toml
//! [[pages]]
//! name = "Shell"
//! kind = "master-detail"
//! children = ["Menu"]
//!
//! [[pages]]
//! name = "Menu"
//!
//! [[steps]]
//! action = "navigate"
//! uri = "/Shell/Inbox"
//! ```

use anyhow::{bail, Context, Error};
use indexmap::IndexMap;
use pagenav_core::lifecycle::{ConfirmNavigation, Destructible, Lifecycle, NavigationAware, StackOptions};
use pagenav_core::page::{Mutation, PageTree};
use pagenav_core::parameters::NavigationParameters;
use pagenav_core::provider::{ApplicationHost, FactoryPageProvider, ResolvedPage};
use pagenav_core::registry::{PageKind, TypeDescriptor};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Nesting limit for preset children, which may refer to each other.
const MAX_DEPTH: usize = 16;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Scenario {
    #[serde(default)]
    pub pages: Vec<PageDefinition>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PageDefinition {
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: PageKind,
    pub title: Option<String>,
    pub icon: Option<String>,
    /// Names of the pages this one is created with.
    #[serde(default)]
    pub children: Vec<String>,
    /// The page refuses every navigation away from or into it.
    #[serde(default)]
    pub refuse: bool,
    /// Clear-stack policy of a stack page; the settings decide when unset.
    pub clear_stack: Option<bool>,
}

fn default_kind() -> PageKind {
    PageKind::Content
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Navigate,
    GoBack,
    GoBackToRoot,
    SelectTab,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Expectation {
    #[default]
    Success,
    Declined,
    Failure,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Step {
    pub action: Action,
    pub uri: Option<String>,
    /// Tab name for `select-tab`.
    pub name: Option<String>,
    pub modal: Option<bool>,
    pub animated: Option<bool>,
    #[serde(default)]
    pub parameters: IndexMap<String, String>,
    #[serde(default)]
    pub expect: Expectation,
}

impl Step {
    pub fn parameters(&self) -> NavigationParameters {
        self.parameters
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect()
    }

    /// Short description used in output and log events.
    pub fn describe(&self) -> String {
        match self.action {
            Action::Navigate => format!("navigate {}", self.uri.as_deref().unwrap_or("")),
            Action::GoBack => "go-back".to_string(),
            Action::GoBackToRoot => "go-back-to-root".to_string(),
            Action::SelectTab => format!("select-tab {}", self.name.as_deref().unwrap_or("")),
        }
    }
}

impl Scenario {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Scenario, Error> {
        let path = path.as_ref();
        let scenario: Scenario = pagenav_core::helpers::load_toml(path)
            .with_context(|| format!("can't load scenario {}", path.display()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<(), Error> {
        for (index, step) in self.steps.iter().enumerate() {
            match step.action {
                Action::Navigate if step.uri.is_none() => {
                    bail!("step {} navigates without a uri", index + 1)
                }
                Action::SelectTab if step.name.is_none() => {
                    bail!("step {} selects a tab without a name", index + 1)
                }
                _ => {}
            }
        }
        for page in &self.pages {
            if let Some(child) = page
                .children
                .iter()
                .find(|child| !self.pages.iter().any(|page| &page.name == *child))
            {
                bail!("page {} has undefined child {}", page.name, child);
            }
        }
        Ok(())
    }

    /// A provider creating every defined page.
    pub fn provider(&self) -> FactoryPageProvider {
        let definitions: Arc<IndexMap<String, PageDefinition>> = Arc::new(
            self.pages
                .iter()
                .map(|page| (page.name.clone(), page.clone()))
                .collect(),
        );

        let mut provider = FactoryPageProvider::new();
        for page in &self.pages {
            let definitions = Arc::clone(&definitions);
            let name = page.name.clone();
            let registered = provider.register(
                &page.name,
                TypeDescriptor::new(page.name.as_str(), page.kind),
                move |_| build(&definitions, &name, 0),
            );
            if !registered {
                tracing::warn!(page = %page.name, "duplicate page definition ignored");
            }
        }
        provider
    }
}

fn build(
    definitions: &IndexMap<String, PageDefinition>,
    name: &str,
    depth: usize,
) -> Result<ResolvedPage, Error> {
    if depth > MAX_DEPTH {
        bail!("children of {} nest deeper than {} levels", name, MAX_DEPTH);
    }
    let Some(definition) = definitions.get(name) else {
        bail!("page {} is not defined", name);
    };

    let page = Arc::new(ScenarioPage {
        name: definition.name.clone(),
        refuse: definition.refuse,
        clear_stack: definition.clear_stack,
    });
    let mut resolved = ResolvedPage::new(
        TypeDescriptor::new(definition.name.as_str(), definition.kind),
        page,
    );
    if let Some(title) = &definition.title {
        resolved = resolved.with_title(title.clone());
    }
    if let Some(icon) = &definition.icon {
        resolved = resolved.with_icon(icon.clone());
    }
    for child in &definition.children {
        resolved = resolved.with_child(build(definitions, child, depth + 1)?);
    }
    Ok(resolved)
}

/// A page that reports its lifecycle calls as log events.
struct ScenarioPage {
    name: String,
    refuse: bool,
    clear_stack: Option<bool>,
}

impl ConfirmNavigation for ScenarioPage {
    fn can_navigate(&self, parameters: &NavigationParameters) -> bool {
        tracing::info!(page = %self.name, parameters = %parameters, allowed = !self.refuse, "can navigate");
        !self.refuse
    }
}

impl NavigationAware for ScenarioPage {
    fn on_navigated_from(&self, parameters: &NavigationParameters) {
        tracing::info!(page = %self.name, parameters = %parameters, "navigated from");
    }

    fn on_navigated_to(&self, parameters: &NavigationParameters) {
        tracing::info!(page = %self.name, parameters = %parameters, "navigated to");
    }
}

impl Destructible for ScenarioPage {
    fn destroy(&self) {
        tracing::info!(page = %self.name, "destroyed");
    }
}

impl StackOptions for ScenarioPage {
    fn clear_stack_on_navigation(&self) -> bool {
        self.clear_stack.unwrap_or(true)
    }
}

impl Lifecycle for ScenarioPage {
    fn as_confirm_navigation(&self) -> Option<&dyn ConfirmNavigation> {
        Some(self)
    }

    fn as_navigation_aware(&self) -> Option<&dyn NavigationAware> {
        Some(self)
    }

    fn as_destructible(&self) -> Option<&dyn Destructible> {
        Some(self)
    }

    fn as_stack_options(&self) -> Option<&dyn StackOptions> {
        self.clear_stack.map(|_| self as &dyn StackOptions)
    }
}

/// Prints each committed mutation.
pub struct PrintingHost {
    pub verbose: bool,
}

impl ApplicationHost for PrintingHost {
    fn commit(&self, tree: &PageTree, mutation: &Mutation) {
        tracing::debug!(mutation = ?mutation, "host commit");
        if self.verbose {
            println!("  {}", describe_mutation(tree, mutation));
        }
    }
}

fn describe_mutation(tree: &PageTree, mutation: &Mutation) -> String {
    let label = |page: &pagenav_core::page::PageId| tree.label(*page);
    match mutation {
        Mutation::SetMainPage { page, .. } => format!("set-main-page {}", label(page)),
        Mutation::Push { stack, page, .. } => format!("push {} onto {}", label(page), label(stack)),
        Mutation::InsertBefore {
            stack,
            page,
            before,
        } => format!("insert {} below {} in {}", label(page), label(before), label(stack)),
        Mutation::Pop { stack, page, .. } => format!("pop {} off {}", label(page), label(stack)),
        Mutation::PopToRoot { stack, removed, .. } => {
            format!("pop {} pages off {}", removed.len(), label(stack))
        }
        Mutation::Remove { stack, page } => format!("remove {} from {}", label(page), label(stack)),
        Mutation::PushModal {
            presenter, page, ..
        } => format!("present {} over {}", label(page), label(presenter)),
        Mutation::PopModal {
            presenter, page, ..
        } => format!("dismiss {} from {}", label(page), label(presenter)),
        Mutation::AddChild { container, page } => {
            format!("add {} to {}", label(page), label(container))
        }
        Mutation::SelectChild { container, page } => {
            format!("select {} in {}", label(page), label(container))
        }
        Mutation::SetDetail { shell, page, .. } => {
            format!("show {} as detail of {}", label(page), label(shell))
        }
        Mutation::SetPresented { shell, presented } => {
            format!("set presented of {} to {}", label(shell), presented)
        }
    }
}
