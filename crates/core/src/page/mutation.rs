use super::PageId;

/// A structural change committed to the page tree.
///
/// The navigation service applies each mutation to its [`PageTree`](super::PageTree)
/// and then hands the same value to the
/// [`ApplicationHost`](crate::provider::ApplicationHost) so the toolkit can
/// mirror it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// `page` becomes the application's main page, replacing `previous`.
    SetMainPage {
        page: PageId,
        previous: Option<PageId>,
    },
    /// `page` is pushed on top of `stack`.
    Push {
        stack: PageId,
        page: PageId,
        animated: bool,
    },
    /// `page` is inserted into `stack` right below `before`.
    InsertBefore {
        stack: PageId,
        page: PageId,
        before: PageId,
    },
    /// The top of `stack`, `page`, is popped.
    Pop {
        stack: PageId,
        page: PageId,
        animated: bool,
    },
    /// Every entry above the root of `stack` is popped, top first.
    PopToRoot {
        stack: PageId,
        removed: Vec<PageId>,
        animated: bool,
    },
    /// `page` is removed from anywhere inside `stack`.
    Remove { stack: PageId, page: PageId },
    /// `page` is presented modally above the root `presenter`.
    PushModal {
        presenter: PageId,
        page: PageId,
        animated: bool,
    },
    /// The top modal page of `presenter`, `page`, is dismissed.
    PopModal {
        presenter: PageId,
        page: PageId,
        animated: bool,
    },
    /// `page` is appended to a tab set or carousel.
    AddChild { container: PageId, page: PageId },
    /// `page` becomes the selected child of a tab set or carousel.
    SelectChild { container: PageId, page: PageId },
    /// `page` replaces `previous` as the detail of `shell`.
    SetDetail {
        shell: PageId,
        page: PageId,
        previous: Option<PageId>,
    },
    /// Shows or hides the master pane of `shell`.
    SetPresented { shell: PageId, presented: bool },
}

impl Mutation {
    /// Short name used in log events.
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::SetMainPage { .. } => "set-main-page",
            Mutation::Push { .. } => "push",
            Mutation::InsertBefore { .. } => "insert-before",
            Mutation::Pop { .. } => "pop",
            Mutation::PopToRoot { .. } => "pop-to-root",
            Mutation::Remove { .. } => "remove",
            Mutation::PushModal { .. } => "push-modal",
            Mutation::PopModal { .. } => "pop-modal",
            Mutation::AddChild { .. } => "add-child",
            Mutation::SelectChild { .. } => "select-child",
            Mutation::SetDetail { .. } => "set-detail",
            Mutation::SetPresented { .. } => "set-presented",
        }
    }
}
