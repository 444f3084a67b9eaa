use crate::page::PageId;
use crate::parameters::ParameterError;
use crate::uri::UriError;

/// Broad classification of a failed navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A page refused to be left or entered. Not an error from the
    /// application's point of view.
    Declined,
    /// A segment names no registered page.
    NotFound,
    /// The request breaks a structural rule of the page tree.
    InvalidOperation,
    /// A collaborator failed.
    Unexpected,
}

#[derive(thiserror::Error, Debug)]
pub enum NavigationError {
    /// A confirm-navigation capability of `page` returned false.
    #[error("navigation declined by {page}")]
    Declined { page: String },

    /// Nothing is registered for the segment, or its factory produced nothing.
    #[error("no page is registered for '{segment}'")]
    NotFound { segment: String },

    /// A remove segment was used from a page that isn't a stack entry.
    #[error("removing pages requires a stack parent, {page} has none")]
    RemoveRequiresStack { page: String },

    /// Go back from the application's main page.
    #[error("can't pop the main page {page}")]
    PopMainPage { page: String },

    /// Go back from the root entry of a stack.
    #[error("can't go back from stack root {page}")]
    PopStackRoot { page: String },

    /// Go back found neither a stack entry nor a modal layer to pop.
    #[error("nothing to pop above {page}")]
    NothingToPop { page: String },

    /// Tab selection from a page that isn't inside a tab set.
    #[error("no tab set contains {page}")]
    NoTabSet { page: String },

    /// Tab selection by a name that matches no tab.
    #[error("no tab matches '{name}'")]
    TabNotFound { name: String },

    /// A page handle that isn't in the tree.
    #[error("unknown page {page}")]
    UnknownPage { page: PageId },

    /// A structural change that doesn't fit the current shape of the tree.
    #[error("invalid page structure: {message}")]
    InvalidStructure { message: String },

    #[error(transparent)]
    Uri(#[from] UriError),

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    /// The factory of a registered page failed.
    #[error("can't create page for '{segment}'")]
    CreatePage {
        segment: String,
        #[source]
        source: anyhow::Error,
    },

    /// Asynchronous initialization of a page failed.
    #[error("can't initialize {page}")]
    Initialize {
        page: String,
        #[source]
        source: anyhow::Error,
    },
}

impl NavigationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NavigationError::Declined { .. } => ErrorKind::Declined,
            NavigationError::NotFound { .. } | NavigationError::TabNotFound { .. } => {
                ErrorKind::NotFound
            }
            NavigationError::RemoveRequiresStack { .. }
            | NavigationError::PopMainPage { .. }
            | NavigationError::PopStackRoot { .. }
            | NavigationError::NothingToPop { .. }
            | NavigationError::NoTabSet { .. }
            | NavigationError::UnknownPage { .. }
            | NavigationError::InvalidStructure { .. }
            | NavigationError::Uri(_)
            | NavigationError::Parameter(_) => ErrorKind::InvalidOperation,
            NavigationError::CreatePage { .. } | NavigationError::Initialize { .. } => {
                ErrorKind::Unexpected
            }
        }
    }

    pub fn is_declined(&self) -> bool {
        self.kind() == ErrorKind::Declined
    }
}
