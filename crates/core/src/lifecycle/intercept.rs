use super::Lifecycle;
use crate::parameters::NavigationParameters;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Which intercept notification to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptKind {
    Pushed,
    Popped,
}

/// Owner of the in-flight push and pop notifications.
///
/// Each kind has at most one running task. Firing a kind aborts the task
/// still running for it; aborted notifications are not retried.
#[derive(Debug)]
pub struct InterceptHooks {
    enabled: bool,
    pushed: Option<JoinHandle<()>>,
    popped: Option<JoinHandle<()>>,
}

impl InterceptHooks {
    pub fn new(enabled: bool) -> Self {
        InterceptHooks {
            enabled,
            pushed: None,
            popped: None,
        }
    }

    /// Spawns a notification for every object that intercepts navigation.
    ///
    /// Requires a Tokio runtime; without one the notification is dropped.
    pub fn fire(
        &mut self,
        kind: InterceptKind,
        objects: Vec<Arc<dyn Lifecycle>>,
        parameters: NavigationParameters,
    ) {
        if !self.enabled {
            return;
        }

        let interceptors: Vec<Arc<dyn Lifecycle>> = objects
            .into_iter()
            .filter(|object| object.as_navigation_intercept().is_some())
            .collect();
        if interceptors.is_empty() {
            return;
        }

        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(kind = ?kind, "no async runtime, intercept hook skipped");
            return;
        };

        let slot = match kind {
            InterceptKind::Pushed => &mut self.pushed,
            InterceptKind::Popped => &mut self.popped,
        };
        if let Some(previous) = slot.take() {
            if !previous.is_finished() {
                tracing::debug!(kind = ?kind, "superseding running intercept hook");
            }
            previous.abort();
        }

        *slot = Some(runtime.spawn(async move {
            for object in interceptors {
                let Some(hook) = object.as_navigation_intercept() else {
                    continue;
                };
                match kind {
                    InterceptKind::Pushed => hook.on_pushed(&parameters).await,
                    InterceptKind::Popped => hook.on_popped(&parameters).await,
                }
            }
        }));
    }

    /// True while a notification of `kind` is still running.
    pub fn is_running(&self, kind: InterceptKind) -> bool {
        let slot = match kind {
            InterceptKind::Pushed => &self.pushed,
            InterceptKind::Popped => &self.popped,
        };
        slot.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Aborts outstanding notifications and waits until their tasks are gone.
    pub async fn shutdown(&mut self) {
        for handle in [self.pushed.take(), self.popped.take()].into_iter().flatten() {
            handle.abort();
            if let Err(err) = handle.await {
                if !err.is_cancelled() {
                    tracing::warn!(error = %err, "intercept hook failed");
                }
            }
        }
    }
}

impl Drop for InterceptHooks {
    fn drop(&mut self) {
        for handle in [self.pushed.take(), self.popped.take()].into_iter().flatten() {
            handle.abort();
        }
    }
}
