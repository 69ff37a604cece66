// ── Error boundaries ──
//
// Confines a rendering failure to one section. A failed section shows a
// fallback with a retry action while its siblings keep working.

use std::fmt;

use tracing::{error, info, warn};

use crate::error::CoreError;

type RecoveryFn = Box<dyn FnMut() -> bool + Send>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BoundaryState {
    #[default]
    Healthy,
    Failed {
        message: String,
    },
}

pub struct ErrorBoundary {
    section: &'static str,
    state: BoundaryState,
    recovery: Option<RecoveryFn>,
}

impl ErrorBoundary {
    pub fn new(section: &'static str) -> Self {
        Self {
            section,
            state: BoundaryState::Healthy,
            recovery: None,
        }
    }

    /// Attempted once after a failure, before falling back. Returning
    /// `true` means the section may be rendered again right away.
    #[must_use]
    pub fn with_recovery(mut self, recovery: impl FnMut() -> bool + Send + 'static) -> Self {
        self.recovery = Some(Box::new(recovery));
        self
    }

    pub fn section(&self) -> &'static str {
        self.section
    }

    pub fn state(&self) -> &BoundaryState {
        &self.state
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, BoundaryState::Failed { .. })
    }

    /// Run a section render. `None` means the fallback should be shown.
    pub fn run<T>(&mut self, mut render: impl FnMut() -> Result<T, CoreError>) -> Option<T> {
        if self.is_failed() {
            return None;
        }
        match render() {
            Ok(value) => Some(value),
            Err(first) => {
                error!(section = self.section, error = %first, "section render failed");
                if self.try_recover() {
                    match render() {
                        Ok(value) => return Some(value),
                        Err(e) => {
                            error!(section = self.section, error = %e, "render failed after recovery");
                        }
                    }
                }
                self.state = BoundaryState::Failed {
                    message: self.fallback_message(),
                };
                None
            }
        }
    }

    fn try_recover(&mut self) -> bool {
        let Some(recover) = self.recovery.as_mut() else {
            return false;
        };
        let recovered = recover();
        info!(section = self.section, recovered, "recovery attempted");
        recovered
    }

    /// Back to healthy; the next `run` renders again.
    pub fn retry(&mut self) {
        if self.is_failed() {
            info!(section = self.section, "retrying section");
            self.state = BoundaryState::Healthy;
        }
    }

    fn fallback_message(&self) -> String {
        format!("Couldn't show the {}.", self.section)
    }
}

impl fmt::Debug for ErrorBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorBoundary")
            .field("section", &self.section)
            .field("state", &self.state)
            .field("recovery", &self.recovery.is_some())
            .finish()
    }
}

/// Resolve a view node, substituting a hidden placeholder when absent.
pub fn node_or_placeholder<T: Default>(node: Option<T>, name: &str) -> T {
    if let Some(node) = node {
        node
    } else {
        let e = CoreError::MissingViewNode {
            node: name.to_owned(),
        };
        warn!(error = %e, "using placeholder");
        T::default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn failure_is_contained_and_retryable() {
        let mut filter = ErrorBoundary::new("filter");
        let mut list = ErrorBoundary::new("list");

        assert_eq!(filter.run(|| Err::<(), _>(CoreError::render("filter", "boom"))), None);
        assert!(filter.is_failed());
        assert_eq!(list.run(|| Ok::<_, CoreError>(3)), Some(3));
        assert!(!list.is_failed());

        // Stays on the fallback until retried.
        assert_eq!(filter.run(|| Ok::<_, CoreError>(1)), None);
        filter.retry();
        assert_eq!(filter.run(|| Ok::<_, CoreError>(1)), Some(1));
    }

    #[test]
    fn fallback_message_names_the_section() {
        let mut list = ErrorBoundary::new("entry list");
        list.run(|| Err::<(), _>(CoreError::render("list", "bad row")));
        assert_eq!(
            list.state(),
            &BoundaryState::Failed {
                message: "Couldn't show the entry list.".into()
            }
        );
    }

    #[test]
    fn successful_recovery_renders_again() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let mut boundary = ErrorBoundary::new("list").with_recovery(|| true);
        let value = boundary.run(|| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(CoreError::render("list", "first"))
            } else {
                Ok("rendered")
            }
        });
        assert_eq!(value, Some("rendered"));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(!boundary.is_failed());
    }

    #[test]
    fn failed_recovery_falls_back() {
        let mut boundary = ErrorBoundary::new("list").with_recovery(|| false);
        assert_eq!(boundary.run(|| Err::<(), _>(CoreError::render("list", "x"))), None);
        assert!(boundary.is_failed());
    }

    #[test]
    fn missing_node_becomes_placeholder() {
        let area: (u16, u16) = node_or_placeholder(None, "detail");
        assert_eq!(area, (0, 0));
        assert_eq!(node_or_placeholder(Some(5u8), "x"), 5);
    }
}
