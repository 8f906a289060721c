//! Pending vs. effective icon theme selection.
//!
//! The dialog edits a [`SelectionSession`]; nothing reaches the rest of the
//! desktop until [`SelectionSession::commit`] finds the pending values differ
//! from the baseline taken when the dialog opened.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::settings::IconThemeSettings;

/// Receiver of committed icon theme changes.
///
/// Implemented by the settings store; on a real commit `store`,
/// `request_persist` and `notify_theme_changed` are each called once, in that
/// order.
pub trait ConfigBus {
    /// Make `settings` the effective configuration.
    fn store(&self, settings: &IconThemeSettings);

    /// Queue a save of the effective configuration.
    fn request_persist(&self) -> Result<()>;

    /// Tell interested parties the icon theme changed.
    fn notify_theme_changed(&self, theme_id: Option<&str>);
}

/// Outcome of [`SelectionSession::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitResult {
    /// Nothing differed from the baseline; no side effects.
    Unchanged,
    /// Pending values were written and announced.
    Applied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSession {
    baseline: IconThemeSettings,
    pending: IconThemeSettings,
}

impl SelectionSession {
    /// Start a session whose pending values equal the effective ones.
    pub fn new(baseline: IconThemeSettings) -> Self {
        Self {
            pending: baseline.clone(),
            baseline,
        }
    }

    pub fn baseline(&self) -> &IconThemeSettings {
        &self.baseline
    }

    pub fn pending_theme(&self) -> Option<&str> {
        self.pending.icon_theme.as_deref()
    }

    pub fn pending_overrides(&self) -> bool {
        self.pending.overrides
    }

    /// Replace the baseline, keeping the pending values.
    pub(crate) fn rebase(&mut self, baseline: IconThemeSettings) {
        self.baseline = baseline;
    }

    pub fn set_pending_theme(&mut self, theme_id: Option<String>) {
        self.pending.icon_theme = theme_id;
    }

    pub fn set_pending_override(&mut self, overrides: bool) {
        self.pending.overrides = overrides;
    }

    /// Whether committing would change anything. Two unset themes are equal.
    pub fn is_dirty(&self) -> bool {
        self.pending.overrides != self.baseline.overrides
            || self.pending.icon_theme != self.baseline.icon_theme
    }

    /// Write the pending selection through `bus` if it differs from the
    /// baseline.
    ///
    /// A failed save is returned after the change has been stored and
    /// announced; the baseline still moves to the committed values.
    pub fn commit(&mut self, bus: &dyn ConfigBus) -> Result<CommitResult> {
        if !self.is_dirty() {
            debug!("Icon theme selection unchanged, nothing to commit");
            return Ok(CommitResult::Unchanged);
        }

        info!(
            theme = self.pending.icon_theme.as_deref().unwrap_or("<unset>"),
            overrides = self.pending.overrides,
            "Committing icon theme selection"
        );

        bus.store(&self.pending);
        let persisted = bus.request_persist();
        if let Err(ref e) = persisted {
            warn!("Failed to save icon theme selection: {}", e);
        }
        bus.notify_theme_changed(self.pending.icon_theme.as_deref());

        self.baseline = self.pending.clone();
        persisted.map(|()| CommitResult::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeBus {
        calls: RefCell<Vec<String>>,
        fail_persist: bool,
    }

    impl ConfigBus for FakeBus {
        fn store(&self, settings: &IconThemeSettings) {
            self.calls.borrow_mut().push(format!(
                "store {:?} {}",
                settings.icon_theme, settings.overrides
            ));
        }

        fn request_persist(&self) -> Result<()> {
            self.calls.borrow_mut().push("persist".to_string());
            if self.fail_persist {
                Err(Error::Io(std::io::Error::other("disk full")))
            } else {
                Ok(())
            }
        }

        fn notify_theme_changed(&self, theme_id: Option<&str>) {
            self.calls.borrow_mut().push(format!("notify {:?}", theme_id));
        }
    }

    fn settings(theme: Option<&str>, overrides: bool) -> IconThemeSettings {
        IconThemeSettings {
            icon_theme: theme.map(str::to_string),
            overrides,
        }
    }

    #[test]
    fn test_new_session_is_clean() {
        let session = SelectionSession::new(settings(Some("breeze"), false));
        assert!(!session.is_dirty());
        assert_eq!(session.pending_theme(), Some("breeze"));
    }

    #[test]
    fn test_commit_both_unset_is_noop() {
        let bus = FakeBus::default();
        let mut session = SelectionSession::new(settings(None, false));

        assert_eq!(session.commit(&bus).unwrap(), CommitResult::Unchanged);
        assert!(bus.calls.borrow().is_empty());
    }

    #[test]
    fn test_commit_same_theme_reselected_is_noop() {
        let bus = FakeBus::default();
        let mut session = SelectionSession::new(settings(Some("breeze"), true));
        session.set_pending_theme(Some("adwaita".to_string()));
        session.set_pending_theme(Some("breeze".to_string()));

        assert!(!session.is_dirty());
        assert_eq!(session.commit(&bus).unwrap(), CommitResult::Unchanged);
        assert!(bus.calls.borrow().is_empty());
    }

    #[test]
    fn test_override_change_alone_commits() {
        let bus = FakeBus::default();
        let mut session = SelectionSession::new(settings(Some("breeze"), false));
        session.set_pending_override(true);

        assert!(session.is_dirty());
        assert_eq!(session.commit(&bus).unwrap(), CommitResult::Applied);
        assert_eq!(
            *bus.calls.borrow(),
            vec![
                "store Some(\"breeze\") true".to_string(),
                "persist".to_string(),
                "notify Some(\"breeze\")".to_string(),
            ]
        );
    }

    #[test]
    fn test_unset_vs_set_theme_is_dirty() {
        let mut session = SelectionSession::new(settings(None, false));
        session.set_pending_theme(Some("breeze".to_string()));
        assert!(session.is_dirty());

        let mut session = SelectionSession::new(settings(Some("breeze"), false));
        session.set_pending_theme(None);
        assert!(session.is_dirty());
    }

    #[test]
    fn test_commit_moves_baseline() {
        let bus = FakeBus::default();
        let mut session = SelectionSession::new(settings(None, false));
        session.set_pending_theme(Some("papirus".to_string()));

        assert_eq!(session.commit(&bus).unwrap(), CommitResult::Applied);
        assert_eq!(session.baseline(), &settings(Some("papirus"), false));
        assert!(!session.is_dirty());

        assert_eq!(session.commit(&bus).unwrap(), CommitResult::Unchanged);
        assert_eq!(bus.calls.borrow().len(), 3);
    }

    #[test]
    fn test_persist_failure_still_notifies() {
        let bus = FakeBus {
            fail_persist: true,
            ..FakeBus::default()
        };
        let mut session = SelectionSession::new(settings(None, false));
        session.set_pending_theme(Some("papirus".to_string()));

        assert!(session.commit(&bus).is_err());
        assert_eq!(bus.calls.borrow().last().unwrap(), "notify Some(\"papirus\")");
        assert!(!session.is_dirty());
    }
}
