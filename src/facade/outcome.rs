use crate::core::RemoteError;
use crate::model::{EntityKind, Mechanic};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// User-facing feedback for a mutation or a reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    fn verb(self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        }
    }

    fn past(self) -> &'static str {
        match self {
            MutationKind::Create => "created",
            MutationKind::Update => "updated",
            MutationKind::Delete => "deleted",
        }
    }
}

/// Result of an optimistic mutation.
///
/// `LocalOnly` means the backend could not be reached and the change exists
/// only in the cache and the Local Store. `Rejected` means the backend refused
/// the change and nothing was recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<T> {
    Synced(T),
    LocalOnly { record: T, reason: RemoteError },
    Rejected(RemoteError),
}

impl<T> MutationOutcome<T> {
    pub fn is_synced(&self) -> bool {
        matches!(self, MutationOutcome::Synced(_))
    }

    pub fn is_local_only(&self) -> bool {
        matches!(self, MutationOutcome::LocalOnly { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, MutationOutcome::Rejected(_))
    }

    pub fn record(&self) -> Option<&T> {
        match self {
            MutationOutcome::Synced(record) | MutationOutcome::LocalOnly { record, .. } => {
                Some(record)
            }
            MutationOutcome::Rejected(_) => None,
        }
    }

    pub fn into_record(self) -> Option<T> {
        match self {
            MutationOutcome::Synced(record) | MutationOutcome::LocalOnly { record, .. } => {
                Some(record)
            }
            MutationOutcome::Rejected(_) => None,
        }
    }

    pub fn error(&self) -> Option<&RemoteError> {
        match self {
            MutationOutcome::Synced(_) => None,
            MutationOutcome::LocalOnly { reason, .. } | MutationOutcome::Rejected(reason) => {
                Some(reason)
            }
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> MutationOutcome<U> {
        match self {
            MutationOutcome::Synced(record) => MutationOutcome::Synced(f(record)),
            MutationOutcome::LocalOnly { record, reason } => MutationOutcome::LocalOnly {
                record: f(record),
                reason,
            },
            MutationOutcome::Rejected(reason) => MutationOutcome::Rejected(reason),
        }
    }

    pub fn notice(&self, kind: EntityKind, op: MutationKind) -> Notice {
        let label = kind.label();
        match self {
            MutationOutcome::Synced(_) => Notice::success(format!("{} {}.", label, op.past())),
            MutationOutcome::LocalOnly { .. } => {
                Notice::info(format!("{} {} locally (offline mode).", label, op.past()))
            }
            MutationOutcome::Rejected(reason) => Notice::error(format!(
                "Could not {} {}: {}",
                op.verb(),
                label.to_lowercase(),
                reason.message()
            )),
        }
    }
}

/// Where a collection's published state came from after a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionStatus {
    /// Canonical list from the backend.
    Fresh { count: usize },
    /// Reloaded from the Local Store.
    LocalFallback { count: usize },
    /// Fetch failed; the previous cache state was kept.
    Stale { reason: RemoteError },
}

impl CollectionStatus {
    pub fn is_fresh(&self) -> bool {
        matches!(self, CollectionStatus::Fresh { .. })
    }
}

/// Summary of one reconciliation cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshReport {
    pub service_requests: CollectionStatus,
    pub mechanics: CollectionStatus,
    pub invoices: CollectionStatus,
    pub vehicles: CollectionStatus,
    /// Canonical records created from unsynced mechanics this cycle.
    pub uploaded_mechanics: Vec<Mechanic>,
    /// Unsynced mechanics still waiting for a later cycle.
    pub pending_mechanics: usize,
    /// Every fetch failed and local data is being displayed.
    pub offline: bool,
}

impl RefreshReport {
    /// Report for a cycle that could not run at all; every collection keeps
    /// its cached state.
    pub(crate) fn failed(reason: RemoteError) -> Self {
        let stale = CollectionStatus::Stale { reason };
        Self {
            service_requests: stale.clone(),
            mechanics: stale.clone(),
            invoices: stale.clone(),
            vehicles: stale,
            uploaded_mechanics: Vec::new(),
            pending_mechanics: 0,
            offline: false,
        }
    }

    pub fn status(&self, kind: EntityKind) -> &CollectionStatus {
        match kind {
            EntityKind::ServiceRequests => &self.service_requests,
            EntityKind::Mechanics => &self.mechanics,
            EntityKind::Invoices => &self.invoices,
            EntityKind::Vehicles => &self.vehicles,
        }
    }

    pub fn is_complete(&self) -> bool {
        EntityKind::ALL
            .iter()
            .all(|kind| self.status(*kind).is_fresh())
            && self.pending_mechanics == 0
    }

    pub fn notices(&self) -> Vec<Notice> {
        let mut notices: Vec<Notice> = self
            .uploaded_mechanics
            .iter()
            .map(|mechanic| Notice::success(format!("Mechanic {} synced to backend!", mechanic.name)))
            .collect();
        if self.offline {
            notices.push(Notice::warning(
                "Could not connect to the server. Displaying local data.",
            ));
        }
        notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices_distinguish_outcomes() {
        let synced = MutationOutcome::Synced(1);
        let local = MutationOutcome::LocalOnly {
            record: 1,
            reason: RemoteError::unreachable("down"),
        };
        let rejected: MutationOutcome<i32> =
            MutationOutcome::Rejected(RemoteError::rejected(400, "email is required"));

        let kind = EntityKind::Mechanics;
        assert_eq!(synced.notice(kind, MutationKind::Create).level, NoticeLevel::Success);
        assert_eq!(local.notice(kind, MutationKind::Create).level, NoticeLevel::Info);
        let notice = rejected.notice(kind, MutationKind::Create);
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "Could not create mechanic: email is required");
    }

    #[test]
    fn test_map_preserves_variant() {
        let local = MutationOutcome::LocalOnly {
            record: 2,
            reason: RemoteError::unreachable("down"),
        };
        let mapped = local.map(|n| n * 10);
        assert!(mapped.is_local_only());
        assert_eq!(mapped.record(), Some(&20));
        assert!(mapped.error().is_some());
    }
}
