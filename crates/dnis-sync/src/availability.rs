//! Number availability check
//!
//! Before a multi-request upload, every number about to be added is looked
//! up in the DID pools: it must exist and must not be assigned elsewhere.
//! A number that fails the check is looked up again after a pause, up to
//! the configured attempt count.

use crate::config::ValidationConfig;
use crate::error::{SyncError, Unavailable};
use dnis_core::{Dnis, GatewayFailure, NumberDirectory};

enum Verdict {
    Unavailable(Unavailable),
    LookupFailed(GatewayFailure),
}

/// Check every number in `numbers`, stopping at the first bad one
pub(crate) async fn ensure_available(
    directory: &dyn NumberDirectory,
    numbers: &[Dnis],
    policy: &ValidationConfig,
) -> Result<(), SyncError> {
    let max_attempts = policy.max_attempts.max(1);

    for number in numbers {
        for attempt in 1..=max_attempts {
            let verdict = match check_number(directory, number).await {
                Ok(()) => break,
                Err(verdict) => verdict,
            };

            if attempt == max_attempts {
                return Err(match verdict {
                    Verdict::Unavailable(reason) => SyncError::NumberUnavailable {
                        number: number.clone(),
                        reason,
                    },
                    Verdict::LookupFailed(source) => SyncError::LookupFailed {
                        number: number.clone(),
                        attempts: max_attempts,
                        source,
                    },
                });
            }

            tracing::debug!(%number, attempt, "number check failed, retrying");
            tokio::time::sleep(policy.retry_delay()).await;
        }
    }

    tracing::debug!(count = numbers.len(), "all numbers available");
    Ok(())
}

async fn check_number(directory: &dyn NumberDirectory, number: &Dnis) -> Result<(), Verdict> {
    let entries = directory
        .lookup(number)
        .await
        .map_err(Verdict::LookupFailed)?;

    match entries.into_iter().find(|entry| &entry.number == number) {
        Some(entry) if entry.assigned => Err(Verdict::Unavailable(Unavailable::Assigned {
            owner_type: entry.owner_type,
        })),
        Some(_) => Ok(()),
        None => Err(Verdict::Unavailable(Unavailable::NotFound)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnis_core::{DidNumber, InMemoryDirectory};

    fn instant_policy(max_attempts: u32) -> ValidationConfig {
        ValidationConfig {
            max_attempts,
            retry_delay_ms: 0,
        }
    }

    #[tokio::test]
    async fn unassigned_numbers_pass() {
        let numbers = vec![Dnis::from("+1"), Dnis::from("+2")];
        let directory = InMemoryDirectory::new().with_unassigned(numbers.clone());

        ensure_available(&directory, &numbers, &instant_policy(3))
            .await
            .unwrap();
        assert_eq!(directory.lookups(), 2);
    }

    #[tokio::test]
    async fn assigned_number_fails_after_all_attempts() {
        let directory =
            InMemoryDirectory::new().with_number(DidNumber::assigned("+1", "EDGE_PHONE"));

        let err = ensure_available(&directory, &[Dnis::from("+1")], &instant_policy(3))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::NumberUnavailable {
                reason: Unavailable::Assigned { .. },
                ..
            }
        ));
        assert_eq!(directory.lookups(), 3);
    }

    #[tokio::test]
    async fn missing_number_is_not_found() {
        let err = ensure_available(&InMemoryDirectory::new(), &[Dnis::from("+9")], &instant_policy(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::NumberUnavailable {
                reason: Unavailable::NotFound,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn transient_lookup_failure_is_retried() {
        let directory = InMemoryDirectory::new()
            .with_unassigned([Dnis::from("+1")])
            .failing_first(2);

        ensure_available(&directory, &[Dnis::from("+1")], &instant_policy(3))
            .await
            .unwrap();
        assert_eq!(directory.lookups(), 3);
    }

    #[tokio::test]
    async fn persistent_lookup_failure_reports_attempts() {
        let directory = InMemoryDirectory::new().failing_first(5);

        let err = ensure_available(&directory, &[Dnis::from("+1")], &instant_policy(2))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::LookupFailed { attempts: 2, .. }));
    }
}
