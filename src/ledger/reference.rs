use chrono::{Datelike, Timelike};
use hourglass_rs::SafeTimeProvider;

use crate::config::PostingConfig;
use crate::errors::{LendingError, Result};
use crate::ledger::repository::LedgerRepository;

/// sequential references: `JN` + yy + mm + 4-digit sequence
const SEQUENTIAL_PREFIX: &str = "JN";
/// degraded-mode references: `JNX` + yy + mm + 5-digit timestamp suffix.
/// The marker keeps them out of the sequential scope and visibly distinct.
const DEGRADED_PREFIX: &str = "JNX";

const MAX_SEQUENCE: u32 = 9999;

/// decoded pieces of a loan reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceParts {
    pub year: u32,
    pub month: u32,
    pub sequence: u32,
    pub degraded: bool,
}

/// validate a reference and break it into its parts
pub fn parse_reference(reference: &str) -> Result<ReferenceParts> {
    let malformed = || LendingError::MalformedReference { reference: reference.to_string() };

    let (body, degraded, sequence_width) =
        if let Some(body) = reference.strip_prefix(DEGRADED_PREFIX) {
            (body, true, 5)
        } else if let Some(body) = reference.strip_prefix(SEQUENTIAL_PREFIX) {
            (body, false, 4)
        } else {
            return Err(malformed());
        };

    if body.len() != 4 + sequence_width || !body.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    let year: u32 = body[..2].parse().map_err(|_| malformed())?;
    let month: u32 = body[2..4].parse().map_err(|_| malformed())?;
    let sequence: u32 = body[4..].parse().map_err(|_| malformed())?;

    if !(1..=12).contains(&month) {
        return Err(malformed());
    }

    Ok(ReferenceParts { year, month, sequence, degraded })
}

/// produces collision-free month-scoped loan references
pub struct ReferenceGenerator<'a, R: LedgerRepository> {
    repository: &'a R,
    time: &'a SafeTimeProvider,
    max_retries: u32,
}

impl<'a, R: LedgerRepository> ReferenceGenerator<'a, R> {
    pub fn new(repository: &'a R, config: &PostingConfig, time: &'a SafeTimeProvider) -> Self {
        Self {
            repository,
            time,
            max_retries: config.reference_max_retries.max(1),
        }
    }

    /// prefix for the current year-month, e.g. `JN2601`
    pub fn current_prefix(&self) -> String {
        let now = self.time.now();
        format!("{SEQUENTIAL_PREFIX}{:02}{:02}", now.year() % 100, now.month())
    }

    /// propose the next reference in the current month's sequence
    ///
    /// Falls back to a degraded timestamp reference when the store cannot be
    /// queried; the caller still has to claim the proposal before using it.
    pub fn generate(&self) -> Result<String> {
        let prefix = self.current_prefix();
        match self.repository.highest_reference_for_prefix(&prefix) {
            Ok(highest) => next_in_sequence(&prefix, highest.as_deref()),
            Err(error) => {
                tracing::warn!(%error, "reference lookup failed, issuing degraded reference");
                Ok(self.degraded_reference())
            }
        }
    }

    /// propose and claim a reference, retrying past collisions
    ///
    /// Concurrent generators racing on the same sequence each settle on
    /// their own value; after `reference_max_retries` collisions the last
    /// collision surfaces as a transient failure.
    pub fn generate_unique(&self) -> Result<String> {
        let prefix = self.current_prefix();
        let highest = match self.repository.highest_reference_for_prefix(&prefix) {
            Ok(highest) => highest,
            Err(error) => {
                tracing::warn!(%error, "reference lookup failed, issuing degraded reference");
                return Ok(self.degraded_reference());
            }
        };

        let mut candidate = next_in_sequence(&prefix, highest.as_deref())?;
        let mut last_collision = None;

        for _ in 0..self.max_retries {
            match self.repository.claim_reference(&candidate) {
                Ok(()) => return Ok(candidate),
                Err(LendingError::ReferenceCollision { reference }) => {
                    candidate = next_in_sequence(&prefix, Some(reference.as_str()))?;
                    last_collision = Some(LendingError::ReferenceCollision { reference });
                }
                Err(other) => return Err(other),
            }
        }

        Err(last_collision.unwrap_or(LendingError::ReferenceExhausted { prefix }))
    }

    /// timestamp-derived reference for when persistence is unreachable
    pub fn degraded_reference(&self) -> String {
        let now = self.time.now();
        format!(
            "{DEGRADED_PREFIX}{:02}{:02}{:05}",
            now.year() % 100,
            now.month(),
            now.num_seconds_from_midnight()
        )
    }
}

fn next_in_sequence(prefix: &str, highest: Option<&str>) -> Result<String> {
    let sequence = match highest {
        None => 0,
        Some(reference) => {
            let tail = reference
                .strip_prefix(prefix)
                .ok_or_else(|| LendingError::MalformedReference {
                    reference: reference.to_string(),
                })?;
            if tail.len() != 4 || !tail.bytes().all(|b| b.is_ascii_digit()) {
                return Err(LendingError::MalformedReference {
                    reference: reference.to_string(),
                });
            }
            tail.parse::<u32>().map_err(|_| LendingError::MalformedReference {
                reference: reference.to_string(),
            })?
        }
    };

    if sequence >= MAX_SEQUENCE {
        return Err(LendingError::ReferenceExhausted { prefix: prefix.to_string() });
    }

    Ok(format!("{prefix}{:04}", sequence + 1))
}
