use vcp_types::{Amount, ChannelId};

use crate::channel::Channel;
use crate::error::ChannelError;

/// Result of re-deriving a channel's state from its payment history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub channel_id: ChannelId,
    pub payment_count: u64,
    pub sequence_dense: bool,
    pub payments_attributed: bool,
    pub balance_consistent: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific integrity violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub seq: u64,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    SequenceGap,
    ForeignPayment,
    Overdraft,
    BalanceMismatch,
}

/// Channel history validator.
pub struct HistoryValidator;

impl HistoryValidator {
    /// Replay the payment history from `initial_funding` and compare.
    pub fn validate(channel: &Channel) -> ValidationReport {
        let mut violations = Vec::new();
        let mut sequence_dense = true;
        let mut payments_attributed = true;
        let mut balance_consistent = true;
        let mut running: Amount = channel.initial_funding;

        for (index, payment) in channel.payment_history.iter().enumerate() {
            let expected_seq = (index + 1) as u64;
            if payment.seq != expected_seq {
                sequence_dense = false;
                violations.push(Violation {
                    seq: payment.seq,
                    kind: ViolationKind::SequenceGap,
                    description: format!("expected seq {expected_seq}, got {}", payment.seq),
                });
            }

            if payment.channel_id != channel.id {
                payments_attributed = false;
                violations.push(Violation {
                    seq: payment.seq,
                    kind: ViolationKind::ForeignPayment,
                    description: format!("payment belongs to channel {}", payment.channel_id),
                });
            }

            match running.checked_sub(payment.amount) {
                Some(next) => running = next,
                None => {
                    balance_consistent = false;
                    violations.push(Violation {
                        seq: payment.seq,
                        kind: ViolationKind::Overdraft,
                        description: format!(
                            "payment of {} exceeds running balance {running}",
                            payment.amount
                        ),
                    });
                    running = 0;
                }
            }
        }

        if balance_consistent && running != channel.current_balance {
            balance_consistent = false;
            violations.push(Violation {
                seq: channel.payment_history.len() as u64,
                kind: ViolationKind::BalanceMismatch,
                description: format!(
                    "replayed balance {running}, recorded {}",
                    channel.current_balance
                ),
            });
        }

        ValidationReport {
            channel_id: channel.id,
            payment_count: channel.payment_history.len() as u64,
            sequence_dense,
            payments_attributed,
            balance_consistent,
            violations,
        }
    }
}

impl Channel {
    /// Validate the history, surfacing the first violation as an error.
    pub fn verify_history(&self) -> Result<(), ChannelError> {
        match HistoryValidator::validate(self).violations.into_iter().next() {
            None => Ok(()),
            Some(v) => Err(ChannelError::IntegrityViolation {
                seq: v.seq,
                reason: v.description,
            }),
        }
    }
}
