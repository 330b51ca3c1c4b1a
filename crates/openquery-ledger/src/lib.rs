//! OpenQuery Ledger - Escrow custody for question deposits and answer stakes
//!
//! The ledger is the sole authority over locked funds:
//! - Balance-keyed by question and answer id
//! - Callable only by the one linked marketplace component
//! - A balance is either present (untouched) or has been zeroed by exactly
//!   one payout call; no balance is ever paid out twice
//!
//! # Invariants
//!
//! 1. Privileged operations require the link-once authorized caller
//! 2. Balances are zeroed strictly before any external transfer is awaited,
//!    so a re-entrant settlement on the same pair observes an empty balance
//! 3. Fee arithmetic is floor-division basis points; the rounding residue
//!    accrues to the payee, never the fee receiver

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use openquery_types::{ActorId, Amount, AnswerId, MarketError, QuestionId, Result};

pub mod transfer;

pub use transfer::{InMemoryTransfer, ValueTransfer};

/// Payout breakdown of an accept settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptPayout {
    /// Deposit minus fee, paid to the responder
    pub paid: Amount,
    /// Platform fee
    pub fee: Amount,
    /// Stake returned to the responder
    pub stake_returned: Amount,
}

/// Payout breakdown of a reject settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectPayout {
    /// Deposit minus fee, refunded to the asker
    pub refund: Amount,
    /// Platform fee
    pub fee: Amount,
    /// The responder's forfeited stake, awarded to the asker
    pub stake_awarded: Amount,
}

/// Payout breakdown of a timeout settlement
///
/// The responder-side fields are zero when no answer was ever selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutPayout {
    /// Deposit minus fee, refunded to the asker
    pub asker_refund: Amount,
    /// Fee taken from the deposit
    pub asker_fee: Amount,
    /// Stake minus fee, refunded to the responder
    pub responder_refund: Amount,
    /// Fee taken from the stake
    pub responder_fee: Amount,
}

/// The OpenQuery escrow ledger
///
/// Holds per-question deposit balances and per-answer stake balances.
/// Never initiates action on its own; fund movement happens only when the
/// linked marketplace invokes a settlement primitive.
#[derive(Clone)]
pub struct EscrowLedger {
    /// Locked question deposits
    deposits: Arc<RwLock<HashMap<QuestionId, Amount>>>,
    /// Locked answer stakes
    stakes: Arc<RwLock<HashMap<AnswerId, Amount>>>,
    /// The one caller allowed to move funds, set once at link time
    authority: Arc<RwLock<Option<ActorId>>>,
    /// External value-transfer primitive
    transfers: Arc<dyn ValueTransfer>,
}

impl EscrowLedger {
    /// Create a new ledger over the given transfer primitive
    pub fn new(transfers: Arc<dyn ValueTransfer>) -> Self {
        Self {
            deposits: Arc::new(RwLock::new(HashMap::new())),
            stakes: Arc::new(RwLock::new(HashMap::new())),
            authority: Arc::new(RwLock::new(None)),
            transfers,
        }
    }

    /// Authorize the one marketplace allowed to call privileged operations.
    ///
    /// May be called exactly once; re-linking attempts are rejected.
    pub async fn link_market(&self, market: ActorId) -> Result<()> {
        let mut authority = self.authority.write().await;
        if authority.is_some() {
            return Err(MarketError::unauthorized(
                "ledger is already linked to a marketplace",
            ));
        }
        info!(market = %market, "ledger linked to marketplace");
        *authority = Some(market);
        Ok(())
    }

    async fn ensure_authorized(&self, caller: &ActorId) -> Result<()> {
        match self.authority.read().await.as_ref() {
            Some(market) if market == caller => Ok(()),
            Some(_) => Err(MarketError::unauthorized(
                "caller is not the linked marketplace",
            )),
            None => Err(MarketError::unauthorized(
                "ledger is not linked to a marketplace",
            )),
        }
    }

    /// Locked deposit balance for a question (zero once paid out)
    pub async fn deposit_balance(&self, question_id: &QuestionId) -> Amount {
        self.deposits
            .read()
            .await
            .get(question_id)
            .copied()
            .unwrap_or_default()
    }

    /// Locked stake balance for an answer (zero once paid out)
    pub async fn stake_balance(&self, answer_id: &AnswerId) -> Amount {
        self.stakes
            .read()
            .await
            .get(answer_id)
            .copied()
            .unwrap_or_default()
    }

    /// Lock a question deposit. Repeated calls accumulate; the marketplace
    /// calls this exactly once per question.
    pub async fn lock_deposit(
        &self,
        caller: &ActorId,
        question_id: &QuestionId,
        amount: Amount,
    ) -> Result<()> {
        self.ensure_authorized(caller).await?;
        if amount.is_zero() {
            return Err(MarketError::invalid_input(
                "amount",
                "deposit must be greater than zero",
            ));
        }

        let mut deposits = self.deposits.write().await;
        let current = deposits.get(question_id).copied().unwrap_or_default();
        deposits.insert(*question_id, current.checked_add(amount)?);
        info!(question_id = %question_id, amount = %amount, "deposit locked");
        Ok(())
    }

    /// Lock an answer stake. Symmetric to [`lock_deposit`](Self::lock_deposit).
    pub async fn lock_stake(
        &self,
        caller: &ActorId,
        answer_id: &AnswerId,
        amount: Amount,
    ) -> Result<()> {
        self.ensure_authorized(caller).await?;
        if amount.is_zero() {
            return Err(MarketError::invalid_input(
                "amount",
                "stake must be greater than zero",
            ));
        }

        let mut stakes = self.stakes.write().await;
        let current = stakes.get(answer_id).copied().unwrap_or_default();
        stakes.insert(*answer_id, current.checked_add(amount)?);
        info!(answer_id = %answer_id, amount = %amount, "stake locked");
        Ok(())
    }

    /// Settle by acceptance: deposit minus fee plus the full stake go to the
    /// responder; the fee goes to the fee receiver.
    ///
    /// Both balances are zeroed before any transfer is awaited. A second
    /// call on the same pair fails with `EmptyBalance`.
    pub async fn settle_accept(
        &self,
        caller: &ActorId,
        question_id: &QuestionId,
        answer_id: &AnswerId,
        responder: &ActorId,
        fee_receiver: &ActorId,
        fee_bps: u16,
    ) -> Result<AcceptPayout> {
        self.ensure_authorized(caller).await?;

        let (split, stake) = {
            let mut deposits = self.deposits.write().await;
            let mut stakes = self.stakes.write().await;

            let deposit = deposits
                .get(question_id)
                .copied()
                .ok_or_else(|| MarketError::empty_balance(question_id))?;
            // Arithmetic must fail before the balances are touched
            let split = deposit.split_fee(fee_bps)?;
            let stake = stakes.remove(answer_id).unwrap_or_default();
            deposits.remove(question_id);
            (split, stake)
        };

        self.pay(responder, split.remainder).await?;
        self.pay(fee_receiver, split.fee).await?;
        self.pay(responder, stake).await?;

        info!(
            question_id = %question_id,
            answer_id = %answer_id,
            paid = %split.remainder,
            fee = %split.fee,
            stake = %stake,
            "accept settlement paid out"
        );

        Ok(AcceptPayout {
            paid: split.remainder,
            fee: split.fee,
            stake_returned: stake,
        })
    }

    /// Settle by rejection: deposit minus fee plus the responder's entire
    /// forfeited stake go to the asker; the fee goes to the fee receiver.
    ///
    /// Requires both balances present; zeroes both before any transfer.
    pub async fn settle_reject(
        &self,
        caller: &ActorId,
        question_id: &QuestionId,
        answer_id: &AnswerId,
        asker: &ActorId,
        fee_receiver: &ActorId,
        fee_bps: u16,
    ) -> Result<RejectPayout> {
        self.ensure_authorized(caller).await?;

        let (split, stake) = {
            let mut deposits = self.deposits.write().await;
            let mut stakes = self.stakes.write().await;

            let deposit = deposits
                .get(question_id)
                .copied()
                .ok_or_else(|| MarketError::empty_balance(question_id))?;
            let stake = stakes
                .get(answer_id)
                .copied()
                .ok_or_else(|| MarketError::empty_balance(answer_id))?;
            let split = deposit.split_fee(fee_bps)?;
            deposits.remove(question_id);
            stakes.remove(answer_id);
            (split, stake)
        };

        self.pay(asker, split.remainder).await?;
        self.pay(asker, stake).await?;
        self.pay(fee_receiver, split.fee).await?;

        info!(
            question_id = %question_id,
            answer_id = %answer_id,
            refund = %split.remainder,
            fee = %split.fee,
            stake_awarded = %stake,
            "reject settlement paid out"
        );

        Ok(RejectPayout {
            refund: split.remainder,
            fee: split.fee,
            stake_awarded: stake,
        })
    }

    /// Settle by timeout: the asker is always refunded minus the fee; if an
    /// answer was selected and its stake is still locked, the responder is
    /// refunded symmetrically at the same fee rate.
    ///
    /// This is the only payout path that tolerates a missing responder.
    pub async fn settle_timeout(
        &self,
        caller: &ActorId,
        question_id: &QuestionId,
        selection: Option<(&AnswerId, &ActorId)>,
        asker: &ActorId,
        fee_receiver: &ActorId,
        fee_bps: u16,
    ) -> Result<TimeoutPayout> {
        self.ensure_authorized(caller).await?;

        let (asker_split, responder_side) = {
            let mut deposits = self.deposits.write().await;
            let mut stakes = self.stakes.write().await;

            let deposit = deposits
                .get(question_id)
                .copied()
                .ok_or_else(|| MarketError::empty_balance(question_id))?;
            let asker_split = deposit.split_fee(fee_bps)?;

            let responder_side = match selection {
                Some((answer_id, responder)) => match stakes.get(answer_id).copied() {
                    Some(stake) => {
                        let stake_split = stake.split_fee(fee_bps)?;
                        stakes.remove(answer_id);
                        Some((stake_split, responder.clone()))
                    }
                    None => None,
                },
                None => None,
            };
            deposits.remove(question_id);
            (asker_split, responder_side)
        };

        self.pay(asker, asker_split.remainder).await?;
        self.pay(fee_receiver, asker_split.fee).await?;

        let (responder_refund, responder_fee) = match responder_side {
            Some((stake_split, responder)) => {
                self.pay(&responder, stake_split.remainder).await?;
                self.pay(fee_receiver, stake_split.fee).await?;
                (stake_split.remainder, stake_split.fee)
            }
            None => (Amount::zero(), Amount::zero()),
        };

        info!(
            question_id = %question_id,
            asker_refund = %asker_split.remainder,
            asker_fee = %asker_split.fee,
            responder_refund = %responder_refund,
            responder_fee = %responder_fee,
            "timeout settlement paid out"
        );

        Ok(TimeoutPayout {
            asker_refund: asker_split.remainder,
            asker_fee: asker_split.fee,
            responder_refund,
            responder_fee,
        })
    }

    /// Execute one external transfer, skipping zero amounts
    async fn pay(&self, to: &ActorId, amount: Amount) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        self.transfers.transfer(to, amount).await.map_err(|err| {
            warn!(to = %to, amount = %amount, error = %err, "external transfer failed");
            err
        })
    }
}
