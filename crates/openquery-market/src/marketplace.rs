//! The marketplace component
//!
//! Owns question and answer records, enforces the lifecycle state machine,
//! computes dynamic collateral from reputation, and invokes the ledger's
//! payout primitives on state transitions. The ledger never initiates
//! action on its own.
//!
//! # Concurrency
//!
//! One mutex guard per question, held across every state-changing operation
//! on that question and its answers. Two operations on the same question
//! never interleave; operations on different questions run in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::info;

use openquery_ledger::{AcceptPayout, EscrowLedger, RejectPayout, TimeoutPayout};
use openquery_types::{
    ActorId, Amount, Answer, AnswerId, MarketConfig, MarketError, Question, QuestionId,
    QuestionState, Result, StakeTier, UserStats,
};

use crate::clock::{Clock, SystemClock};

/// The OpenQuery marketplace
pub struct Marketplace {
    /// This component's identity, used as the ledger's authorized caller
    identity: ActorId,
    /// Administrator allowed to change configuration
    owner: ActorId,
    /// Recipient of platform fees
    fee_receiver: ActorId,
    /// The escrow ledger this marketplace is linked to
    ledger: EscrowLedger,
    /// Owner-settable configuration; applies to future operations only
    config: RwLock<MarketConfig>,
    /// Question records
    questions: RwLock<HashMap<QuestionId, Question>>,
    /// Answer records
    answers: RwLock<HashMap<AnswerId, Answer>>,
    /// Answers per question, in submission order
    answers_by_question: RwLock<HashMap<QuestionId, Vec<AnswerId>>>,
    /// Per-responder settlement statistics
    stats: RwLock<HashMap<ActorId, UserStats>>,
    /// Serialization guard per question
    question_guards: Mutex<HashMap<QuestionId, Arc<Mutex<()>>>>,
    /// Time source for deadlines
    clock: Arc<dyn Clock>,
}

impl Marketplace {
    /// Create a marketplace and link it as the ledger's authorized caller.
    ///
    /// Fails if the config is invalid or the ledger is already linked.
    pub async fn connect(
        owner: ActorId,
        fee_receiver: ActorId,
        ledger: EscrowLedger,
        config: MarketConfig,
    ) -> Result<Self> {
        Self::connect_with_clock(owner, fee_receiver, ledger, config, Arc::new(SystemClock)).await
    }

    /// [`connect`](Self::connect) with an explicit time source
    pub async fn connect_with_clock(
        owner: ActorId,
        fee_receiver: ActorId,
        ledger: EscrowLedger,
        config: MarketConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let identity = ActorId::new();
        ledger.link_market(identity.clone()).await?;

        Ok(Self {
            identity,
            owner,
            fee_receiver,
            ledger,
            config: RwLock::new(config),
            questions: RwLock::new(HashMap::new()),
            answers: RwLock::new(HashMap::new()),
            answers_by_question: RwLock::new(HashMap::new()),
            stats: RwLock::new(HashMap::new()),
            question_guards: Mutex::new(HashMap::new()),
            clock,
        })
    }

    /// The identity this marketplace uses as the ledger's caller
    pub fn identity(&self) -> &ActorId {
        &self.identity
    }

    /// Current configuration snapshot
    pub async fn config(&self) -> MarketConfig {
        self.config.read().await.clone()
    }

    /// Replace the configuration. Owner only; applies to future operations,
    /// never retroactively (existing deadlines keep their window).
    pub async fn update_config(&self, caller: &ActorId, config: MarketConfig) -> Result<()> {
        if caller != &self.owner {
            return Err(MarketError::unauthorized(
                "only the marketplace owner may change configuration",
            ));
        }
        config.validate()?;
        info!("marketplace configuration updated");
        *self.config.write().await = config;
        Ok(())
    }

    /// Post a question, locking its deposit in escrow
    pub async fn add_question(
        &self,
        caller: &ActorId,
        text: &str,
        deposit: Amount,
    ) -> Result<Question> {
        if text.trim().is_empty() {
            return Err(MarketError::invalid_input("text", "question text is empty"));
        }
        let min_deposit = self.config.read().await.min_deposit;
        if deposit < min_deposit {
            return Err(MarketError::invalid_input(
                "deposit",
                format!("deposit {} is below the minimum {}", deposit, min_deposit),
            ));
        }

        let now = self.clock.now();
        let id = QuestionId::derive(caller, text, now);
        if self.questions.read().await.contains_key(&id) {
            return Err(MarketError::invalid_input(
                "text",
                "identical question already posted by this asker",
            ));
        }

        self.ledger.lock_deposit(&self.identity, &id, deposit).await?;

        let question = Question {
            id,
            text: text.to_string(),
            asker: caller.clone(),
            deposit,
            state: QuestionState::Open,
            selected_answer: None,
            deadline: None,
            created_at: now,
        };
        self.questions.write().await.insert(id, question.clone());
        info!(question_id = %id, asker = %caller, deposit = %deposit, "question posted");
        Ok(question)
    }

    /// Submit an answer, locking the responder's stake in escrow.
    ///
    /// Accepted while the question is `Open` or `Selected`; late answers can
    /// compete until resolution.
    pub async fn submit_answer(
        &self,
        caller: &ActorId,
        question_id: &QuestionId,
        text: &str,
        stake: Amount,
    ) -> Result<Answer> {
        let guard = self.question_guard(question_id).await;
        let _serialized = guard.lock().await;

        let question = self.get_question(question_id).await?;
        if !question.state.accepts_answers() {
            return Err(MarketError::invalid_state(format!(
                "question {} no longer accepts answers",
                question_id
            )));
        }
        if text.trim().is_empty() {
            return Err(MarketError::invalid_input("text", "answer text is empty"));
        }

        // Collateral requirement is evaluated at submission time only
        let required = self.required_stake(caller).await;
        if stake < required {
            return Err(MarketError::invalid_input(
                "stake",
                format!("stake {} is below the required {}", stake, required),
            ));
        }

        let now = self.clock.now();
        let sequence = self
            .answers_by_question
            .read()
            .await
            .get(question_id)
            .map(|ids| ids.len() as u64)
            .unwrap_or(0);
        let id = AnswerId::derive(question_id, caller, text, now, sequence);

        self.ledger.lock_stake(&self.identity, &id, stake).await?;

        let answer = Answer {
            id,
            question_id: *question_id,
            text: text.to_string(),
            responder: caller.clone(),
            stake,
            created_at: now,
        };
        self.answers.write().await.insert(id, answer.clone());
        self.answers_by_question
            .write()
            .await
            .entry(*question_id)
            .or_default()
            .push(id);
        info!(question_id = %question_id, answer_id = %id, responder = %caller, stake = %stake, "answer submitted");
        Ok(answer)
    }

    /// The collateral a responder must lock right now, from their current
    /// reputation band and the configured base stake
    pub async fn required_stake(&self, responder: &ActorId) -> Amount {
        let reputation = self
            .stats
            .read()
            .await
            .get(responder)
            .map(|s| s.reputation)
            .unwrap_or(0);
        let base = self.config.read().await.base_stake;
        StakeTier::from_reputation(reputation).required_stake(base)
    }

    /// Designate an answer as selected, fixing the settlement deadline.
    ///
    /// Owner only. Re-selecting before resolution overwrites the previous
    /// selection and deadline; this is a deliberate escape hatch.
    pub async fn select_answer(
        &self,
        caller: &ActorId,
        question_id: &QuestionId,
        answer_id: &AnswerId,
    ) -> Result<Question> {
        let guard = self.question_guard(question_id).await;
        let _serialized = guard.lock().await;

        let question = self.get_question(question_id).await?;
        if &question.asker != caller {
            return Err(MarketError::unauthorized(
                "only the question owner may select an answer",
            ));
        }
        if question.state.is_terminal() {
            return Err(MarketError::invalid_state(format!(
                "question {} is already settled",
                question_id
            )));
        }

        let answer = self.get_answer(answer_id).await?;
        if &answer.question_id != question_id {
            return Err(MarketError::invalid_input(
                "answer_id",
                "answer does not belong to this question",
            ));
        }

        let deadline = self.clock.now() + self.config.read().await.settlement_window();
        let updated = {
            let mut questions = self.questions.write().await;
            let record = questions
                .get_mut(question_id)
                .ok_or_else(|| MarketError::QuestionNotFound {
                    question_id: question_id.to_string(),
                })?;
            record.state = QuestionState::Selected;
            record.selected_answer = Some(*answer_id);
            record.deadline = Some(deadline);
            record.clone()
        };
        info!(question_id = %question_id, answer_id = %answer_id, deadline = %deadline, "answer selected");
        Ok(updated)
    }

    /// Accept the selected answer: pays the responder the deposit minus the
    /// fee plus their stake back, moves the question to `Resolved`, and
    /// credits the responder's reputation.
    pub async fn accept_selected_answer(
        &self,
        caller: &ActorId,
        question_id: &QuestionId,
    ) -> Result<AcceptPayout> {
        let guard = self.question_guard(question_id).await;
        let _serialized = guard.lock().await;

        let (answer_id, responder) = self
            .resolvable_selection(caller, question_id, "accept")
            .await?;
        let fee_bps = self.config.read().await.fee_accept_bps;

        let payout = self
            .ledger
            .settle_accept(
                &self.identity,
                question_id,
                &answer_id,
                &responder,
                &self.fee_receiver,
                fee_bps,
            )
            .await?;

        self.finish_question(question_id, QuestionState::Resolved)
            .await?;
        self.stats
            .write()
            .await
            .entry(responder.clone())
            .or_insert_with(|| UserStats::new(responder.clone()))
            .record_accept();
        info!(question_id = %question_id, responder = %responder, "answer accepted");
        Ok(payout)
    }

    /// Reject the selected answer: refunds the asker the deposit minus the
    /// fee plus the responder's forfeited stake, moves the question to
    /// `Refunded`, and debits the responder's reputation.
    pub async fn reject_selected_answer(
        &self,
        caller: &ActorId,
        question_id: &QuestionId,
    ) -> Result<RejectPayout> {
        let guard = self.question_guard(question_id).await;
        let _serialized = guard.lock().await;

        let (answer_id, responder) = self
            .resolvable_selection(caller, question_id, "reject")
            .await?;
        let asker = self.get_question(question_id).await?.asker;
        let fee_bps = self.config.read().await.fee_reject_bps;

        let payout = self
            .ledger
            .settle_reject(
                &self.identity,
                question_id,
                &answer_id,
                &asker,
                &self.fee_receiver,
                fee_bps,
            )
            .await?;

        self.finish_question(question_id, QuestionState::Refunded)
            .await?;
        self.stats
            .write()
            .await
            .entry(responder.clone())
            .or_insert_with(|| UserStats::new(responder.clone()))
            .record_reject();
        info!(question_id = %question_id, responder = %responder, "answer rejected");
        Ok(payout)
    }

    /// Refund a question whose settlement deadline has passed.
    ///
    /// Callable by anyone. If a responder was selected their stake is
    /// refunded minus the timeout fee and their reputation is debited by
    /// one; with no selection the asker side alone is paid and no
    /// reputation changes.
    pub async fn cancel_after_deadline(
        &self,
        caller: &ActorId,
        question_id: &QuestionId,
    ) -> Result<TimeoutPayout> {
        let guard = self.question_guard(question_id).await;
        let _serialized = guard.lock().await;

        let question = self.get_question(question_id).await?;
        if question.state.is_terminal() {
            return Err(MarketError::invalid_state(format!(
                "question {} is already settled",
                question_id
            )));
        }
        if question.deadline.is_none() {
            return Err(MarketError::invalid_state(format!(
                "question {} has no settlement deadline",
                question_id
            )));
        }
        if !question.deadline_passed(self.clock.now()) {
            return Err(MarketError::invalid_state(format!(
                "settlement window for question {} has not passed",
                question_id
            )));
        }

        let selection = match question.selected_answer {
            Some(answer_id) => {
                let answer = self.get_answer(&answer_id).await?;
                Some((answer_id, answer.responder))
            }
            None => None,
        };
        let fee_bps = self.config.read().await.fee_timeout_bps;

        let payout = self
            .ledger
            .settle_timeout(
                &self.identity,
                question_id,
                selection.as_ref().map(|(id, responder)| (id, responder)),
                &question.asker,
                &self.fee_receiver,
                fee_bps,
            )
            .await?;

        self.finish_question(question_id, QuestionState::Refunded)
            .await?;
        if let Some((_, responder)) = selection {
            self.stats
                .write()
                .await
                .entry(responder.clone())
                .or_insert_with(|| UserStats::new(responder.clone()))
                .record_timeout();
        }
        info!(question_id = %question_id, caller = %caller, "question cancelled after deadline");
        Ok(payout)
    }

    /// Look up a question
    pub async fn question(&self, question_id: &QuestionId) -> Option<Question> {
        self.questions.read().await.get(question_id).cloned()
    }

    /// Look up an answer
    pub async fn answer(&self, answer_id: &AnswerId) -> Option<Answer> {
        self.answers.read().await.get(answer_id).cloned()
    }

    /// All answers for a question, in submission order
    pub async fn answers_for(&self, question_id: &QuestionId) -> Vec<Answer> {
        let ids = self.answers_by_question.read().await;
        let answers = self.answers.read().await;
        ids.get(question_id)
            .map(|ids| ids.iter().filter_map(|id| answers.get(id).cloned()).collect())
            .unwrap_or_default()
    }

    /// Settlement statistics for a responder, if any settlements happened
    pub async fn stats(&self, responder: &ActorId) -> Option<UserStats> {
        self.stats.read().await.get(responder).cloned()
    }

    async fn question_guard(&self, question_id: &QuestionId) -> Arc<Mutex<()>> {
        let mut guards = self.question_guards.lock().await;
        guards.entry(*question_id).or_default().clone()
    }

    async fn get_question(&self, question_id: &QuestionId) -> Result<Question> {
        self.questions
            .read()
            .await
            .get(question_id)
            .cloned()
            .ok_or_else(|| MarketError::QuestionNotFound {
                question_id: question_id.to_string(),
            })
    }

    async fn get_answer(&self, answer_id: &AnswerId) -> Result<Answer> {
        self.answers
            .read()
            .await
            .get(answer_id)
            .cloned()
            .ok_or_else(|| MarketError::AnswerNotFound {
                answer_id: answer_id.to_string(),
            })
    }

    /// Validate that `caller` may resolve the question right now and return
    /// the selected answer and its responder
    async fn resolvable_selection(
        &self,
        caller: &ActorId,
        question_id: &QuestionId,
        action: &str,
    ) -> Result<(AnswerId, ActorId)> {
        let question = self.get_question(question_id).await?;
        if &question.asker != caller {
            return Err(MarketError::unauthorized(format!(
                "only the question owner may {} the selected answer",
                action
            )));
        }
        if question.state != QuestionState::Selected {
            return Err(MarketError::invalid_state(format!(
                "question {} has no selected answer pending resolution",
                question_id
            )));
        }
        let deadline = question.deadline.ok_or_else(|| {
            MarketError::invalid_state(format!("question {} has no settlement deadline", question_id))
        })?;
        if self.clock.now() > deadline {
            return Err(MarketError::invalid_state(format!(
                "settlement window for question {} has passed",
                question_id
            )));
        }
        let answer_id = question.selected_answer.ok_or_else(|| {
            MarketError::invalid_state(format!("question {} has no selected answer", question_id))
        })?;
        let answer = self.get_answer(&answer_id).await?;
        Ok((answer_id, answer.responder))
    }

    async fn finish_question(&self, question_id: &QuestionId, state: QuestionState) -> Result<()> {
        let mut questions = self.questions.write().await;
        let record = questions
            .get_mut(question_id)
            .ok_or_else(|| MarketError::QuestionNotFound {
                question_id: question_id.to_string(),
            })?;
        record.state = state;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use openquery_ledger::InMemoryTransfer;

    async fn market() -> (Marketplace, InMemoryTransfer, ManualClock) {
        let sink = InMemoryTransfer::new();
        let ledger = EscrowLedger::new(Arc::new(sink.clone()));
        let clock = ManualClock::starting_now();
        let market = Marketplace::connect_with_clock(
            ActorId::new(),
            ActorId::new(),
            ledger,
            MarketConfig::default(),
            Arc::new(clock.clone()),
        )
        .await
        .unwrap();
        (market, sink, clock)
    }

    #[tokio::test]
    async fn test_add_question_validations() {
        let (market, _, _) = market().await;
        let asker = ActorId::new();

        let empty = market.add_question(&asker, "   ", Amount::new(1_000)).await;
        assert!(matches!(empty, Err(MarketError::InvalidInput { .. })));

        let low = market.add_question(&asker, "q?", Amount::new(99)).await;
        assert!(matches!(low, Err(MarketError::InvalidInput { .. })));

        let question = market
            .add_question(&asker, "q?", Amount::new(1_000))
            .await
            .unwrap();
        assert_eq!(question.state, QuestionState::Open);
        assert_eq!(question.deposit, Amount::new(1_000));
        assert!(question.deadline.is_none());
    }

    #[tokio::test]
    async fn test_submit_answer_requires_stake() {
        let (market, _, _) = market().await;
        let asker = ActorId::new();
        let responder = ActorId::new();
        let question = market
            .add_question(&asker, "q?", Amount::new(1_000))
            .await
            .unwrap();

        // Standard tier: base stake 1000
        assert_eq!(market.required_stake(&responder).await, Amount::new(1_000));

        let short = market
            .submit_answer(&responder, &question.id, "a", Amount::new(999))
            .await;
        assert!(matches!(short, Err(MarketError::InvalidInput { .. })));

        let answer = market
            .submit_answer(&responder, &question.id, "a", Amount::new(1_000))
            .await
            .unwrap();
        assert_eq!(answer.stake, Amount::new(1_000));
        assert_eq!(market.answers_for(&question.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_select_answer_owner_only() {
        let (market, _, _) = market().await;
        let asker = ActorId::new();
        let responder = ActorId::new();
        let question = market
            .add_question(&asker, "q?", Amount::new(1_000))
            .await
            .unwrap();
        let answer = market
            .submit_answer(&responder, &question.id, "a", Amount::new(1_000))
            .await
            .unwrap();

        let not_owner = market
            .select_answer(&responder, &question.id, &answer.id)
            .await;
        assert!(matches!(not_owner, Err(MarketError::Unauthorized { .. })));

        let selected = market
            .select_answer(&asker, &question.id, &answer.id)
            .await
            .unwrap();
        assert_eq!(selected.state, QuestionState::Selected);
        assert_eq!(selected.selected_answer, Some(answer.id));
        assert!(selected.deadline.is_some());
    }

    #[tokio::test]
    async fn test_select_rejects_foreign_answer() {
        let (market, _, _) = market().await;
        let asker = ActorId::new();
        let responder = ActorId::new();
        let first = market
            .add_question(&asker, "first?", Amount::new(1_000))
            .await
            .unwrap();
        let second = market
            .add_question(&asker, "second?", Amount::new(1_000))
            .await
            .unwrap();
        let answer = market
            .submit_answer(&responder, &first.id, "a", Amount::new(1_000))
            .await
            .unwrap();

        let wrong = market.select_answer(&asker, &second.id, &answer.id).await;
        assert!(matches!(wrong, Err(MarketError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_accept_outside_window_rejected() {
        let (market, _, clock) = market().await;
        let asker = ActorId::new();
        let responder = ActorId::new();
        let question = market
            .add_question(&asker, "q?", Amount::new(1_000))
            .await
            .unwrap();
        let answer = market
            .submit_answer(&responder, &question.id, "a", Amount::new(1_000))
            .await
            .unwrap();
        market
            .select_answer(&asker, &question.id, &answer.id)
            .await
            .unwrap();

        clock.advance(chrono::Duration::seconds(72 * 3600 + 1));
        let late = market.accept_selected_answer(&asker, &question.id).await;
        assert!(matches!(late, Err(MarketError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_cancel_requires_passed_deadline() {
        let (market, _, _) = market().await;
        let asker = ActorId::new();
        let anyone = ActorId::new();
        let question = market
            .add_question(&asker, "q?", Amount::new(1_000))
            .await
            .unwrap();

        // Open question with no deadline set
        let no_deadline = market.cancel_after_deadline(&anyone, &question.id).await;
        assert!(matches!(no_deadline, Err(MarketError::InvalidState { .. })));
    }
}
