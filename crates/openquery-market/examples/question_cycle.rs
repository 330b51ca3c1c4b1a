//! OpenQuery Demo - Complete Question Cycle
//!
//! This example demonstrates the full escrow-settled Q&A lifecycle:
//!
//! Question → Deposit Lock → Answers → Stake Locks → Selection → Settlement
//!
//! Run with:
//!   cargo run --example question_cycle

use std::sync::Arc;

use openquery_market::{
    ActorId, Amount, EscrowLedger, InMemoryTransfer, MarketConfig, Marketplace,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║                      O P E N Q U E R Y                   ║");
    println!("║        Escrow-settled Question / Answer Marketplace      ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();

    // =========================================================================
    // Step 1: Wire up the ledger and marketplace
    // =========================================================================
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(" Step 1: Wire up ledger and marketplace");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let sink = InMemoryTransfer::new();
    let ledger = EscrowLedger::new(Arc::new(sink.clone()));

    let owner = ActorId::new();
    let fee_receiver = ActorId::new();
    let market = Marketplace::connect(
        owner,
        fee_receiver.clone(),
        ledger,
        MarketConfig::default(),
    )
    .await
    .expect("marketplace setup failed");

    println!("  ✓ Ledger linked to marketplace: {}", market.identity());
    println!("  ✓ Fee receiver: {}", fee_receiver);
    println!();

    // =========================================================================
    // Step 2: Asker posts a question with a deposit
    // =========================================================================
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(" Step 2: Asker posts a question");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let asker = ActorId::new();
    let question = market
        .add_question(
            &asker,
            "How do I make this borrow checker error go away?",
            Amount::new(10_000),
        )
        .await
        .expect("posting question failed");

    println!("  ✓ Question posted: {}", question.id);
    println!("    Deposit locked: {}", question.deposit);
    println!("    State: {:?}", question.state);
    println!();

    // =========================================================================
    // Step 3: Responders submit collateralized answers
    // =========================================================================
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(" Step 3: Responders submit answers");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let first_responder = ActorId::new();
    let second_responder = ActorId::new();

    let required = market.required_stake(&first_responder).await;
    println!("  Required stake for a new responder: {}", required);

    let first_answer = market
        .submit_answer(&first_responder, &question.id, "Clone it.", required)
        .await
        .expect("first answer failed");
    let second_answer = market
        .submit_answer(
            &second_responder,
            &question.id,
            "Borrow the field, not the struct.",
            required,
        )
        .await
        .expect("second answer failed");

    println!("  ✓ Answer 1: {} (stake {})", first_answer.id, first_answer.stake);
    println!("  ✓ Answer 2: {} (stake {})", second_answer.id, second_answer.stake);
    println!();

    // =========================================================================
    // Step 4: Asker selects an answer, fixing the settlement window
    // =========================================================================
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(" Step 4: Asker selects an answer");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let selected = market
        .select_answer(&asker, &question.id, &second_answer.id)
        .await
        .expect("selection failed");

    println!("  ✓ Selected: {}", second_answer.id);
    println!("    Settlement deadline: {}", selected.deadline.expect("deadline set"));
    println!();

    // =========================================================================
    // Step 5: Accept and settle
    // =========================================================================
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(" Step 5: Accept the selected answer");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let payout = market
        .accept_selected_answer(&asker, &question.id)
        .await
        .expect("acceptance failed");

    println!("  ✓ Settlement executed");
    println!("    Paid to responder: {}", payout.paid);
    println!("    Platform fee:      {}", payout.fee);
    println!("    Stake returned:    {}", payout.stake_returned);
    println!();

    // =========================================================================
    // Final Summary
    // =========================================================================
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(" Final Balances & Reputation");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Responder balance:    {}", sink.balance(&second_responder).await);
    println!("  Fee receiver balance: {}", sink.balance(&fee_receiver).await);

    let stats = market
        .stats(&second_responder)
        .await
        .expect("stats recorded");
    println!("  Responder reputation: {}", stats.reputation);
    println!(
        "  Next required stake:  {}",
        market.required_stake(&second_responder).await
    );
    println!();
    println!("  ✓ Complete question cycle demonstrated successfully");
}
