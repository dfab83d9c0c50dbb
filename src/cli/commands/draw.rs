use crate::cli::Credentials;
use crate::services::{DrawView, LotteryError};
use crate::state::SharedState;

use super::authenticate;

fn print_draw(draw: &DrawView) {
    println!("• Draw {} - {}", draw.id, draw.numbers);
    println!("  Submitted: {}", draw.created_at);
}

pub async fn cmd_draw_submit(
    state: &SharedState,
    credentials: &Credentials,
    numbers: &[String],
) -> anyhow::Result<()> {
    let user = authenticate(state, credentials).await?;
    let input = numbers.join(" ");

    match state.lottery_service.submit_draw(&user, &input).await {
        Ok(draw) => {
            println!("✓ Draw {} submitted: {}", draw.id, draw.numbers);
            Ok(())
        }
        Err(LotteryError::InvalidNumbers(reason)) => {
            println!("✗ Invalid draw: {reason}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn cmd_draw_list(state: &SharedState, credentials: &Credentials) -> anyhow::Result<()> {
    let user = authenticate(state, credentials).await?;
    let draws = state.lottery_service.view_draws(&user).await?;

    if draws.is_empty() {
        println!("No playable draws.");
        return Ok(());
    }

    println!("Playable Draws ({} total)", draws.len());
    println!("{:-<50}", "");
    for draw in &draws {
        print_draw(draw);
    }

    Ok(())
}

pub async fn cmd_draw_results(state: &SharedState, credentials: &Credentials) -> anyhow::Result<()> {
    let user = authenticate(state, credentials).await?;
    let draws = state.lottery_service.check_results(&user).await?;

    if draws.is_empty() {
        println!("No played draws yet. Check again after the next round.");
        return Ok(());
    }

    println!("Results ({} played)", draws.len());
    println!("{:-<50}", "");
    for draw in &draws {
        let outcome = if draw.matches_master { "WIN" } else { "no match" };
        println!(
            "• Round {} - {} [{}]",
            draw.lottery_round, draw.numbers, outcome
        );
    }

    Ok(())
}
