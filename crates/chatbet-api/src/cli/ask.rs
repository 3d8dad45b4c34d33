//! `chatbet ask` -- one-shot question from the command line.

use chatbet_types::analysis::{AnalysisResult, StructuredPayload};
use console::style;
use uuid::Uuid;

use crate::state::AppState;

/// Send one message and print the result.
pub async fn ask(state: &AppState, message: &str, session: Option<String>, json: bool) -> anyhow::Result<()> {
    let message = message.trim();
    if message.is_empty() {
        anyhow::bail!("message must not be empty");
    }
    let session_id = session.unwrap_or_else(|| Uuid::now_v7().to_string());
    let result = state.orchestrator.handle_message(&session_id, None, message).await;

    if json {
        let out = serde_json::json!({
            "session_id": session_id,
            "result": result,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {}", result.narrative);
    let details = detail_lines(&result);
    if !details.is_empty() {
        println!();
        for line in details {
            println!("  {} {line}", style("•").dim());
        }
    }
    println!();
    println!(
        "  {}",
        style(format!(
            "{} ({:.0}% confidence) · session {session_id}",
            result.intent,
            result.confidence * 100.0
        ))
        .dim()
    );
    Ok(())
}

/// One line per payload item.
fn detail_lines(result: &AnalysisResult) -> Vec<String> {
    match &result.payload {
        StructuredPayload::ScheduleList { fixtures } => fixtures
            .iter()
            .map(|f| {
                let tournament = f.tournament.as_deref().map(|t| format!(" [{t}]")).unwrap_or_default();
                format!(
                    "{} vs {} · {}{tournament}",
                    f.home_team,
                    f.away_team,
                    f.kickoff_time.format("%a %d %b %H:%M UTC")
                )
            })
            .collect(),
        StructuredPayload::OddsComparison { markets, favorite } => {
            let mut lines: Vec<String> = markets
                .iter()
                .map(|m| {
                    let prices: Vec<String> = m
                        .prices
                        .iter()
                        .map(|p| format!("{} {}", p.description, p.decimal_odds))
                        .collect();
                    format!("{}: {}", m.label, prices.join(" | "))
                })
                .collect();
            if let Some(fav) = favorite {
                lines.push(format!("Favorite: {} @ {}", fav.team, fav.decimal_odds));
            }
            lines
        }
        StructuredPayload::SimulationResult { simulations } => simulations
            .iter()
            .map(|s| {
                let on = s.description.as_deref().unwrap_or("selection");
                format!(
                    "{} on {on} @ {} → payout {}, profit {}",
                    s.stake, s.decimal_odds, s.payout, s.profit
                )
            })
            .collect(),
        StructuredPayload::RecommendationList { recommendations } => recommendations
            .iter()
            .map(|r| {
                let pick = r
                    .recommendation
                    .as_ref()
                    .map(|rec| format!(" · {}: {} @ {}", rec.kind, rec.option, rec.decimal_odds))
                    .unwrap_or_default();
                format!("#{} {} (competitiveness {}){pick}", r.rank, r.label, r.competitiveness)
            })
            .collect(),
        StructuredPayload::Empty => Vec::new(),
    }
}
