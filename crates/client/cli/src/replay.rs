//! Drives a scripted battle through the engine.

use battle_content::{BattleScript, ScriptStep};
use battle_core::{
    BattleAction, BattleEngine, BattleEnv, BattleError, BattleOutcome, BattleState, TurnReport,
    compute_log_root,
};
use tracing::{info, warn};

/// What a replay produced.
#[derive(Debug)]
pub struct ReplayReport {
    /// Human-readable transcript, one line per element.
    pub lines: Vec<String>,
    pub outcome: BattleOutcome,
    pub log_root: [u8; 32],
    /// Steps the engine refused.
    pub rejected: usize,
}

/// Starts the battle and feeds every script step to the engine.
///
/// A refused step is reported and skipped; the replay keeps going so a
/// partially broken script still yields a log.
pub fn replay(
    state: &mut BattleState,
    env: BattleEnv<'_>,
    script: &BattleScript,
    verbose: bool,
) -> anyhow::Result<ReplayReport> {
    let mut lines = Vec::new();
    let mut rejected = 0;
    let mut engine = BattleEngine::new(state);

    let report = engine
        .start(env)
        .map_err(|e| anyhow::anyhow!("Failed to start battle: {}", e))?;
    push_turn(&mut lines, &engine, &report);

    for (step_no, step) in script.steps.iter().enumerate() {
        if engine.outcome().is_over() {
            info!(step = step_no, "battle decided, ignoring remaining steps");
            break;
        }
        let result = match step {
            ScriptStep::Act(request) => engine.execute(env, request).map(|outcome| {
                push_entry(&mut lines, &outcome.entry, verbose);
                if let Some(report) = &outcome.next_turn {
                    push_turn(&mut lines, &engine, report);
                }
            }),
            ScriptStep::EndTurn => engine
                .end_turn(env)
                .map(|report| push_turn(&mut lines, &engine, &report)),
            ScriptStep::Undo => engine.undo_last().map(|entry| {
                lines.push(format!("  undo #{} ({})", entry.index, entry.kind));
            }),
        };
        if let Err(err) = result {
            warn!(step = step_no, code = err.error_code(), "step rejected: {}", err);
            lines.push(format!("  rejected [{}]: {}", err.error_code(), err));
            rejected += 1;
        }
    }

    let outcome = engine.outcome();
    lines.push(format!("Outcome: {outcome}"));
    Ok(ReplayReport {
        lines,
        outcome,
        log_root: compute_log_root(&engine.state().log),
        rejected,
    })
}

fn push_turn(lines: &mut Vec<String>, engine: &BattleEngine<'_>, report: &TurnReport) {
    if report.new_round || lines.is_empty() {
        lines.push(format!("== Round {} ==", report.round));
    }
    lines.extend(report.narration.iter().map(|line| format!("  {line}")));
    if let Some(actor) = report.actor {
        let name = engine
            .state()
            .participant(actor)
            .map(|p| p.name.as_str())
            .unwrap_or("?");
        let again = if report.extra_turn { " (extra turn)" } else { "" };
        lines.push(format!("-- {name}'s turn{again}"));
    }
}

fn push_entry(lines: &mut Vec<String>, entry: &BattleAction, verbose: bool) {
    lines.push(format!(
        "  #{} {} by {}: {}",
        entry.index, entry.kind, entry.actor, entry.result
    ));
    lines.extend(entry.narration.iter().map(|line| format!("    {line}")));
    if verbose {
        lines.extend(entry.details.breakdown.iter().map(|line| format!("      {line}")));
    }
}
