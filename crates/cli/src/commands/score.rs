//! `calculate`, `recent`, `preview`, and `assign`.

use scorecap_audit::AdminAction;
use scorecap_core::{Note, OverrideMode, ValidationError, decompose, parse_overrides};

use super::CmdResult;
use crate::app::App;
use crate::display::{breakdown_lines, compact_breakdown, note_text};

pub fn calculate(app: &mut App, text: &str) -> CmdResult {
    let caps = app.caps();
    let operator = app.operator().to_string();
    let result = app.recent.calculate(&operator, text, &caps)?;
    println!("✅ Valid input. Score: {:.2}%", result.percent);
    Ok(())
}

pub fn recent(app: &App) -> CmdResult {
    let result = app.recent.require(app.operator())?;
    println!("🧾 Your last result: {:.2}%", result.percent);
    println!("   {}", compact_breakdown(&result.breakdown));
    Ok(())
}

pub fn preview(app: &App, percent: f64, text: &str) -> CmdResult {
    check_percent(percent)?;
    let caps = app.caps();
    let overrides = parse_overrides(text, &caps, OverrideMode::Partial)?;
    let breakdown = decompose(percent, &overrides, &caps)?;

    let with = if overrides.is_empty() {
        "no overrides"
    } else {
        "overrides"
    };
    println!("🧮 Preview for {percent:.2}% with {with}");
    for line in breakdown_lines(&breakdown, &caps) {
        println!("   {line}");
    }
    Ok(())
}

pub fn assign(app: &mut App, player: &str, percent: Option<f64>, text: &str) -> CmdResult {
    let caps = app.caps();

    let Some(percent) = percent else {
        if !text.trim().is_empty() {
            return Err("Overrides need a percentage: assign <player> --percent <value> [a=..]".into());
        }
        let result = app.recent.require(app.operator())?;
        let record = app
            .ledger
            .assign_recent(player, &result, &caps)
            .inspect_err(|e| {
                let action = AdminAction::Assigned {
                    percent: result.percent,
                };
                app.record_unsaved(action, player, e);
            })?;
        println!("📌 Assigned {:.2}% to {player}.", record.percent);
        app.record(
            AdminAction::Assigned {
                percent: record.percent,
            },
            player,
        );
        return Ok(());
    };

    check_percent(percent)?;
    let overrides = parse_overrides(text, &caps, OverrideMode::Partial)?;
    let record = app
        .ledger
        .assign_from_breakdown(player, percent, &overrides, &caps)
        .inspect_err(|e| app.record_unsaved(AdminAction::Assigned { percent }, player, e))?;

    println!("📌 Assigned {percent:.2}% to {player}.");
    println!("ℹ️  {}", note_text(record.note));
    if record.note == Note::Overridden {
        println!("   {}", compact_breakdown(&record.breakdown));
    }
    app.record(AdminAction::Assigned { percent }, player);
    Ok(())
}

fn check_percent(percent: f64) -> Result<(), ValidationError> {
    if (0.0..=100.0).contains(&percent) {
        Ok(())
    } else {
        Err(ValidationError::PercentOutOfRange(percent))
    }
}
