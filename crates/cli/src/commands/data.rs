//! Bulk data commands: wipe, export, import, and the admin log destination.

use scorecap_audit::{AdminAction, AuditOutcome};
use scorecap_ledger::Ledger;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufRead, Lines};

use super::CmdResult;
use crate::app::App;
use crate::confirm::{Confirmation, await_confirmation};

pub async fn wipe<R>(app: &mut App, yes: bool, input: &mut Lines<R>) -> CmdResult
where
    R: AsyncBufRead + Unpin,
{
    if !yes {
        println!(
            "⚠️  Are you sure you want to wipe ALL player data? Type CONFIRM to proceed or CANCEL to abort."
        );
        if !confirmed(app, input, "Wipe", AdminAction::Wiped { count: 0 }).await? {
            return Ok(());
        }
    }

    let before = app.ledger.len();
    let count = app
        .ledger
        .wipe_all()
        .inspect_err(|e| app.record_unsaved(AdminAction::Wiped { count: before }, "*", e))?;
    println!("🧹 All player data wiped successfully ({count} records).");
    app.record(AdminAction::Wiped { count }, "*");
    Ok(())
}

pub fn export(app: &App, output: Option<PathBuf>) -> CmdResult {
    let path = output.unwrap_or_else(|| app.config.backup_path());
    let json = app.ledger.export_json()?;
    std::fs::write(&path, json).map_err(|e| format!("Failed to export backup to {}: {e}", path.display()))?;

    println!("📤 Exported {} records to {}", app.ledger.len(), path.display());
    app.record(
        AdminAction::Exported {
            path: path.display().to_string(),
        },
        "*",
    );
    Ok(())
}

pub async fn import<R>(app: &mut App, file: &Path, yes: bool, input: &mut Lines<R>) -> CmdResult
where
    R: AsyncBufRead + Unpin,
{
    if file.extension().is_none_or(|ext| ext != "json") {
        return Err(format!("{} must be a .json file", file.display()).into());
    }

    if !yes {
        println!(
            "⚠️  This will OVERWRITE all current player data with the contents of {}. Type CONFIRM to proceed or CANCEL to abort.",
            file.display()
        );
        let canceled = AdminAction::Imported {
            imported: 0,
            dropped: 0,
        };
        if !confirmed(app, input, "Import", canceled).await? {
            return Ok(());
        }
    }

    let text = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
    let (records, report) = Ledger::parse_import(&text)?;
    let action = AdminAction::Imported {
        imported: report.imported,
        dropped: report.dropped,
    };
    let target = file.display().to_string();
    app.ledger
        .replace_all(records)
        .inspect_err(|e| app.record_unsaved(action.clone(), &target, e))?;

    println!("📥 Successfully imported {} players from file.", report.imported);
    if report.dropped > 0 {
        println!("   Skipped {} malformed entries.", report.dropped);
    }
    app.record(action, &target);
    Ok(())
}

pub fn set_log_channel(app: &mut App, destination: &Path) -> CmdResult {
    app.set_log_destination(destination)?;
    println!("📌 Admin log set to {}.", destination.display());
    Ok(())
}

/// Prompt has already been printed. Reports the outcome and logs cancellations.
async fn confirmed<R>(
    app: &App,
    input: &mut Lines<R>,
    what: &str,
    action: AdminAction,
) -> Result<bool, Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
{
    let timeout = Duration::from_secs(app.config.shell.confirm_timeout_secs);
    let outcome = await_confirmation(input, timeout).await?;
    let details = match outcome {
        Confirmation::Confirmed => return Ok(true),
        Confirmation::Declined => {
            println!("❌ {what} operation canceled.");
            "declined"
        }
        Confirmation::TimedOut => {
            println!("⏳ Timed out. {what} canceled.");
            "timed out"
        }
    };
    app.audit.log(
        app.operator(),
        action,
        "*",
        AuditOutcome::Canceled,
        Some(details.into()),
    );
    Ok(false)
}
