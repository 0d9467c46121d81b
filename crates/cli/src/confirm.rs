//! Typed confirmation for destructive commands.

use std::time::Duration;
use tokio::io::{AsyncBufRead, Lines};

/// How a confirmation prompt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
    TimedOut,
}

/// Wait up to `timeout` for the next input line to read `CONFIRM`.
///
/// The match ignores case and surrounding whitespace. Any other reply,
/// including end of input, declines.
pub async fn await_confirmation<R>(
    lines: &mut Lines<R>,
    timeout: Duration,
) -> std::io::Result<Confirmation>
where
    R: AsyncBufRead + Unpin,
{
    match tokio::time::timeout(timeout, lines.next_line()).await {
        Err(_) => Ok(Confirmation::TimedOut),
        Ok(Ok(Some(reply))) if reply.trim().eq_ignore_ascii_case("confirm") => {
            Ok(Confirmation::Confirmed)
        }
        Ok(Ok(_)) => Ok(Confirmation::Declined),
        Ok(Err(e)) => Err(e),
    }
}
