//! Hands URLs to the operating system's default opener.
//!
//! Deep links (`whatsapp://`), web links, `sms:`, `mailto:` and `tel:` URIs
//! all go through the same path: the platform opener decides which
//! application handles the scheme.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::{DesktopError, Result};

/// How long to wait for the opener before treating the hand-off as launched.
const OPENER_SETTLE: Duration = Duration::from_millis(150);

fn opener_command(url: &str) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(url);
        cmd
    } else if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", "", url]);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(url);
        cmd
    }
}

/// Open `url` with the system default handler.
///
/// Returns once the opener has either exited successfully or is still
/// running after a short settle period. An opener that exits immediately
/// with a failure status means no handler accepted the URL. An opener
/// still running at that point is left to the runtime, which reaps it.
///
/// # Errors
///
/// Returns an error if the opener cannot be spawned or rejects the URL.
pub async fn open_url(url: &str) -> Result<()> {
    launch(opener_command(url), url).await
}

async fn launch(mut cmd: Command, url: &str) -> Result<()> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| DesktopError::Open {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    tokio::time::sleep(OPENER_SETTLE).await;

    match child.try_wait() {
        Ok(Some(status)) if !status.success() => {
            warn!(url, ?status, "Opener rejected URL");
            Err(DesktopError::OpenerRejected {
                url: url.to_string(),
                status: status.code().unwrap_or(-1),
            })
        }
        Ok(_) => {
            debug!(url, "Handed URL to system opener");
            Ok(())
        }
        Err(e) => Err(DesktopError::Open {
            url: url.to_string(),
            message: e.to_string(),
        }),
    }
}
