//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext};
use crate::controller::reducer;
use crate::controller::session::{Notice, SessionState};

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
) -> Result<(), UiError> {
    let cmd_name = cmd.name();
    let operation_id = cmd.id();

    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, %operation_id, "queued ui->backend command");
            Ok(())
        }
        Err(TrySendError::Full(_)) => Err(UiError::from_message(
            UiErrorContext::General,
            "UI command queue is full; please retry",
        )),
        Err(TrySendError::Disconnected(_)) => Err(UiError::from_message(
            UiErrorContext::General,
            "Backend command processor disconnected (possible startup/runtime failure); restart the app",
        )),
    }
}

/// Runs a guarded transition and queues its command. A rejected submit is a silent no-op; a
/// queue failure returns the session to idle and yields the notice to show.
pub fn submit(
    cmd_tx: &Sender<BackendCommand>,
    state: &mut SessionState,
    begin: fn(&mut SessionState) -> Option<BackendCommand>,
) -> Option<Notice> {
    let cmd = begin(state)?;
    match dispatch_backend_command(cmd_tx, cmd) {
        Ok(()) => None,
        Err(err) => Some(reducer::abandon_dispatch(state, &err)),
    }
}
