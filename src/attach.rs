//! Interactive attachment to a remote process's stdio
//!
//! Local input goes to the remote, remote output goes to the local terminal.
//! The terminal is switched to raw mode for the duration of a session, and
//! exec sessions additionally relay window-size changes to the remote.

mod relay;
mod resize;
mod session;
mod terminal;

pub use relay::{pump, PumpError};
pub use resize::{window_changes, ResizeSubscription, ResizeTarget, WindowSize};
pub use session::{attach_stream, exec_stream, InteractiveSession};
pub use terminal::{LocalTerminal, RawModeGuard, TerminalMode};
