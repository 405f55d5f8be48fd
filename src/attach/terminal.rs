//! Local terminal mode with scoped raw-mode acquisition

use std::io::{self, IsTerminal};

use crossterm::terminal::{disable_raw_mode, enable_raw_mode, is_raw_mode_enabled};
use tracing::{debug, warn};

/// Input mode control of the local terminal.
pub trait TerminalMode {
    /// Whether local input is an interactive terminal
    fn is_interactive(&self) -> bool;

    fn is_raw(&self) -> io::Result<bool>;

    fn set_raw(&self, enabled: bool) -> io::Result<()>;
}

/// The process's own terminal, via crossterm.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalTerminal;

impl TerminalMode for LocalTerminal {
    fn is_interactive(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn is_raw(&self) -> io::Result<bool> {
        is_raw_mode_enabled()
    }

    fn set_raw(&self, enabled: bool) -> io::Result<()> {
        if enabled {
            enable_raw_mode()
        } else {
            disable_raw_mode()
        }
    }
}

/// Raw mode held for the lifetime of the guard.
///
/// The terminal goes back to the mode it had before [`RawModeGuard::acquire`]
/// when the guard is released or dropped, whichever comes first. A terminal
/// that was already raw, or input that is not a terminal, is left untouched.
pub struct RawModeGuard<'a, T: TerminalMode + ?Sized> {
    terminal: &'a T,
    /// Mode to restore, if this guard changed it
    restore: Option<bool>,
}

impl<'a, T: TerminalMode + ?Sized> RawModeGuard<'a, T> {
    pub fn acquire(terminal: &'a T) -> io::Result<Self> {
        if !terminal.is_interactive() {
            debug!("input is not a terminal, leaving mode unchanged");
            return Ok(Self {
                terminal,
                restore: None,
            });
        }

        if terminal.is_raw()? {
            return Ok(Self {
                terminal,
                restore: None,
            });
        }

        terminal.set_raw(true)?;
        Ok(Self {
            terminal,
            restore: Some(false),
        })
    }

    /// Whether this guard switched the terminal into raw mode
    pub fn changed_mode(&self) -> bool {
        self.restore.is_some()
    }

    /// Restore the previous mode now, reporting failure.
    pub fn release(mut self) -> io::Result<()> {
        match self.restore.take() {
            Some(mode) => self.terminal.set_raw(mode),
            None => Ok(()),
        }
    }
}

impl<T: TerminalMode + ?Sized> Drop for RawModeGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(mode) = self.restore.take() {
            if let Err(e) = self.terminal.set_raw(mode) {
                warn!(error = %e, "failed to restore terminal mode");
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::cell::Cell;
    use std::io;

    use super::TerminalMode;

    /// In-memory terminal for exercising mode changes
    #[derive(Debug, Default)]
    pub struct FakeTerminal {
        pub interactive: bool,
        pub raw: Cell<bool>,
        pub switches: Cell<usize>,
        pub fail_enable: bool,
    }

    impl FakeTerminal {
        pub fn interactive() -> Self {
            Self {
                interactive: true,
                ..Self::default()
            }
        }
    }

    impl TerminalMode for FakeTerminal {
        fn is_interactive(&self) -> bool {
            self.interactive
        }

        fn is_raw(&self) -> io::Result<bool> {
            Ok(self.raw.get())
        }

        fn set_raw(&self, enabled: bool) -> io::Result<()> {
            if enabled && self.fail_enable {
                return Err(io::Error::new(io::ErrorKind::Other, "not a tty"));
            }
            self.switches.set(self.switches.get() + 1);
            self.raw.set(enabled);
            Ok(())
        }
    }
}
