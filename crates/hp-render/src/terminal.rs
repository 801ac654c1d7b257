#![forbid(unsafe_code)]

//! Terminal capability layer.
//!
//! Width queries, input suppression, cursor shape, and the panic-time
//! cleanup path. Every operation here degrades instead of failing: a
//! missing controlling terminal means the feature is skipped and logged.
//!
//! # Input suppression
//!
//! [`QuietMode`] clears `ECHO`, `ICANON` and `IEXTEN` on `/dev/tty` so
//! keystrokes do not smear the bar line. `ISIG` is left set: Ctrl-C and
//! Ctrl-Z still raise signals, which the signal worker handles. `OPOST`
//! stays set too, so `\n` keeps its carriage return.
//!
//! The original termios lives in a process-wide slot so the panic hook and
//! the suspend path can restore it without holding a guard.

use std::io::{self, Write};
use std::sync::OnceLock;
#[cfg(unix)]
use std::sync::{Mutex, MutexGuard};

use crate::ansi;

/// Fallback when the width cannot be queried.
pub const DEFAULT_WIDTH: usize = 80;

/// Current terminal column count, [`DEFAULT_WIDTH`] when unknown.
#[must_use]
pub fn terminal_width() -> usize {
    #[cfg(not(target_arch = "wasm32"))]
    {
        match crossterm::terminal::size() {
            Ok((cols, _)) if cols > 0 => usize::from(cols),
            Ok(_) => DEFAULT_WIDTH,
            Err(err) => {
                tracing::trace!(%err, "terminal size unavailable");
                DEFAULT_WIDTH
            }
        }
    }
    #[cfg(target_arch = "wasm32")]
    {
        DEFAULT_WIDTH
    }
}

/// Whether stdout is attached to a terminal.
#[must_use]
pub fn stdout_is_tty() -> bool {
    #[cfg(not(target_arch = "wasm32"))]
    {
        use crossterm::tty::IsTty;
        io::stdout().is_tty()
    }
    #[cfg(target_arch = "wasm32")]
    {
        false
    }
}

// ── Quiet mode ───────────────────────────────────────────────────────────

#[cfg(unix)]
struct Saved {
    tty: std::fs::File,
    original: nix::sys::termios::Termios,
}

#[cfg(unix)]
static SAVED: Mutex<Option<Saved>> = Mutex::new(None);

#[cfg(unix)]
fn saved() -> MutexGuard<'static, Option<Saved>> {
    SAVED.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Handle on the controlling terminal's input mode.
///
/// Dropping it restores the original settings.
#[derive(Debug)]
pub struct QuietMode {
    active: bool,
}

impl QuietMode {
    /// Suppress echo and line buffering on the controlling terminal.
    ///
    /// Never fails: without a usable `/dev/tty` the handle is inert.
    pub fn enter() -> Self {
        match enter_inner() {
            Ok(()) => Self { active: true },
            Err(err) => {
                tracing::debug!(%err, "input suppression unavailable, continuing without it");
                Self { active: false }
            }
        }
    }

    /// A handle that never touches the terminal.
    #[must_use]
    pub const fn detached() -> Self {
        Self { active: false }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Put the original termios back.
    pub fn restore(&self) {
        if self.active {
            restore_saved();
        }
    }

    /// Re-apply suppression after a [`restore`](Self::restore), e.g. on resume.
    pub fn reenter(&self) {
        if self.active
            && let Err(err) = reapply_saved()
        {
            tracing::debug!(%err, "failed to re-apply input suppression");
        }
    }
}

impl Drop for QuietMode {
    fn drop(&mut self) {
        self.restore();
    }
}

#[cfg(unix)]
fn enter_inner() -> io::Result<()> {
    let tty = std::fs::File::options()
        .read(true)
        .write(true)
        .open("/dev/tty")?;
    let original = nix::sys::termios::tcgetattr(&tty).map_err(io::Error::other)?;
    apply_quiet(&tty, &original)?;
    *saved() = Some(Saved { tty, original });
    Ok(())
}

#[cfg(not(unix))]
fn enter_inner() -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "termios not available on this platform",
    ))
}

#[cfg(unix)]
fn apply_quiet(tty: &std::fs::File, original: &nix::sys::termios::Termios) -> io::Result<()> {
    use nix::sys::termios::{LocalFlags, SetArg, tcsetattr};

    let mut quiet = original.clone();
    quiet
        .local_flags
        .remove(LocalFlags::ECHO | LocalFlags::ICANON | LocalFlags::IEXTEN);
    tcsetattr(tty, SetArg::TCSANOW, &quiet).map_err(io::Error::other)
}

#[cfg(unix)]
fn reapply_saved() -> io::Result<()> {
    match saved().as_ref() {
        Some(s) => apply_quiet(&s.tty, &s.original),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn reapply_saved() -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn restore_saved() {
    if let Some(s) = saved().as_ref() {
        let _ = nix::sys::termios::tcsetattr(
            &s.tty,
            nix::sys::termios::SetArg::TCSANOW,
            &s.original,
        );
    }
}

#[cfg(not(unix))]
fn restore_saved() {}

// ── Cursor shape ─────────────────────────────────────────────────────────

/// Steady block cursor while the bar is live.
pub fn cursor_steady<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(ansi::CURSOR_STEADY_BLOCK)
}

/// The user's configured cursor shape.
pub fn cursor_default<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(ansi::CURSOR_DEFAULT)
}

// ── Panic safety ─────────────────────────────────────────────────────────

/// Chain a hook that resets style, cursor shape and termios before the
/// previous hook prints the panic.
pub fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            best_effort_cleanup();
            previous(info);
        }));
    });
}

/// Restore what can be restored, ignoring every error, and leave the
/// cursor on a fresh line for the panic message.
pub fn best_effort_cleanup() {
    cleanup(true);
}

/// Style, cursor shape and termios only. Nothing moves on screen, so a
/// fatal error before the first paint leaves no stray blank line.
pub fn reset_terminal() {
    cleanup(false);
}

fn cleanup(newline: bool) {
    let mut stdout = io::stdout();
    let _ = write_cleanup(&mut stdout, newline);
    let _ = stdout.flush();
    restore_saved();
}

/// Style reset and default cursor, then an optional newline.
pub fn write_cleanup<W: Write>(w: &mut W, newline: bool) -> io::Result<()> {
    ansi::sgr_reset(w)?;
    cursor_default(w)?;
    if newline {
        w.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_is_never_zero() {
        assert!(terminal_width() > 0);
    }

    #[test]
    fn detached_mode_is_inert() {
        let quiet = QuietMode::detached();
        assert!(!quiet.is_active());
        quiet.restore();
        quiet.reenter();
    }

    #[test]
    fn cursor_shape_sequences() {
        let mut buf = Vec::new();
        cursor_steady(&mut buf).unwrap();
        cursor_default(&mut buf).unwrap();
        assert_eq!(buf, b"\x1b[2 q\x1b[0 q");
    }

    #[test]
    fn reset_without_newline() {
        let mut buf = Vec::new();
        write_cleanup(&mut buf, false).unwrap();
        assert_eq!(buf, b"\x1b[0m\x1b[0 q");

        let mut buf = Vec::new();
        write_cleanup(&mut buf, true).unwrap();
        assert_eq!(buf, b"\x1b[0m\x1b[0 q\n");
    }
}
