use std::io::{self, IsTerminal};

use crossterm::terminal;

/// Raw-mode guard for the interactive bridge. Acquiring it flips the local
/// terminal to raw so keystrokes reach the remote side unbuffered, dropping
/// it restores cooked mode on every exit path. Inert when stdin is not a
/// terminal, which keeps piped sessions working.
pub struct RawMode {
    active: bool,
}

impl RawMode {
    pub fn acquire() -> io::Result<Self> {
        if !io::stdin().is_terminal() {
            return Ok(Self { active: false });
        }
        terminal::enable_raw_mode()?;
        Ok(Self { active: true })
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if self.active {
            let _ = terminal::disable_raw_mode();
        }
    }
}

pub fn window_size() -> (u16, u16) {
    terminal::size().unwrap_or((80, 24))
}

pub fn term_name() -> String {
    std::env::var("TERM").unwrap_or_else(|_| "xterm".to_string())
}
