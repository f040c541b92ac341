use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{Clear, ClearType};

use crate::models::{Snapshot, Status, TargetRecord};

/// Receives one complete snapshot per round.
pub trait Renderer {
    fn render(&mut self, snapshot: &Snapshot) -> io::Result<()>;
}

/// Redraws the status table in place on a terminal.
pub struct TerminalRenderer<W: Write> {
    out: W,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

#[cfg(test)]
impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        // Build the whole frame first so the screen is never left half drawn.
        let mut frame = format!(
            "--- IP Status Check --- {}\n",
            snapshot.taken_at.format("%H:%M:%S")
        );
        for record in &snapshot.records {
            frame.push_str(&format_record(record));
            frame.push('\n');
        }

        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0), Print(frame))?;
        self.out.flush()
    }
}

pub fn format_record(record: &TargetRecord) -> String {
    let status = format!("{:<8}", record.status);
    let status = match record.status {
        Status::Online => status.green(),
        Status::Offline => status.red(),
    };

    let counters = format!("({} ok / {} !ok)", record.success, record.failure);
    let counters = if record.failure > 0 {
        counters.yellow().to_string()
    } else {
        counters
    };

    format!("{:<18}  {}  {}", record.target, status, counters)
}
