use std::io::{self, Write};

use wagers::{Direction, Outcome, Wager};

use crate::events::SessionEvent;
use crate::logging::{RunLogEvent, RunLogEventKind, RunLogWriter};

pub const JOURNAL_CSV_HEADER: &str =
    "t,kind,price,wager_id,direction,amount,result,profit,balance\n";

/// Appends session events to a CSV journal, one row per event.
pub struct JournalCsvWriter<W: Write> {
    writer: W,
}

impl<W: Write> JournalCsvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        self.writer.write_all(JOURNAL_CSV_HEADER.as_bytes())
    }

    pub fn write_header_and_log(
        &mut self,
        time_ms: i64,
        run_log_writer: &mut dyn RunLogWriter,
    ) -> io::Result<()> {
        self.write_header()?;
        self.writer.flush()?;
        run_log_writer.write(RunLogEvent::new(
            time_ms,
            RunLogEventKind::JournalWritten,
            None,
        ));
        Ok(())
    }

    pub fn append_events(&mut self, events: &[SessionEvent]) -> io::Result<()> {
        for event in events {
            self.append_event(event)?;
        }
        self.writer.flush()
    }

    fn append_event(&mut self, event: &SessionEvent) -> io::Result<()> {
        match event {
            SessionEvent::SessionStarted {
                time_ms,
                asset,
                price,
                ..
            } => {
                let kind = escape_csv_field(&format!("session_started:{asset}"));
                writeln!(self.writer, "{time_ms},{kind},{price},,,,,,")
            }
            SessionEvent::PriceTicked { time_ms, tick, .. } => {
                writeln!(self.writer, "{time_ms},price_tick,{},,,,,,", tick.price)
            }
            SessionEvent::CandleAppended {
                time_ms, candle, ..
            } => {
                writeln!(self.writer, "{time_ms},candle,{},,,,,,", candle.open)
            }
            SessionEvent::WagerSubmitted {
                time_ms,
                wager,
                balance,
            } => self.write_wager_row(*time_ms, "wager_submitted", wager, *balance),
            SessionEvent::WagerSettled {
                time_ms,
                wager,
                balance,
            } => self.write_wager_row(*time_ms, "wager_settled", wager, *balance),
            SessionEvent::WagerExpired { time_ms, wager_id } => {
                writeln!(self.writer, "{time_ms},wager_expired,,{wager_id},,,,,")
            }
            SessionEvent::AssetSwitched {
                time_ms,
                asset,
                price,
            } => {
                let kind = escape_csv_field(&format!("asset_switched:{asset}"));
                writeln!(self.writer, "{time_ms},{kind},{price},,,,,,")
            }
            SessionEvent::SessionStopped { time_ms } => {
                writeln!(self.writer, "{time_ms},session_stopped,,,,,,,")
            }
        }
    }

    fn write_wager_row(
        &mut self,
        time_ms: i64,
        kind: &str,
        wager: &Wager,
        balance: f64,
    ) -> io::Result<()> {
        let price = wager.settlement_price.unwrap_or(wager.entry_price);
        let direction = match wager.direction {
            Direction::Up => "up",
            Direction::Down => "down",
        };
        let result = match wager.result {
            Some(Outcome::Win) => "win",
            Some(Outcome::Loss) => "loss",
            None => "",
        };
        let profit = wager.profit.map(|profit| profit.to_string()).unwrap_or_default();

        writeln!(
            self.writer,
            "{time_ms},{kind},{price},{},{direction},{},{result},{profit},{balance}",
            wager.id, wager.amount
        )
    }
}

fn escape_csv_field(value: &str) -> String {
    let needs_quotes = value
        .chars()
        .any(|ch| matches!(ch, ',' | '"' | '\n' | '\r'));
    if !needs_quotes {
        return value.to_string();
    }

    let escaped = value.replace('"', "\"\"");
    format!("\"{escaped}\"")
}
