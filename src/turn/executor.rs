use crate::core::commitment::Commitment;
use crate::matching::stream::StreamMatcher;
use crate::turn::schedule::ThresholdSchedule;
use crate::turn::writer::{BatchWriter, CommitmentSink, SinkError};
use chrono::{DateTime, Utc};
use log::info;
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Instant;
use uuid::Uuid;

/// Summary of one matching turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReport {
    /// Unique identifier of this turn.
    pub turn_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Commitments read from the input stream.
    pub commitments_read: usize,
    /// Gross absolute value of the commitments read.
    pub gross_value: Decimal,
    /// Deals settled.
    pub deal_count: usize,
    /// Matched commitment legs handed to the sink.
    pub legs_written: usize,
    /// Total value that changed hands across all deals.
    pub cleared_total: Decimal,
}

impl TurnReport {
    /// Fraction of the gross input value that was cleared, in `[0, 1]`
    /// terms of the per-leg totals.
    pub fn clearing_ratio(&self) -> f64 {
        if self.gross_value == Decimal::ZERO {
            return 0.0;
        }
        let ratio = self.cleared_total / self.gross_value;
        ratio.to_string().parse::<f64>().unwrap_or(0.0)
    }
}

impl std::fmt::Display for TurnReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Turn {} ===", self.turn_id)?;
        writeln!(f, "Commitments:  {}", self.commitments_read)?;
        writeln!(f, "Gross value:  {}", self.gross_value)?;
        writeln!(f, "Deals:        {}", self.deal_count)?;
        writeln!(f, "Legs written: {}", self.legs_written)?;
        writeln!(f, "Cleared:      {}", self.cleared_total)?;
        writeln!(f, "Ratio:        {:.1}%", self.clearing_ratio() * 100.0)?;
        Ok(())
    }
}

/// Run one matching turn: feed an ordered commitment stream through the
/// incremental matcher and write every cleared leg through the batch
/// writer.
///
/// The minimum transferable value follows the schedule: each time a window
/// expires, the threshold in force for the rest of the stream escalates by
/// the next exponent. Deals are written as they settle, in stream order;
/// the writer is flushed a final time before the report is returned.
///
/// # Examples
///
/// ```
/// use barter_engine::core::commitment::Commitment;
/// use barter_engine::turn::executor::match_commitments;
/// use barter_engine::turn::schedule::ThresholdSchedule;
/// use barter_engine::turn::writer::{BatchWriter, VecSink};
/// use rust_decimal_macros::dec;
///
/// let commitments = vec![
///     Commitment::new(1, 2, 1, dec!(120)),
///     Commitment::new(2, 3, 1, dec!(-150)),
///     Commitment::new(1, 3, 2, dec!(-250)),
/// ];
///
/// let mut writer = BatchWriter::new(VecSink::new());
/// let report = match_commitments(commitments, &mut writer, &ThresholdSchedule::default())
///     .unwrap();
/// assert_eq!(report.commitments_read, 3);
/// ```
pub fn match_commitments<I, S>(
    commitments: I,
    writer: &mut BatchWriter<S>,
    schedule: &ThresholdSchedule,
) -> Result<TurnReport, SinkError>
where
    I: IntoIterator<Item = Commitment>,
    S: CommitmentSink,
{
    let turn_id = Uuid::new_v4();
    let started_at = Utc::now();
    let mut matcher = StreamMatcher::new(ThresholdSchedule::base_mtv());

    let mut window = 0usize;
    let mut window_end: Option<Instant> = None;

    let mut commitments_read = 0usize;
    let mut gross_value = Decimal::ZERO;
    let mut deal_count = 0usize;
    let mut legs_written = 0usize;
    let mut cleared_total = Decimal::ZERO;

    for commitment in commitments {
        let now = Instant::now();
        if window_end.map_or(true, |end| now > end) {
            let mtv = schedule.threshold_for_window(window);
            if mtv != matcher.min_amount() {
                matcher.set_min_amount(mtv);
            }
            info!("turn {}: window {} starts with MTV {}", turn_id, window, mtv);
            window += 1;
            window_end = Some(now + schedule.timespan);
        }

        let (u, v, amount) = commitment.to_bond();
        matcher.register_bond(u, v, amount);
        commitments_read += 1;
        gross_value += commitment.value.abs();

        for deal in matcher.take_deals() {
            deal_count += 1;
            cleared_total += deal.cleared_total();
            for (from, to) in deal.legs() {
                writer.push_unchecked(Commitment::from_leg(from, to, deal.amount()));
                legs_written += 1;
            }
        }
        writer.flush_if_full()?;
    }
    writer.flush()?;

    let report = TurnReport {
        turn_id,
        started_at,
        finished_at: Utc::now(),
        commitments_read,
        gross_value,
        deal_count,
        legs_written,
        cleared_total,
    };
    info!(
        "turn {}: {} deals, {} legs, {} cleared",
        turn_id, report.deal_count, report.legs_written, report.cleared_total
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn run(commitments: Vec<Commitment>) -> (TurnReport, Vec<Commitment>) {
        let mut writer = BatchWriter::new(crate::turn::writer::VecSink::new());
        let report =
            match_commitments(commitments, &mut writer, &ThresholdSchedule::default()).unwrap();
        let rows = writer.into_sink().rows().to_vec();
        (report, rows)
    }

    #[test]
    fn test_open_chain_clears_nothing() {
        // (1:0)->(2:1)->(3:0)->(4:1) is a chain; no bond closes a cycle.
        let commitments = vec![
            Commitment::new(1, 2, 1, dec!(120)),
            Commitment::new(3, 2, 1, dec!(-150)),
            Commitment::new(3, 4, 1, dec!(999)),
        ];
        let (report, rows) = run(commitments);
        assert_eq!(report.commitments_read, 3);
        assert_eq!(report.deal_count, 0);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_triangle_turn() {
        // recipient 1 buys from issuer 2; recipient 2 buys from issuer 3;
        // recipient 3 buys from issuer 1: three bonds
        //   (1:0)->(2:1), (2:0)->(3:1), (3:0)->(1:1)
        // plus the issuers' own slots complete the ring through negative
        // commitments (account sells out of its slot).
        let commitments = vec![
            Commitment::new(1, 2, 1, dec!(120)),
            Commitment::new(2, 2, 1, dec!(-120)), // 2's slot feeds 2's account
            Commitment::new(2, 3, 1, dec!(150)),
            Commitment::new(3, 3, 1, dec!(-150)),
            Commitment::new(3, 1, 1, dec!(250)),
            Commitment::new(1, 1, 1, dec!(-250)),
        ];
        let (report, rows) = run(commitments);

        assert_eq!(report.deal_count, 1);
        assert_eq!(report.legs_written, 6);
        assert_eq!(rows.len(), 6);
        assert_eq!(report.cleared_total, dec!(720)); // 6 legs * 120

        // Every leg cleared exactly the bottleneck.
        for row in &rows {
            assert_eq!(row.value.abs(), dec!(120));
        }

        // Matched legs decrement the original commitments: re-feeding the
        // originals minus the matched values must leave no cycle.
        let gross: Decimal = rows.iter().map(|r| r.value.abs()).sum();
        assert_eq!(gross, dec!(720));
        assert_relative_eq!(
            report.clearing_ratio(),
            720.0 / 1040.0,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_below_mtv_commitments_are_void() {
        let commitments = vec![
            Commitment::new(1, 2, 1, dec!(0.001)),
            Commitment::new(2, 1, 1, dec!(-0.001)),
        ];
        let (report, rows) = run(commitments);
        assert_eq!(report.deal_count, 0);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_escalated_schedule_filters_small_bonds() {
        // MTV 10 from the first window on: the 5-valued pair can not clear.
        let schedule = ThresholdSchedule::new(vec![3], Duration::from_secs(3600));
        let commitments = vec![
            Commitment::new(1, 2, 1, dec!(5)),
            Commitment::new(1, 2, 1, dec!(-5)),
            Commitment::new(3, 4, 1, dec!(40)),
            Commitment::new(3, 4, 1, dec!(-40)),
        ];
        let mut writer = BatchWriter::new(crate::turn::writer::VecSink::new());
        let report = match_commitments(commitments, &mut writer, &schedule).unwrap();

        assert_eq!(report.deal_count, 1);
        assert_eq!(report.cleared_total, dec!(80)); // 2 legs * 40
    }

    #[test]
    fn test_empty_stream() {
        let (report, rows) = run(Vec::new());
        assert_eq!(report.commitments_read, 0);
        assert_eq!(report.deal_count, 0);
        assert_eq!(report.clearing_ratio(), 0.0);
        assert!(rows.is_empty());
    }
}
