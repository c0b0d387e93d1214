use crate::core::commitment::Commitment;
use std::io::Write;
use thiserror::Error;

/// Errors arising from flushing matched commitments to storage.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write matched commitments: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage interface for matched commitments.
///
/// The engine does not own persistence; it hands finished batches to
/// whatever implements this trait.
pub trait CommitmentSink {
    /// Persist one batch of matched commitment legs.
    fn write_batch(&mut self, batch: &[Commitment]) -> Result<(), SinkError>;
}

/// Default number of buffered legs before a batch is flushed.
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// Buffers matched commitment legs and flushes them to a sink in bulk.
///
/// Rows accumulate until the buffer exceeds its capacity, then go out as
/// one batch; [`flush`](Self::flush) forces out whatever remains at end of
/// stream.
///
/// # Examples
///
/// ```
/// use barter_engine::core::commitment::Commitment;
/// use barter_engine::turn::writer::{BatchWriter, VecSink};
/// use rust_decimal_macros::dec;
///
/// let mut writer = BatchWriter::with_capacity(VecSink::new(), 2);
/// for i in 1..=5 {
///     writer.push(Commitment::new(i, i + 1, 1, dec!(10))).unwrap();
/// }
/// writer.flush().unwrap();
/// assert_eq!(writer.sink().rows().len(), 5);
/// ```
#[derive(Debug)]
pub struct BatchWriter<S: CommitmentSink> {
    sink: S,
    rows: Vec<Commitment>,
    capacity: usize,
}

impl<S: CommitmentSink> BatchWriter<S> {
    /// Wrap a sink with the [`DEFAULT_BATCH_SIZE`] buffer.
    pub fn new(sink: S) -> Self {
        Self::with_capacity(sink, DEFAULT_BATCH_SIZE)
    }

    /// Wrap a sink with an explicit buffer capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(sink: S, capacity: usize) -> Self {
        assert!(capacity > 0, "batch capacity must be positive");
        Self {
            sink,
            rows: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Buffer one leg, flushing first if the buffer is already full.
    pub fn push(&mut self, row: Commitment) -> Result<(), SinkError> {
        self.rows.push(row);
        if self.rows.len() > self.capacity {
            self.flush()?;
        }
        Ok(())
    }

    /// Buffer one leg without checking the capacity; callers batching a
    /// whole deal call [`flush_if_full`](Self::flush_if_full) once after.
    pub fn push_unchecked(&mut self, row: Commitment) {
        self.rows.push(row);
    }

    /// Flush if the buffer has outgrown its capacity.
    pub fn flush_if_full(&mut self) -> Result<(), SinkError> {
        if self.rows.len() > self.capacity {
            self.flush()?;
        }
        Ok(())
    }

    /// Write out everything buffered. A no-op on an empty buffer.
    pub fn flush(&mut self) -> Result<(), SinkError> {
        if !self.rows.is_empty() {
            self.sink.write_batch(&self.rows)?;
            self.rows.clear();
        }
        Ok(())
    }

    /// Number of legs currently buffered.
    pub fn buffered(&self) -> usize {
        self.rows.len()
    }

    /// Borrow the wrapped sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Unwrap the sink, discarding anything still buffered.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// In-memory sink collecting every row — handy in tests and for callers
/// that post-process the matched set themselves.
#[derive(Debug, Clone, Default)]
pub struct VecSink {
    rows: Vec<Commitment>,
    batches: usize,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows written so far, in write order.
    pub fn rows(&self) -> &[Commitment] {
        &self.rows
    }

    /// Number of batches received.
    pub fn batches(&self) -> usize {
        self.batches
    }
}

impl CommitmentSink for VecSink {
    fn write_batch(&mut self, batch: &[Commitment]) -> Result<(), SinkError> {
        self.rows.extend_from_slice(batch);
        self.batches += 1;
        Ok(())
    }
}

/// Sink writing each matched commitment as one JSON line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> CommitmentSink for JsonLinesSink<W> {
    fn write_batch(&mut self, batch: &[Commitment]) -> Result<(), SinkError> {
        for row in batch {
            serde_json::to_writer(&mut self.out, row)
                .map_err(|e| SinkError::Io(e.into()))?;
            self.out.write_all(b"\n")?;
        }
        self.out.flush()?;
        Ok(())
    }
}
