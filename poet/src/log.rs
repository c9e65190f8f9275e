//! Ring-buffered text log: one snapshot per recompute, flushed in batches
//! of `buffer_depth` records to fixed-width columns.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::controller::ControllerState;
use crate::kalman::FilterState;
use crate::math::{self, Real};

const COLUMN_WIDTH: usize = 16;
const HEADER: [&str; 14] = [
    "TAG",
    "ACTUAL_RATE",
    "X_HAT_MINUS",
    "X_HAT",
    "P_MINUS",
    "H",
    "K",
    "P",
    "SPEEDUP",
    "ERROR",
    "WORKLOAD",
    "LOWER_ID",
    "UPPER_ID",
    "LOW_STATE_ITERS",
];

/// One snapshot of controller state at a recompute boundary.
#[derive(Clone, Copy, Debug)]
pub struct LogRecord {
    /// Host-supplied iteration tag at the time of the snapshot.
    pub tag: u64,
    /// Observed rate that triggered this recompute.
    pub act_rate: Real,
    /// Kalman filter state after the update.
    pub filter: FilterState,
    /// Speedup the controller just produced.
    pub speedup: Real,
    /// Rate error used to produce it.
    pub error: Real,
    /// Estimated base workload.
    pub workload: Real,
    /// Chosen lower-bound configuration, if any.
    pub lower_id: Option<u32>,
    /// Chosen upper-bound configuration, if any.
    pub upper_id: Option<u32>,
    /// Iterations owed to `lower_id` at the time of the snapshot.
    pub low_state_iters: u32,
}

impl LogRecord {
    /// Build a record from the controller's two state structs plus the
    /// translator's current split.
    pub fn snapshot(
        tag: u64,
        act_rate: Real,
        filter: FilterState,
        controller: &ControllerState,
        workload: Real,
        lower_id: Option<u32>,
        upper_id: Option<u32>,
        low_state_iters: u32,
    ) -> Self {
        LogRecord {
            tag,
            act_rate,
            filter,
            speedup: controller.u,
            error: controller.e,
            workload,
            lower_id,
            upper_id,
            low_state_iters,
        }
    }

    fn to_line(self) -> String {
        let id_or_sentinel = |id: Option<u32>| id.map(|v| v as i64).unwrap_or(-1);
        let cols = [
            col(self.tag),
            col(math::to_f64(self.act_rate)),
            col(math::to_f64(self.filter.x_hat_minus)),
            col(math::to_f64(self.filter.x_hat)),
            col(math::to_f64(self.filter.p_minus)),
            col(math::to_f64(self.filter.h)),
            col(math::to_f64(self.filter.k)),
            col(math::to_f64(self.filter.p)),
            col(math::to_f64(self.speedup)),
            col(math::to_f64(self.error)),
            col(math::to_f64(self.workload)),
            col(id_or_sentinel(self.lower_id)),
            col(id_or_sentinel(self.upper_id)),
            col(self.low_state_iters),
        ];
        cols.join("")
    }
}

fn col<T: std::fmt::Display>(v: T) -> String {
    format!("{:<width$}", format!("{v}"), width = COLUMN_WIDTH)
}

/// Ring buffer of `buffer_depth` records, flushed to `writer` once filled.
pub struct LogRing {
    writer: File,
    slots: Vec<Option<LogRecord>>,
    period: u32,
    depth: u32,
}

impl LogRing {
    /// Open (truncating) the log file at `path` and write the header line.
    pub fn open(path: &Path, period: u32, depth: u32) -> io::Result<Self> {
        let mut writer = File::create(path)?;
        writeln!(writer, "{}", HEADER.iter().map(|h| col(h)).collect::<String>())?;
        Ok(LogRing {
            writer,
            slots: vec![None; depth.max(1) as usize],
            period: period.max(1),
            depth: depth.max(1),
        })
    }

    /// Insert a record at its ring slot; flush the whole ring if this fills it.
    pub fn push(&mut self, record: LogRecord) -> io::Result<()> {
        let index = ((record.tag / self.period as u64) % self.depth as u64) as usize;
        self.slots[index] = Some(record);
        if index == self.depth as usize - 1 {
            self.flush()?;
        }
        Ok(())
    }

    /// Write out every filled slot, in order, and clear them.
    pub fn flush(&mut self) -> io::Result<()> {
        for slot in self.slots.iter_mut() {
            if let Some(record) = slot.take() {
                writeln!(self.writer, "{}", record.to_line())?;
            }
        }
        self.writer.flush()
    }
}
