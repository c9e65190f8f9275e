//! Host-side helper: parses the text control-state config file POET reads
//! its `(id, speedup, cost)` table from.
//!
//! Format: one record per non-comment line, whitespace-separated
//! `id speedup cost`. Lines starting with `#` are comments. Ids must appear
//! as the consecutive sequence `0, 1, 2, ...`; anything else is a syntax
//! error, since the core indexes states by id directly.

use std::fs;
use std::path::Path;

use poet::ControlState;
use thiserror::Error;

/// Failures parsing a control-state config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed to open.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A non-comment line did not have exactly three whitespace-separated fields.
    #[error("syntax error on line {line}: expected `id speedup cost`")]
    Syntax {
        /// 1-based line number.
        line: u32,
    },

    /// A field that should have been numeric wasn't.
    #[error("malformed number on line {line}: {field}")]
    MalformedNumber {
        /// 1-based line number.
        line: u32,
        /// The offending field's raw text.
        field: String,
    },

    /// Ids were not the consecutive sequence `0, 1, 2, ...`.
    #[error("states are missing or out of order on line {line}: expected id {expected}, found {found}")]
    OutOfOrderIds {
        /// 1-based line number.
        line: u32,
        /// The id that should have appeared next.
        expected: u32,
        /// The id actually found.
        found: u32,
    },

    /// The file contained no non-comment lines.
    #[error("no control states found in {path}")]
    Empty {
        /// Path that was parsed.
        path: String,
    },
}

/// Parse a control-state config file into the `Vec<ControlState>` POET's
/// `init` expects.
pub fn parse_control_states(path: &Path) -> Result<Vec<ControlState>, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut states = Vec::new();
    let mut expected_id: u32 = 0;

    for (idx, raw_line) in contents.lines().enumerate() {
        let line_no = (idx + 1) as u32;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(ConfigError::Syntax { line: line_no });
        }

        let id: u32 = fields[0].parse().map_err(|_| ConfigError::MalformedNumber {
            line: line_no,
            field: fields[0].to_string(),
        })?;
        let speedup: f64 = fields[1].parse().map_err(|_| ConfigError::MalformedNumber {
            line: line_no,
            field: fields[1].to_string(),
        })?;
        let cost: f64 = fields[2].parse().map_err(|_| ConfigError::MalformedNumber {
            line: line_no,
            field: fields[2].to_string(),
        })?;

        if id != expected_id {
            return Err(ConfigError::OutOfOrderIds {
                line: line_no,
                expected: expected_id,
                found: id,
            });
        }
        expected_id += 1;

        states.push(ControlState {
            id,
            speedup: poet::math::konst(speedup),
            cost: poet::math::konst(cost),
        });
    }

    if states.is_empty() {
        return Err(ConfigError::Empty {
            path: path.display().to_string(),
        });
    }

    Ok(states)
}
