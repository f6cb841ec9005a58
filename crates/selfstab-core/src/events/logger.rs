//! Move Logger
//!
//! Audit log of a run: every move record as one JSON line, in step order.
//! The log file is replaced when a new run opens it.

use selfstab_events::MoveRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// JSONL sink for move records.
pub struct MoveLogger {
    writer: Option<BufWriter<File>>,
    record_count: u64,
}

impl MoveLogger {
    /// Opens `path` for a new run, discarding any earlier log there.
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self {
            writer: Some(BufWriter::new(File::create(path)?)),
            record_count: 0,
        })
    }

    /// A logger that only counts. Used when no `--log` path is given.
    pub fn null() -> Self {
        Self {
            writer: None,
            record_count: 0,
        }
    }

    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Appends one move.
    pub fn log(&mut self, record: &MoveRecord) -> std::io::Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writeln!(writer, "{}", record.to_jsonl()?)?;
        }
        self.record_count += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for MoveLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(error = %e, records = self.record_count, "move log not flushed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::centroid;
    use crate::config::CentroidConfig;
    use crate::setup;
    use crate::systems::Network;
    use selfstab_events::fixtures;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn read_log(path: &Path) -> Vec<MoveRecord> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| MoveRecord::from_jsonl(line).unwrap())
            .collect()
    }

    #[test]
    fn test_log_preserves_step_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("moves.jsonl");
        let moves = fixtures::sample_moves();

        let mut logger = MoveLogger::new(&path).unwrap();
        for record in &moves {
            logger.log(record).unwrap();
        }
        logger.flush().unwrap();

        assert_eq!(logger.record_count(), moves.len() as u64);
        assert_eq!(read_log(&path), moves);
    }

    #[test]
    fn test_new_run_replaces_old_log() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("moves.jsonl");
        let moves = fixtures::sample_moves();

        {
            let mut logger = MoveLogger::new(&path).unwrap();
            for record in &moves {
                logger.log(record).unwrap();
            }
        }
        {
            let mut logger = MoveLogger::new(&path).unwrap();
            logger.log(&moves[2]).unwrap();
        }

        assert_eq!(read_log(&path), vec![moves[2].clone()]);
    }

    #[test]
    fn test_null_logger_counts_moves() {
        let mut logger = MoveLogger::null();
        for record in fixtures::moves_by_rule("rule_1") {
            logger.log(&record).unwrap();
        }
        assert_eq!(logger.record_count(), 2);
        assert!(logger.flush().is_ok());
    }

    #[test]
    fn test_logged_centroid_runs_read_back_exactly() {
        // Random own weights and table entries, so nearly every float is fractional
        let program = Arc::new(centroid::program(&CentroidConfig::default()).unwrap());
        let dir = tempdir().unwrap();

        for seed in 0..10 {
            let path = dir.path().join(format!("run_{}.jsonl", seed));
            let mut network = Network::new(seed);
            setup::random_tree(&mut network, &program, 10).unwrap();

            let mut logger = MoveLogger::new(&path).unwrap();
            let mut moves = Vec::new();
            for record in network.run().take(5_000).map_while(Result::ok) {
                logger.log(&record).unwrap();
                moves.push(record);
            }
            logger.flush().unwrap();

            assert!(!moves.is_empty());
            assert_eq!(read_log(&path), moves, "seed {}", seed);
        }
    }
}
