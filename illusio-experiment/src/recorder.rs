use crate::error::StorageError;
use illusio_core::TrialRecord;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Sole writer of a session's CSV file. Every appended row is synced to
/// disk before `append` returns.
#[derive(Debug)]
pub struct SessionRecorder {
    path: PathBuf,
    writer: Option<csv::Writer<File>>,
    rows: usize,
}

impl SessionRecorder {
    /// Creates the file (and any missing parent directory) and writes the
    /// header row. Refuses to overwrite an existing file.
    pub fn open(path: impl AsRef<Path>, columns: &[&str]) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| StorageError::Create {
                path: path.clone(),
                source,
            })?;

        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        let mut recorder = Self {
            path,
            writer: Some(writer),
            rows: 0,
        };
        recorder.write_durably(|w| w.write_record(columns))?;
        info!(path = %recorder.path.display(), "recorder opened");
        Ok(recorder)
    }

    pub fn append(&mut self, record: &TrialRecord) -> Result<(), StorageError> {
        self.write_durably(|w| match record {
            TrialRecord::Adjustment(r) => w.serialize(r),
            TrialRecord::ForcedChoice(r) => w.serialize(r),
        })?;
        self.rows += 1;
        debug!(trial = record.trial_index(), rows = self.rows, "trial persisted");
        Ok(())
    }

    /// Safe to call repeatedly; only the first call does any work.
    pub fn close(&mut self) -> Result<(), StorageError> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        writer.flush().map_err(|source| StorageError::Sync {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), rows = self.rows, "recorder closed");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Data rows written so far, header excluded.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    fn write_durably(
        &mut self,
        write: impl FnOnce(&mut csv::Writer<File>) -> csv::Result<()>,
    ) -> Result<(), StorageError> {
        let path = &self.path;
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| StorageError::Closed { path: path.clone() })?;
        write(writer).map_err(|source| StorageError::Write {
            path: path.clone(),
            source,
        })?;
        writer.flush().map_err(|source| StorageError::Sync {
            path: path.clone(),
            source,
        })?;
        writer
            .get_ref()
            .sync_data()
            .map_err(|source| StorageError::Sync {
                path: path.clone(),
                source,
            })
    }
}

impl Drop for SessionRecorder {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use illusio_core::{AdjustmentRecord, ForcedChoiceRecord, GroundTruth, Label};

    fn adjustment_row(index: usize) -> TrialRecord {
        TrialRecord::Adjustment(AdjustmentRecord {
            subject_id: "s01".into(),
            trial_index: index,
            angle: 40,
            ref_length: 300,
            initial_test_length: 300,
            final_test_length: 290,
            adjustment_steps: 3,
            rt: 1.25,
        })
    }

    #[test]
    fn header_then_rows_in_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        let mut rec = SessionRecorder::open(&path, AdjustmentRecord::COLUMNS).unwrap();
        rec.append(&adjustment_row(1)).unwrap();

        // Durable before close.
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "subject_id,trial_index,angle,ref_length,initial_test_length,\
             final_test_length,adjustment_steps,rt\n\
             s01,1,40,300,300,290,3,1.250000\n"
        );
        rec.close().unwrap();
        assert_eq!(rec.rows(), 1);
    }

    #[test]
    fn header_written_even_without_trials() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        let mut rec = SessionRecorder::open(&path, ForcedChoiceRecord::COLUMNS).unwrap();
        rec.close().unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("subject_id,trial_index,length_diff"));
    }

    #[test]
    fn unscored_correctness_is_blank() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ponzo.csv");
        let mut rec = SessionRecorder::open(&path, ForcedChoiceRecord::COLUMNS).unwrap();
        rec.append(&TrialRecord::ForcedChoice(ForcedChoiceRecord {
            subject_id: "s02".into(),
            trial_index: 1,
            length_diff: 0,
            top_length: 260,
            bottom_length: 260,
            correct_answer: GroundTruth::Equal,
            response: Label::Bottom,
            is_correct: None,
            rt: 0.5,
        }))
        .unwrap();
        rec.append(&TrialRecord::ForcedChoice(ForcedChoiceRecord {
            subject_id: "s02".into(),
            trial_index: 2,
            length_diff: 20,
            top_length: 280,
            bottom_length: 260,
            correct_answer: GroundTruth::Top,
            response: Label::Top,
            is_correct: Some(true),
            rt: 0.75,
        }))
        .unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let rows: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(rows, vec!["s02,1,0,260,260,equal,bottom,,0.500000", "s02,2,20,280,260,top,top,true,0.750000"]);
    }

    #[test]
    fn reaction_times_are_plain_decimals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rt.csv");
        let mut rec = SessionRecorder::open(&path, AdjustmentRecord::COLUMNS).unwrap();
        for (i, rt) in [3e-6, 4e-5, 0.0, 12.5].into_iter().enumerate() {
            let TrialRecord::Adjustment(mut row) = adjustment_row(i + 1) else {
                unreachable!()
            };
            row.rt = rt;
            rec.append(&TrialRecord::Adjustment(row)).unwrap();
        }
        let text = fs::read_to_string(&path).unwrap();
        let rts: Vec<&str> = text
            .lines()
            .skip(1)
            .map(|line| line.rsplit(',').next().unwrap())
            .collect();
        assert_eq!(rts, vec!["0.000003", "0.000040", "0.000000", "12.500000"]);
    }

    #[test]
    fn close_is_idempotent_and_blocks_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("closed.csv");
        let mut rec = SessionRecorder::open(&path, AdjustmentRecord::COLUMNS).unwrap();
        rec.close().unwrap();
        rec.close().unwrap();
        assert!(!rec.is_open());
        let err = rec.append(&adjustment_row(1)).unwrap_err();
        assert!(matches!(err, StorageError::Closed { .. }));
    }

    #[test]
    fn existing_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taken.csv");
        fs::write(&path, "keep me").unwrap();
        let err = SessionRecorder::open(&path, AdjustmentRecord::COLUMNS).unwrap_err();
        assert!(matches!(err, StorageError::Create { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me");
    }
}
