mod common;

use common::ScriptedPort;
use illusio_core::{InputEvent, InputEvent::*, Stimulus};
use illusio_experiment::{
    AdjustmentDesign, Design, ExperimentConfig, ExperimentSession, ForcedChoiceDesign,
    SessionError, SessionOutcome, StorageError,
};
use illusio_timing::ManualTimer;
use std::fs;
use std::path::Path;

fn adjustment_config(dir: &Path) -> ExperimentConfig {
    ExperimentConfig {
        output_dir: dir.to_path_buf(),
        seed: Some(11),
        design: Design::Adjustment(AdjustmentDesign {
            angles: vec![40, 70],
            repetitions: 2,
            reference_length: 300,
            start_length: 300,
            step_size: 10,
        }),
        ..ExperimentConfig::muller_lyer()
    }
}

/// Instruction screen, then one `[fixation poll, response]` pair per trial.
fn script(trials: &[Vec<InputEvent>]) -> Vec<Vec<InputEvent>> {
    let mut script = vec![vec![Begin]];
    for response in trials {
        script.push(vec![]);
        script.push(response.clone());
    }
    script
}

fn read_rows(path: &Path) -> (String, Vec<String>) {
    let text = fs::read_to_string(path).unwrap();
    let mut lines = text.lines().map(str::to_string);
    let header = lines.next().unwrap();
    (header, lines.collect())
}

#[test]
fn full_session_records_every_planned_trial() {
    let dir = tempfile::tempdir().unwrap();
    let timer = ManualTimer::new();
    let port = ScriptedPort::new(&timer, script(&vec![vec![Decrease, Confirm]; 4]));

    let report = ExperimentSession::new(adjustment_config(dir.path()), "s01", port, timer)
        .run()
        .unwrap();

    assert_eq!(report.outcome, SessionOutcome::Completed);
    assert_eq!(report.planned, 4);
    assert_eq!(report.recorded, 4);

    let (header, rows) = read_rows(&report.output_path);
    assert_eq!(
        header,
        "subject_id,trial_index,angle,ref_length,initial_test_length,final_test_length,adjustment_steps,rt"
    );
    assert_eq!(rows.len(), 4);

    let mut angles: Vec<i32> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields[0], "s01");
        assert_eq!(fields[1], (i + 1).to_string());
        assert_eq!(fields[5], "290");
        assert_eq!(fields[6], "1");
        angles.push(fields[2].parse().unwrap());
    }
    angles.sort();
    assert_eq!(angles, vec![40, 40, 70, 70]);
}

#[test]
fn output_file_is_named_after_subject_and_experiment() {
    let dir = tempfile::tempdir().unwrap();
    let timer = ManualTimer::new();
    let port = ScriptedPort::new(&timer, vec![vec![Cancel]]);
    let session = ExperimentSession::new(adjustment_config(dir.path()), "s/07", port, timer);
    let name = session
        .session()
        .output_path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert!(name.starts_with("s_07_muller_lyer_"), "{name}");
    assert!(name.ends_with(".csv"));
    session.run().unwrap();
}

#[test]
fn cancel_after_m_trials_leaves_m_rows_and_one_header() {
    for m in 0..4 {
        let dir = tempfile::tempdir().unwrap();
        let timer = ManualTimer::new();
        let mut responses = vec![vec![Confirm]; m];
        responses.push(vec![Increase, Cancel]);
        let port = ScriptedPort::new(&timer, script(&responses));

        let report = ExperimentSession::new(adjustment_config(dir.path()), "s01", port, timer)
            .run()
            .unwrap();

        assert_eq!(report.outcome, SessionOutcome::Cancelled);
        assert_eq!(report.recorded, m);
        let text = fs::read_to_string(&report.output_path).unwrap();
        assert_eq!(text.matches("subject_id").count(), 1);
        assert_eq!(text.lines().count(), m + 1);
    }
}

#[test]
fn quit_on_instruction_screen_writes_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let timer = ManualTimer::new();
    let port = ScriptedPort::new(&timer, vec![vec![], vec![Quit]]);
    let report = ExperimentSession::new(adjustment_config(dir.path()), "s01", port, timer)
        .run()
        .unwrap();
    assert_eq!(report.outcome, SessionOutcome::Cancelled);
    assert_eq!(report.planned, 0);
    let (_, rows) = read_rows(&report.output_path);
    assert!(rows.is_empty());
}

#[test]
fn quit_in_same_cycle_as_choice_keeps_that_trial() {
    let dir = tempfile::tempdir().unwrap();
    let timer = ManualTimer::new();
    let config = ExperimentConfig {
        output_dir: dir.path().to_path_buf(),
        seed: Some(3),
        design: Design::ForcedChoice(ForcedChoiceDesign {
            length_diffs: vec![-20, 20],
            repetitions: 2,
            base_length: 260,
        }),
        ..ExperimentConfig::ponzo()
    };
    let port = ScriptedPort::new(&timer, script(&[vec![ChoiceA], vec![ChoiceB, Quit]]));
    let report = ExperimentSession::new(config, "s02", port, timer).run().unwrap();

    assert_eq!(report.outcome, SessionOutcome::Cancelled);
    assert_eq!(report.recorded, 2);
    let (header, rows) = read_rows(&report.output_path);
    assert!(header.ends_with("correct_answer,response,is_correct,rt"));
    assert_eq!(rows.len(), 2);
    assert!(rows[0].contains(",top,"));
    assert!(rows[1].contains(",bottom,"));
}

#[test]
fn instruction_and_closing_screens_are_shown() {
    let dir = tempfile::tempdir().unwrap();
    let timer = ManualTimer::new();
    let config = adjustment_config(dir.path());
    let closing = config.closing_message.clone();
    let instructions = config.instructions.clone();

    // Confirm also starts the session.
    let mut port = ScriptedPort::new(&timer, {
        let mut s = script(&vec![vec![Confirm]; 4]);
        s[0] = vec![Confirm];
        s
    });
    let report = ExperimentSession::new(config, "s01", &mut port, timer.clone())
        .run()
        .unwrap();
    assert_eq!(report.outcome, SessionOutcome::Completed);

    assert!(matches!(&port.drawn[0], Stimulus::Text { content, .. } if *content == instructions));
    assert!(matches!(port.drawn.last(), Some(Stimulus::Text { content, .. }) if *content == closing));
    assert!(port.released);
}

#[test]
fn unwritable_destination_aborts_before_any_trial() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "").unwrap();

    let timer = ManualTimer::new();
    let port = ScriptedPort::new(&timer, script(&[vec![Confirm]]));
    let err = ExperimentSession::new(adjustment_config(&blocker), "s01", port, timer)
        .run()
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Storage(StorageError::CreateDir { .. })
    ));
}

#[test]
fn presentation_failure_is_fatal_but_keeps_recorded_trials() {
    let dir = tempfile::tempdir().unwrap();
    let timer = ManualTimer::new();
    let mut port = ScriptedPort::new(&timer, script(&vec![vec![Confirm]; 4]));
    // Draws: instructions, fixation, stimulus, fixation, stimulus, fixation <- fails
    port.fail_on_draw = Some(5);
    let config = adjustment_config(dir.path());
    let session = ExperimentSession::new(config, "s01", port, timer);
    let path = session.session().output_path.clone();

    let err = session.run().unwrap_err();
    assert!(matches!(err, SessionError::Presentation(_)));
    let (_, rows) = read_rows(&path);
    assert_eq!(rows.len(), 2);
}

#[test]
fn same_seed_same_condition_order() {
    let order = |dir: &Path| {
        let timer = ManualTimer::new();
        let port = ScriptedPort::new(&timer, script(&vec![vec![Confirm]; 4]));
        let report = ExperimentSession::new(adjustment_config(dir), "s01", port, timer)
            .run()
            .unwrap();
        let (_, rows) = read_rows(&report.output_path);
        rows.iter()
            .map(|r| r.split(',').nth(2).unwrap().to_string())
            .collect::<Vec<_>>()
    };
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    assert_eq!(order(a.path()), order(b.path()));
}

#[test]
fn fixation_is_drawn_before_every_stimulus() {
    let dir = tempfile::tempdir().unwrap();
    let timer = ManualTimer::new();
    let mut port = ScriptedPort::new(&timer, script(&vec![vec![Confirm]; 4]));
    ExperimentSession::new(adjustment_config(dir.path()), "s01", &mut port, timer)
        .run()
        .unwrap();

    let trial_frames: Vec<&Stimulus> = port
        .drawn
        .iter()
        .filter(|s| !s.is_text())
        .collect();
    assert_eq!(trial_frames.len(), 8);
    for pair in trial_frames.chunks(2) {
        assert_eq!(pair[0], &Stimulus::Fixation);
        assert!(matches!(pair[1], Stimulus::MullerLyer { .. }));
    }
}

#[test]
fn port_is_released_after_cancel() {
    let dir = tempfile::tempdir().unwrap();
    let timer = ManualTimer::new();
    let mut port = ScriptedPort::new(&timer, script(&[vec![Cancel]]));
    ExperimentSession::new(adjustment_config(dir.path()), "s01", &mut port, timer)
        .run()
        .unwrap();
    assert!(port.released);
}
