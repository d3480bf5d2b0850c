//! Entry lifecycle, resume policy, gap reconciliation and bulk edit,
//! exercised against an in-memory database.

use chrono::{DateTime, Duration, TimeZone, Utc};
use tally_core::{
    EditRequest, Entry, EntryDocument, EntryStatus, EntryStore, ErrorKind, GapBoundary, GapSignal,
    GapSignalSource, PauseDraft, PauseReason, ProjectName, ResumeOutcome, SignalSourceError,
    TrackError, Tracker, Transition, reconcile,
};
use tally_db::Database;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
}

fn mins(m: i64) -> DateTime<Utc> {
    t0() + Duration::minutes(m)
}

fn project(name: &str) -> ProjectName {
    ProjectName::new(name).unwrap()
}

fn db() -> Database {
    Database::open_in_memory().expect("open in-memory db")
}

fn active_count(db: &Database) -> usize {
    db.list_entries(&tally_core::EntryFilter::default())
        .expect("list entries")
        .iter()
        .filter(|e| e.status.is_active())
        .count()
}

struct Signals(Vec<GapSignal>);

impl GapSignalSource for Signals {
    fn signals_since(&self, since: DateTime<Utc>) -> Result<Vec<GapSignal>, SignalSourceError> {
        Ok(self.0.iter().copied().filter(|s| s.time > since).collect())
    }
}

struct Broken;

impl GapSignalSource for Broken {
    fn signals_since(&self, _since: DateTime<Utc>) -> Result<Vec<GapSignal>, SignalSourceError> {
        Err(SignalSourceError::Unavailable {
            message: "pmset exited with status 1".to_string(),
        })
    }
}

fn signal(time: DateTime<Utc>, boundary: GapBoundary) -> GapSignal {
    GapSignal { time, boundary }
}

#[test]
fn stop_after_ninety_minutes() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let entry = tracker
        .start(project("work"), None, &[], t0())
        .expect("start");
    let stopped = tracker.stop(&entry.id, mins(90)).expect("stop");

    assert_eq!(stopped.status, EntryStatus::Stopped);
    assert_eq!(stopped.duration(mins(500)), Duration::minutes(90));
}

#[test]
fn pause_and_resume_are_excluded() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let entry = tracker
        .start(project("work"), Some("Review".to_string()), &["code"], t0())
        .expect("start");

    let paused = tracker
        .pause(&entry.id, PauseReason::Manual, mins(10))
        .expect("pause");
    assert!(matches!(paused, Transition::Applied(ref e) if e.status == EntryStatus::Paused));
    assert_eq!(paused.entry().duration(mins(12)), Duration::minutes(10));
    assert_eq!(paused.entry().duration(mins(14)), Duration::minutes(10));

    tracker.resume(&entry.id, mins(15)).expect("resume");
    let stopped = tracker.stop(&entry.id, mins(40)).expect("stop");

    assert_eq!(stopped.duration(mins(60)), Duration::minutes(35));
    assert_eq!(stopped.pauses.len(), 1);
    assert_eq!(stopped.pauses[0].resume_time, Some(mins(15)));
}

#[test]
fn historical_pause_on_running_entry() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let entry = tracker
        .start(project("work"), None, &[], t0())
        .expect("start");

    let pause = tracker
        .insert_historical_pause(&entry.id, mins(60), mins(150))
        .expect("insert pause");
    assert_eq!(pause.reason, PauseReason::Manual);

    let entry = tracker.get(&entry.id).expect("reload");
    assert_eq!(entry.status, EntryStatus::Running);
    assert_eq!(entry.duration(mins(180)), Duration::minutes(90));
}

#[test]
fn historical_pause_is_allowed_on_stopped_entry() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let entry = tracker
        .start(project("work"), None, &[], t0())
        .expect("start");
    tracker.stop(&entry.id, mins(60)).expect("stop");

    tracker
        .insert_historical_pause(&entry.id, mins(20), mins(30))
        .expect("insert pause");
    let entry = tracker.get(&entry.id).expect("reload");
    assert_eq!(entry.status, EntryStatus::Stopped);
    assert_eq!(entry.duration(mins(60)), Duration::minutes(50));
}

#[test]
fn historical_pause_validation() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let entry = tracker
        .start(project("work"), None, &[], t0())
        .expect("start");

    let inverted = tracker
        .insert_historical_pause(&entry.id, mins(30), mins(20))
        .unwrap_err();
    assert_eq!(inverted.kind(), ErrorKind::Validation);

    let before_start = tracker
        .insert_historical_pause(&entry.id, mins(-30), mins(20))
        .unwrap_err();
    assert_eq!(before_start.kind(), ErrorKind::Validation);

    tracker
        .insert_historical_pause(&entry.id, mins(10), mins(20))
        .expect("first pause");
    let overlapping = tracker
        .insert_historical_pause(&entry.id, mins(15), mins(25))
        .unwrap_err();
    assert!(matches!(
        overlapping,
        TrackError::Validation {
            field: "pause_time",
            ..
        }
    ));
    assert_eq!(tracker.get(&entry.id).expect("reload").pauses.len(), 1);
}

#[test]
fn second_start_conflicts() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let first = tracker
        .start(project("work"), None, &[], t0())
        .expect("start");

    let err = tracker
        .start(project("home"), None, &[], mins(5))
        .unwrap_err();
    assert!(matches!(err, TrackError::ActiveEntryExists { ref active } if *active == first.id));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(active_count(&db), 1);
}

#[test]
fn repeated_pause_and_resume_are_unchanged() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let entry = tracker
        .start(project("work"), None, &[], t0())
        .expect("start");

    assert!(matches!(
        tracker.resume(&entry.id, mins(1)).expect("resume running"),
        Transition::Unchanged(_)
    ));
    tracker
        .pause(&entry.id, PauseReason::Manual, mins(5))
        .expect("pause");
    let again = tracker
        .pause(&entry.id, PauseReason::Manual, mins(6))
        .expect("pause paused");
    assert!(matches!(again, Transition::Unchanged(_)));
    assert_eq!(again.entry().pauses.len(), 1);
}

#[test]
fn transitions_on_stopped_entry_conflict() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let entry = tracker
        .start(project("work"), None, &[], t0())
        .expect("start");
    tracker.stop(&entry.id, mins(10)).expect("stop");

    for err in [
        tracker
            .pause(&entry.id, PauseReason::Manual, mins(11))
            .unwrap_err(),
        tracker.resume(&entry.id, mins(11)).unwrap_err(),
        tracker.stop(&entry.id, mins(11)).unwrap_err(),
    ] {
        assert!(matches!(
            err,
            TrackError::InvalidTransition {
                status: EntryStatus::Stopped,
                ..
            }
        ));
    }
}

#[test]
fn stop_closes_open_pause() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let entry = tracker
        .start(project("work"), None, &[], t0())
        .expect("start");
    tracker
        .pause(&entry.id, PauseReason::Manual, mins(30))
        .expect("pause");

    let stopped = tracker.stop(&entry.id, mins(45)).expect("stop");
    assert_eq!(stopped.pauses[0].resume_time, Some(mins(45)));
    assert!(stopped.open_pause().is_none());
    assert_eq!(stopped.duration(mins(90)), Duration::minutes(30));
}

#[test]
fn reopen_adds_exactly_one_gap_pause() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let entry = tracker
        .start(project("work"), None, &[], t0())
        .expect("start");
    tracker
        .insert_historical_pause(&entry.id, mins(10), mins(20))
        .expect("pause");
    tracker.stop(&entry.id, mins(60)).expect("stop");

    let (reopened, gap) = tracker.reopen(&entry.id, mins(100)).expect("reopen");

    assert_eq!(reopened.status, EntryStatus::Running);
    assert_eq!(reopened.end_time, None);
    assert_eq!(reopened.pauses.len(), 2);
    assert_eq!(gap.pause_time, mins(60));
    assert_eq!(gap.resume_time, Some(mins(100)));
    assert_eq!(gap.reason, PauseReason::Manual);
    assert_eq!(reopened.duration(mins(130)), Duration::minutes(80));
}

#[test]
fn reopen_rejects_time_before_end() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let entry = tracker
        .start(project("work"), None, &[], t0())
        .expect("start");
    tracker.stop(&entry.id, mins(60)).expect("stop");

    let err = tracker.reopen(&entry.id, mins(30)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(
        tracker.get(&entry.id).expect("reload").status,
        EntryStatus::Stopped
    );
}

#[test]
fn reopen_conflicts_with_another_active_entry() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let old = tracker
        .start(project("work"), None, &[], t0())
        .expect("start");
    tracker.stop(&old.id, mins(10)).expect("stop");
    tracker
        .start(project("home"), None, &[], mins(20))
        .expect("start second");

    let err = tracker.reopen(&old.id, mins(30)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(tracker.get(&old.id).expect("reload").pauses.is_empty());
    assert_eq!(active_count(&db), 1);
}

#[test]
fn resume_without_project_resumes_paused_entry() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let entry = tracker
        .start(project("work"), None, &[], t0())
        .expect("start");
    tracker
        .pause(&entry.id, PauseReason::Manual, mins(10))
        .expect("pause");

    let mut never = |_: &Entry, _: DateTime<Utc>| -> bool { panic!("no prompt expected") };
    let resumed = tracker
        .resolve_resume(None, mins(20), &mut never)
        .expect("resume");
    assert!(resumed.stopped.is_none());
    assert!(matches!(resumed.outcome, ResumeOutcome::Resumed(ref e) if e.status == EntryStatus::Running));

    let again = tracker
        .resolve_resume(None, mins(25), &mut never)
        .expect("resume running");
    assert!(matches!(again.outcome, ResumeOutcome::AlreadyRunning(_)));
}

#[test]
fn resume_without_project_reopens_after_confirmation() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let entry = tracker
        .start(project("work"), None, &[], t0())
        .expect("start");
    tracker.stop(&entry.id, mins(30)).expect("stop");

    let mut asked = Vec::new();
    let mut confirm = |e: &Entry, at: DateTime<Utc>| -> bool {
        asked.push((e.id.clone(), at));
        true
    };
    let resumed = tracker
        .resolve_resume(None, mins(45), &mut confirm)
        .expect("resume");

    assert_eq!(asked, vec![(entry.id.clone(), mins(45))]);
    match resumed.outcome {
        ResumeOutcome::Reopened { entry: reopened, gap } => {
            assert_eq!(reopened.id, entry.id);
            assert_eq!(gap.pause_time, mins(30));
            assert_eq!(gap.resume_time, Some(mins(45)));
        }
        other => panic!("expected reopen, got {other:?}"),
    }
}

#[test]
fn declined_reopen_changes_nothing() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let entry = tracker
        .start(project("work"), None, &[], t0())
        .expect("start");
    let stopped = tracker.stop(&entry.id, mins(30)).expect("stop");

    let mut decline = |_: &Entry, _: DateTime<Utc>| -> bool { false };
    let resumed = tracker
        .resolve_resume(None, mins(45), &mut decline)
        .expect("resume");

    assert_eq!(resumed.outcome, ResumeOutcome::Declined(stopped.clone()));
    assert_eq!(tracker.get(&entry.id).expect("reload"), stopped);
}

#[test]
fn resume_with_nothing_tracked() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let mut never = |_: &Entry, _: DateTime<Utc>| -> bool { panic!("no prompt expected") };

    let resumed = tracker
        .resolve_resume(None, t0(), &mut never)
        .expect("resume");
    assert_eq!(resumed.outcome, ResumeOutcome::NothingToResume);
}

#[test]
fn resume_other_project_stops_active_and_clones() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let personal = tracker
        .start(
            project("personal"),
            Some("Reading".to_string()),
            &["books", "evening"],
            t0(),
        )
        .expect("start personal");
    let personal = tracker.stop(&personal.id, mins(60)).expect("stop personal");
    let work = tracker
        .start(project("work"), None, &[], mins(120))
        .expect("start work");

    let mut never = |_: &Entry, _: DateTime<Utc>| -> bool { panic!("no prompt expected") };
    let resumed = tracker
        .resolve_resume(Some(&project("personal")), mins(180), &mut never)
        .expect("resume personal");

    let stopped = resumed.stopped.expect("work entry stopped");
    assert_eq!(stopped.id, work.id);
    assert_eq!(stopped.end_time, Some(mins(180)));

    let ResumeOutcome::Cloned { entry, source } = resumed.outcome else {
        panic!("expected clone, got {:?}", resumed.outcome);
    };
    assert_eq!(source, personal.id);
    assert_ne!(entry.id, personal.id);
    assert_eq!(entry.project, project("personal"));
    assert_eq!(entry.title.as_deref(), Some("Reading"));
    assert_eq!(entry.tags, personal.tags);
    assert_eq!(entry.start_time, mins(180));
    assert_eq!(entry.status, EntryStatus::Running);

    // Source history is untouched.
    assert_eq!(tracker.get(&personal.id).expect("reload"), personal);
    assert_eq!(active_count(&db), 1);
}

#[test]
fn resume_same_project_reopens_last_entry() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let work = tracker
        .start(project("work"), None, &[], t0())
        .expect("start");

    let mut confirm = |_: &Entry, _: DateTime<Utc>| -> bool { true };
    let resumed = tracker
        .resolve_resume(Some(&project("work")), mins(30), &mut confirm)
        .expect("resume work");

    // The active entry is stopped first, then reopened with a zero-length gap.
    assert_eq!(resumed.stopped.map(|e| e.id), Some(work.id.clone()));
    let ResumeOutcome::Reopened { entry, gap } = resumed.outcome else {
        panic!("expected reopen, got {:?}", resumed.outcome);
    };
    assert_eq!(entry.id, work.id);
    assert_eq!(gap.pause_time, mins(30));
    assert_eq!(gap.resume_time, Some(mins(30)));
    assert_eq!(entry.duration(mins(40)), Duration::minutes(40));
}

#[test]
fn resume_unknown_project_is_not_found() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    tracker
        .start(project("work"), None, &[], t0())
        .expect("start");

    let mut never = |_: &Entry, _: DateTime<Utc>| -> bool { panic!("no prompt expected") };
    let err = tracker
        .resolve_resume(Some(&project("garden")), mins(10), &mut never)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn reconcile_skips_gaps_already_accounted_for() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let entry = tracker
        .start(project("work"), None, &[], t0())
        .expect("start");
    // Last closed pause ends at T = t0 + 60m.
    tracker
        .insert_historical_pause(&entry.id, mins(40), mins(60))
        .expect("pause");

    let source = Signals(vec![
        signal(mins(55), GapBoundary::SystemSleep),
        signal(mins(58), GapBoundary::SystemWake),
        signal(mins(70), GapBoundary::SystemSleep),
        signal(mins(73), GapBoundary::SystemWake),
    ]);
    let result = reconcile(&mut db, &source).expect("reconcile");

    assert!(result.warning.is_none());
    assert_eq!(result.created.len(), 1);
    let pause = &result.created[0];
    assert_eq!(pause.pause_time, mins(70));
    assert_eq!(pause.resume_time, Some(mins(73)));
    assert_eq!(pause.reason, PauseReason::SystemSleep);

    // A second pass finds nothing new.
    let again = reconcile(&mut db, &source).expect("reconcile again");
    assert!(again.created.is_empty());
    assert_eq!(db.list_pauses(&entry.id).expect("pauses").len(), 2);
}

#[test]
fn reconcile_records_sleep_straddling_a_manual_pause() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let entry = tracker
        .start(project("work"), None, &[], t0())
        .expect("start");
    tracker
        .insert_historical_pause(&entry.id, mins(60), mins(70))
        .expect("pause");

    let source = Signals(vec![
        signal(mins(65), GapBoundary::SystemSleep),
        signal(mins(120), GapBoundary::SystemWake),
    ]);
    let result = reconcile(&mut db, &source).expect("reconcile");

    assert_eq!(result.created.len(), 1);
    let pause = &result.created[0];
    assert_eq!(pause.pause_time, mins(70));
    assert_eq!(pause.resume_time, Some(mins(120)));
    assert_eq!(pause.reason, PauseReason::SystemSleep);

    let entry = db.entry(&entry.id).expect("load").expect("entry exists");
    assert_eq!(entry.pauses.len(), 2);
    assert_eq!(entry.duration(mins(150)), Duration::minutes(90));

    let again = reconcile(&mut db, &source).expect("reconcile again");
    assert!(again.created.is_empty());
}

#[test]
fn reconcile_classifies_and_filters_noise() {
    let mut db = db();
    let entry = Tracker::new(&mut db)
        .start(project("work"), None, &[], t0())
        .expect("start");

    let source = Signals(vec![
        // Display flicker under a minute.
        signal(mins(5), GapBoundary::DisplayOff),
        signal(mins(5) + Duration::seconds(40), GapBoundary::DisplayOn),
        // Display off, then the machine sleeps: System wins.
        signal(mins(20), GapBoundary::DisplayOff),
        signal(mins(22), GapBoundary::SystemSleep),
        signal(mins(50), GapBoundary::SystemWake),
        // Plain display-off.
        signal(mins(80), GapBoundary::DisplayOff),
        signal(mins(85), GapBoundary::DisplayOn),
    ]);
    let result = reconcile(&mut db, &source).expect("reconcile");

    let spans: Vec<_> = result
        .created
        .iter()
        .map(|p| (p.pause_time, p.resume_time, p.reason))
        .collect();
    assert_eq!(
        spans,
        vec![
            (mins(20), Some(mins(50)), PauseReason::SystemSleep),
            (mins(80), Some(mins(85)), PauseReason::DisplayOff),
        ]
    );
    let entry = db.entry(&entry.id).expect("load").expect("entry exists");
    assert_eq!(entry.duration(mins(100)), Duration::minutes(65));
}

#[test]
fn reconcile_without_active_entry_does_nothing() {
    let mut db = db();
    let source = Signals(vec![
        signal(mins(5), GapBoundary::SystemSleep),
        signal(mins(50), GapBoundary::SystemWake),
    ]);
    let result = reconcile(&mut db, &source).expect("reconcile");
    assert!(result.created.is_empty());
}

#[test]
fn reconcile_degrades_when_source_fails() {
    let mut db = db();
    let entry = Tracker::new(&mut db)
        .start(project("work"), None, &[], t0())
        .expect("start");

    let result = reconcile(&mut db, &Broken).expect("reconcile");
    assert!(result.created.is_empty());
    assert!(matches!(
        result.warning,
        Some(SignalSourceError::Unavailable { .. })
    ));
    assert!(db.list_pauses(&entry.id).expect("pauses").is_empty());
}

fn edit_request(entry: &Entry) -> EditRequest {
    EntryDocument::from(entry)
        .into_request()
        .expect("valid document")
}

#[test]
fn edit_replaces_pauses_by_diff() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let entry = tracker
        .start(project("work"), None, &["a"], t0())
        .expect("start");
    let kept = tracker
        .insert_historical_pause(&entry.id, mins(10), mins(20))
        .expect("pause 1");
    tracker
        .insert_historical_pause(&entry.id, mins(30), mins(40))
        .expect("pause 2");
    let entry = tracker.stop(&entry.id, mins(90)).expect("stop");

    let mut request = edit_request(&entry);
    request.project = project("home");
    request.title = Some("Garden".to_string());
    request.pauses = vec![
        PauseDraft {
            id: Some(kept.id.clone()),
            pause_time: mins(10),
            resume_time: Some(mins(25)),
            reason: PauseReason::Manual,
        },
        PauseDraft {
            id: None,
            pause_time: mins(60),
            resume_time: Some(mins(70)),
            reason: PauseReason::DisplayOff,
        },
    ];
    let edited = tracker.edit(request).expect("edit");

    assert_eq!(edited.project, project("home"));
    assert_eq!(edited.title.as_deref(), Some("Garden"));
    assert_eq!(edited.pauses.len(), 2);
    assert_eq!(edited.pauses[0].id, kept.id);
    assert_eq!(edited.pauses[0].resume_time, Some(mins(25)));
    assert_eq!(edited.pauses[1].reason, PauseReason::DisplayOff);
    assert_eq!(edited.duration(mins(90)), Duration::minutes(65));
}

#[test]
fn rejected_edit_leaves_entry_untouched() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let entry = tracker
        .start(project("work"), None, &[], t0())
        .expect("start");
    tracker
        .insert_historical_pause(&entry.id, mins(10), mins(20))
        .expect("pause");
    let entry = tracker.stop(&entry.id, mins(60)).expect("stop");

    let mut request = edit_request(&entry);
    request.project = project("home");
    request.pauses[0].resume_time = Some(mins(5));
    let err = tracker.edit(request).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(tracker.get(&entry.id).expect("reload"), entry);
}

#[test]
fn edit_cannot_clear_end_of_stopped_entry() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let entry = tracker
        .start(project("work"), None, &[], t0())
        .expect("start");
    let entry = tracker.stop(&entry.id, mins(60)).expect("stop");

    let mut request = edit_request(&entry);
    request.end_time = None;
    let err = tracker.edit(request).unwrap_err();
    assert!(matches!(
        err,
        TrackError::Validation {
            field: "end_time",
            ..
        }
    ));
}

#[test]
fn delete_removes_entry_and_pauses() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let entry = tracker
        .start(project("work"), None, &["a"], t0())
        .expect("start");
    tracker
        .insert_historical_pause(&entry.id, mins(10), mins(20))
        .expect("pause");

    let removed = tracker.delete(&entry.id).expect("delete");
    assert_eq!(removed.id, entry.id);
    assert_eq!(tracker.get(&entry.id).unwrap_err().kind(), ErrorKind::NotFound);
    assert!(db.list_pauses(&entry.id).expect("pauses").is_empty());
}

#[test]
fn deleting_open_pause_is_rejected() {
    let mut db = db();
    let mut tracker = Tracker::new(&mut db);
    let entry = tracker
        .start(project("work"), None, &[], t0())
        .expect("start");
    let paused = tracker
        .pause(&entry.id, PauseReason::Manual, mins(10))
        .expect("pause")
        .into_entry();

    let open = paused.open_pause().expect("open pause").id.clone();
    let err = tracker.delete_pause(&entry.id, &open).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(
        tracker.get(&entry.id).expect("reload").status,
        EntryStatus::Paused
    );
}
