use mdedit_core::{
    EditKind, EditorConfig, EditorSession, HistoryManager, HistoryOperation, Motion, Position,
    RecordOutcome, ReplayDirection,
};
use pretty_assertions::assert_eq;
use std::time::{Duration, Instant};

#[test]
fn test_insert_undo_redo_restores_text_and_cursor() {
    let mut session = EditorSession::from_text("ab", EditorConfig::default());
    session.set_cursor(Position::new(0, 1), false);

    session.insert_text("c");
    assert_eq!(session.text(), "acb");
    assert_eq!(session.cursor_position(), Position::new(0, 2));

    assert!(session.undo());
    assert_eq!(session.text(), "ab");
    assert_eq!(session.cursor_position(), Position::new(0, 1));

    assert!(session.redo());
    assert_eq!(session.text(), "acb");
    assert_eq!(session.cursor_position(), Position::new(0, 2));
}

#[test]
fn test_three_quick_inserts_make_one_entry() {
    let mut session = EditorSession::default();
    let t0 = Instant::now();
    session.insert_text_at_time("a", t0);
    session.insert_text_at_time("b", t0 + Duration::from_millis(100));
    session.insert_text_at_time("c", t0 + Duration::from_millis(200));
    assert_eq!(session.history().undo_depth(), 1);
    assert_eq!(session.history().peek_undo().map(|op| op.text.as_str()), Some("abc"));
}

#[test]
fn test_three_slow_inserts_make_three_entries() {
    let mut session = EditorSession::default();
    let t0 = Instant::now();
    session.insert_text_at_time("a", t0);
    session.insert_text_at_time("b", t0 + Duration::from_millis(400));
    session.insert_text_at_time("c", t0 + Duration::from_millis(800));
    assert_eq!(session.history().undo_depth(), 3);

    session.undo();
    assert_eq!(session.text(), "ab");
}

#[test]
fn test_backspace_chain_coalesces() {
    let mut session = EditorSession::from_text("hello", EditorConfig::default());
    session.move_cursor(Motion::LineEnd, false);
    let t0 = Instant::now();
    for i in 0..3 {
        session.delete_backward_at_time(t0 + Duration::from_millis(50 * i));
    }
    assert_eq!(session.text(), "he");
    assert_eq!(session.history().undo_depth(), 1);
    let op = session.history().peek_undo().unwrap();
    assert_eq!(op.kind, EditKind::Delete);
    assert_eq!(op.text, "llo");
    assert_eq!(op.column, 2);

    session.undo();
    assert_eq!(session.text(), "hello");
    assert_eq!(session.cursor_position(), Position::new(0, 5));
}

#[test]
fn test_new_edit_after_undo_discards_redo() {
    let mut session = EditorSession::default();
    let t0 = Instant::now();
    session.insert_text_at_time("one", t0);
    session.insert_text_at_time(" two", t0 + Duration::from_secs(1));
    session.undo();
    assert!(session.history().can_redo());

    session.insert_text_at_time("!", t0 + Duration::from_secs(2));
    assert!(!session.history().can_redo());
    assert_eq!(session.text(), "one!");
    assert!(!session.redo());
}

#[test]
fn test_multi_line_paste_is_its_own_step() {
    let mut session = EditorSession::default();
    let t0 = Instant::now();
    session.insert_text_at_time("a", t0);
    session.insert_text_at_time("\nb\nc", t0 + Duration::from_millis(10));
    session.insert_text_at_time("d", t0 + Duration::from_millis(20));
    assert_eq!(session.history().undo_depth(), 3);

    session.undo();
    session.undo();
    assert_eq!(session.text(), "a");
    assert_eq!(session.cursor_position(), Position::new(0, 1));
}

#[test]
fn test_undo_on_empty_history_is_noop() {
    let mut session = EditorSession::from_text("x", EditorConfig::default());
    let version = session.version();
    assert!(!session.undo());
    assert!(!session.redo());
    assert_eq!(session.version(), version);
}

#[test]
fn test_history_stays_bounded() {
    let config = EditorConfig::default()
        .with_history_max_size(3)
        .with_coalesce_window(Duration::ZERO);
    let mut session = EditorSession::new(config);
    let t0 = Instant::now();
    for i in 0..6 {
        session.insert_text_at_time("x", t0 + Duration::from_secs(i));
    }
    assert_eq!(session.history().undo_depth(), 3);
    while session.undo() {}
    assert_eq!(session.text(), "xxx");
}

#[test]
fn test_replay_guard_reports_direction() {
    let mut history = HistoryManager::default();
    let at = Instant::now();
    let op = HistoryOperation::insert(
        Position::new(0, 0),
        "hi",
        Position::new(0, 0),
        Position::new(0, 2),
        at,
    );
    assert_eq!(history.record(op.clone()), RecordOutcome::Pushed);

    let replay = history.undo().unwrap();
    assert_eq!(replay.direction(), ReplayDirection::Undo);
    assert_eq!(replay.operation(), &op);
    drop(replay);
    assert_eq!((history.undo_depth(), history.redo_depth()), (0, 1));

    let replay = history.redo().unwrap();
    assert_eq!(replay.direction(), ReplayDirection::Redo);
    assert_eq!(replay.end(), Position::new(0, 2));
}
