//! 工具完整流程测试

use hvacad_core::entity::{EntityId, EntityType};
use hvacad_core::parametric::DuctPropsPatch;
use hvacad_core::store::EntityStore;
use hvacad_tools::{Editor, Key, KeyEvent, Modifiers, PointerEvent, ToolKind, ToolOutcome};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn drag(editor: &mut Editor, from: (f64, f64), to: (f64, f64)) -> ToolOutcome {
    editor.pointer_down(PointerEvent::left(from.0, from.1));
    editor.pointer_move(PointerEvent::left(to.0, to.1));
    editor.pointer_up(PointerEvent::left(to.0, to.1))
}

fn click(editor: &mut Editor, at: (f64, f64)) -> ToolOutcome {
    let outcome = editor.pointer_down(PointerEvent::left(at.0, at.1));
    editor.pointer_up(PointerEvent::left(at.0, at.1));
    outcome
}

#[test]
fn test_room_duct_equipment_undo_redo() {
    init_tracing();
    let mut editor = Editor::default();

    editor.set_tool(ToolKind::Room);
    let room = drag(&mut editor, (0.0, 0.0), (240.0, 180.0));
    editor.set_tool(ToolKind::Duct);
    let duct = drag(&mut editor, (24.0, 24.0), (144.0, 24.0));
    editor.set_tool(ToolKind::Equipment);
    let fan = click(&mut editor, (300.0, 300.0));

    let ids: Vec<EntityId> = [room, duct, fan]
        .iter()
        .map(|outcome| outcome.committed_ids()[0])
        .collect();
    assert_eq!(editor.document().store().all_ids(), ids.as_slice());

    assert!(editor.undo());
    assert!(editor.undo());
    assert_eq!(editor.document().store().all_ids(), &ids[..1]);
    assert!(editor.selection().is_empty());

    assert!(editor.redo());
    assert!(editor.redo());
    assert_eq!(editor.document().store().all_ids(), ids.as_slice());
    assert!(!editor.redo());
}

#[test]
fn test_drag_move_is_one_undoable_command() {
    init_tracing();
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::Room);
    let a = drag(&mut editor, (0.0, 0.0), (48.0, 48.0)).committed_ids()[0];
    let b = drag(&mut editor, (96.0, 0.0), (144.0, 48.0)).committed_ids()[0];
    let before = editor.document().store().snapshot();

    editor.set_tool(ToolKind::Select);
    // 框选两个房间
    drag(&mut editor, (-12.0, -12.0), (200.0, 100.0));
    assert_eq!(editor.selection().ids(), &[a, b]);

    editor.pointer_down(PointerEvent::left(10.0, 10.0));
    for step in 1..=5 {
        editor.pointer_move(PointerEvent::left(10.0 + 7.0 * step as f64, 10.0));
    }
    let outcome = editor.pointer_up(PointerEvent::left(45.0, 10.0));
    assert_eq!(outcome, ToolOutcome::Committed(vec![a, b]));

    let store = editor.document().store();
    assert_eq!(store.get(a).unwrap().transform.x, 36.0);
    assert_eq!(store.get(b).unwrap().transform.x, 132.0);
    assert_eq!(editor.document().history().past_len(), 3);

    assert!(editor.undo());
    assert_eq!(editor.document().store().snapshot(), before);
}

#[test]
fn test_switching_tool_mid_drag_reverts() {
    init_tracing();
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::Room);
    drag(&mut editor, (0.0, 0.0), (48.0, 48.0));
    let before = editor.document().store().snapshot();

    editor.set_tool(ToolKind::Select);
    editor.pointer_down(PointerEvent::left(5.0, 5.0));
    editor.pointer_move(PointerEvent::left(100.0, 100.0));
    editor.set_tool(ToolKind::Duct);

    assert_eq!(editor.document().store().snapshot(), before);
    assert_eq!(editor.document().history().past_len(), 1);
}

#[test]
fn test_select_keyboard_commands() {
    init_tracing();
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::Note);
    let note = click(&mut editor, (0.0, 0.0)).committed_ids()[0];
    editor.set_tool(ToolKind::Select);
    assert_eq!(editor.selection().ids(), &[note]);

    // Shift+方向键移动 12
    let nudge = editor.key_down(KeyEvent::new(Key::ArrowRight).with_modifiers(Modifiers::SHIFT));
    assert!(nudge.is_committed());
    editor.key_down(KeyEvent::new(Key::ArrowUp));
    let transform = editor.document().get(note).unwrap().transform;
    assert_eq!((transform.x, transform.y), (12.0, -1.0));

    // Ctrl+D 复制并选中副本
    let duplicate = editor.key_down(KeyEvent::new(Key::Char('d')).with_modifiers(Modifiers::CTRL));
    let copy = duplicate.committed_ids()[0];
    assert_ne!(copy, note);
    assert_eq!(editor.selection().ids(), &[copy]);
    let copied = editor.document().get(copy).unwrap().transform;
    assert_eq!((copied.x, copied.y), (36.0, 23.0));

    // Delete 删除选中项，撤销后恢复
    editor.key_down(KeyEvent::new(Key::Delete));
    assert!(editor.document().get(copy).is_none());
    assert!(editor.selection().is_empty());
    assert!(editor.undo());
    assert!(editor.document().get(copy).is_some());
    assert_eq!(editor.document().store().len(), 2);
}

#[test]
fn test_shift_click_toggles_selection() {
    init_tracing();
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::Fitting);
    let first = click(&mut editor, (0.0, 0.0)).committed_ids()[0];
    let second = click(&mut editor, (120.0, 0.0)).committed_ids()[0];
    editor.set_tool(ToolKind::Select);
    assert_eq!(editor.selection().ids(), &[second]);

    let shift_click = |editor: &mut Editor, x: f64| {
        editor.pointer_down(PointerEvent::left(x, 0.0).with_modifiers(Modifiers::SHIFT));
        editor.pointer_up(PointerEvent::left(x, 0.0).with_modifiers(Modifiers::SHIFT));
    };
    shift_click(&mut editor, 0.0);
    assert_eq!(editor.selection().ids(), &[second, first]);
    shift_click(&mut editor, 120.0);
    assert_eq!(editor.selection().ids(), &[first]);
    assert_eq!(editor.document().history().past_len(), 2);
}

#[test]
fn test_duct_tool_invokes_connection_hook() {
    init_tracing();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let mut editor = Editor::default();
    editor
        .document_mut()
        .set_connection_hook(move |id: EntityId, store: &EntityStore| {
            assert_eq!(store.get(id).map(|e| e.entity_type()), Some(EntityType::Duct));
            sink.lock().unwrap().push(id);
        });

    editor.set_tool(ToolKind::Duct);
    assert_eq!(drag(&mut editor, (0.0, 0.0), (3.0, 0.0)), ToolOutcome::Rejected);
    let duct = drag(&mut editor, (0.0, 0.0), (0.0, 240.0)).committed_ids()[0];
    assert_eq!(*seen.lock().unwrap(), vec![duct]);
}

#[tokio::test(start_paused = true)]
async fn test_parametric_edit_after_drawing() {
    init_tracing();
    let mut editor = Editor::default();
    editor.set_tool(ToolKind::Duct);
    let duct = drag(&mut editor, (0.0, 0.0), (240.0, 0.0)).committed_ids()[0];

    let pending = editor
        .document()
        .schedule_duct_change(duct, DuctPropsPatch::airflow(1000.0))
        .unwrap();
    let handle = tokio::spawn(pending);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!handle.is_finished());

    let result = handle.await.unwrap();
    assert!(!result.superseded);
    editor.document_mut().commit_parametric(result).unwrap();

    let props = &editor.document().get(duct).unwrap().as_duct().unwrap().props;
    assert_eq!(props.airflow, 1000.0);
    assert!(props.engineering_data.is_some());
    assert!(editor.undo());
    assert_eq!(
        editor.document().get(duct).unwrap().as_duct().unwrap().props.airflow,
        500.0
    );
}
