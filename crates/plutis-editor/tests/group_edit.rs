//! In-place group editing driven through native canvas events.

use kurbo::{Affine, Point};
use plutis_core::shapes::{Ellipse, Rectangle};
use plutis_core::{Group, SerializableColor, Shape, ShapeId, ShapeTrait, Text};
use plutis_editor::{
    EditCompletion, EditPhase, Editor, EditorEvent, EditorOptions, EventFilter, NativeEvent,
};
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
use std::time::Duration;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn noop_waker() -> Waker {
    fn raw() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            raw()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }
    unsafe { Waker::from_raw(raw()) }
}

fn poll_once<F: Future + Unpin>(f: &mut F) -> Poll<F::Output> {
    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);
    Pin::new(f).poll(&mut cx)
}

fn block_on<F: Future>(f: F) -> F::Output {
    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);
    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}

fn filled_rect(x: f64, y: f64, w: f64, h: f64) -> Shape {
    Shape::Rectangle(Rectangle::new(Point::new(x, y), w, h).with_fill(SerializableColor::black()))
}

fn text(x: f64, y: f64, content: &str) -> Text {
    let mut text = Text::new(Point::new(x, y), content.to_string());
    text.set_measured_size(80.0, 24.0);
    text
}

fn record_events(editor: &Editor) -> Rc<RefCell<Vec<EditorEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    editor.on(EventFilter::All, move |event| sink.borrow_mut().push(event.clone())).unwrap();
    events
}

fn ids(editor: &Editor) -> Vec<ShapeId> {
    editor.objects().list().unwrap()
}

/// Editor "e1" holding one group `[rect, text]`; returns the text's center.
fn editor_with_group() -> (Rc<Editor>, ShapeId, ShapeId, ShapeId, Point) {
    init_logger();
    let editor = Editor::new(EditorOptions::new("e1")).unwrap();
    let rect = filled_rect(100.0, 100.0, 300.0, 120.0);
    let title = text(140.0, 130.0, "Title");
    let center = title.edit_box(Affine::IDENTITY).center();
    let (rect_id, text_id) = (rect.id(), title.id());
    let group = Group::new(vec![rect, Shape::Text(title)]);
    let group_id = group.id();
    editor.objects().add(Shape::Group(group)).unwrap();
    (editor, group_id, rect_id, text_id, center)
}

#[test]
fn test_double_click_edit_and_exit_end_to_end() {
    let (editor, group_id, rect_id, text_id, center) = editor_with_group();
    let events = record_events(&editor);

    editor.canvas().double_click(center).unwrap();

    let surface = editor.canvas().surface();
    surface
        .read(|s| {
            assert!(s.get(group_id).is_none());
            assert!(s.is_editing(text_id));
            assert_eq!(s.active_objects(), vec![text_id]);
            let selection = s.text_selection().unwrap();
            assert_eq!((selection.start, selection.end), (0, 5));
        })
        .unwrap();
    assert_eq!(ids(&editor), vec![rect_id, text_id]);
    assert_eq!(editor.state().selection(), vec![text_id]);

    assert_eq!(editor.canvas().exit_editing().unwrap(), Some(text_id));

    let objects = ids(&editor);
    assert_eq!(objects.len(), 1);
    let group = editor.objects().get(objects[0]).unwrap().unwrap();
    assert_eq!(group.as_group().unwrap().member_ids(), vec![rect_id, text_id]);

    let names: Vec<&str> = events.borrow().iter().map(EditorEvent::name).collect();
    let dissolved = names.iter().position(|n| *n == "group:dissolved").unwrap();
    let started = names.iter().position(|n| *n == "editing:started").unwrap();
    let reformed = names.iter().position(|n| *n == "group:reformed").unwrap();
    assert!(dissolved < started && started < reformed);
}

#[test]
fn test_regroup_preserves_order_and_count() {
    init_logger();
    let editor = Editor::new(EditorOptions::new("e1")).unwrap();
    let below = editor.objects().add(filled_rect(0.0, 0.0, 10.0, 10.0)).unwrap();

    let m1 = filled_rect(100.0, 100.0, 300.0, 200.0);
    let label = text(150.0, 150.0, "Label");
    let m3 = Shape::Ellipse(Ellipse::circle(Point::new(350.0, 250.0), 20.0));
    let center = label.edit_box(Affine::IDENTITY).center();
    let members = vec![m1.id(), label.id(), m3.id()];
    let group = Group::new(vec![m1, Shape::Text(label), m3]);
    let group_id = editor.objects().add(Shape::Group(group)).unwrap();
    let above = editor.objects().add(filled_rect(900.0, 900.0, 10.0, 10.0)).unwrap();

    editor.canvas().double_click(center).unwrap();
    // Members take the group's place in the stack
    assert_eq!(ids(&editor), vec![below, members[0], members[1], members[2], above]);
    let surface = editor.canvas().surface();
    assert!(!surface.read(|s| s.is_selectable(members[0])).unwrap());
    assert!(!surface.read(|s| s.is_selectable(members[2])).unwrap());

    editor.canvas().exit_editing().unwrap();

    let objects = ids(&editor);
    assert_eq!(objects.len(), 3);
    assert_eq!(objects[0], below);
    assert_eq!(objects[2], above);
    assert_ne!(objects[1], group_id);
    let group = editor.objects().get(objects[1]).unwrap().unwrap();
    assert_eq!(group.as_group().unwrap().member_ids(), members);
    assert!(surface.read(|s| members.iter().all(|&id| s.is_selectable(id))).unwrap());
}

#[test]
fn test_double_click_outside_text_leaves_group_intact() {
    let (editor, group_id, _, _, _) = editor_with_group();
    let events = record_events(&editor);

    // Inside the rectangle, away from the text
    editor.canvas().double_click(Point::new(380.0, 200.0)).unwrap();

    assert_eq!(ids(&editor), vec![group_id]);
    assert!(editor.group_edit().active_sessions().is_empty());
    assert!(!events.borrow().iter().any(|e| e.name() == "group:dissolved"));
}

#[test]
fn test_double_click_on_empty_canvas_is_ignored() {
    let (editor, group_id, _, _, _) = editor_with_group();
    editor.canvas().double_click(Point::new(700.0, 550.0)).unwrap();
    assert_eq!(ids(&editor), vec![group_id]);
}

#[test]
fn test_second_exit_notification_is_ignored() {
    let (editor, _, _, text_id, center) = editor_with_group();
    editor.canvas().double_click(center).unwrap();
    editor.canvas().exit_editing().unwrap();
    let after_first = ids(&editor);

    editor
        .canvas()
        .dispatch(NativeEvent::EditingExited { target: text_id })
        .unwrap();
    assert_eq!(ids(&editor), after_first);
    assert!(!editor.group_edit().handle_editing_exited(text_id).unwrap());
}

#[test]
fn test_two_presses_start_editing() {
    let (editor, group_id, _, text_id, center) = editor_with_group();
    let press = plutis_core::PointerInput::left(center);

    editor.canvas().pointer_down(press).unwrap();
    editor.canvas().pointer_up(press).unwrap();
    assert_eq!(editor.state().selection(), vec![group_id]);

    editor.canvas().pointer_down(press).unwrap();
    editor.canvas().pointer_up(press).unwrap();
    let session = editor.group_edit().session(text_id).unwrap();
    assert_eq!(session.phase, EditPhase::Editing);
    assert!(session.armed);
}

#[test]
fn test_click_elsewhere_ends_editing() {
    let (editor, _, rect_id, text_id, center) = editor_with_group();
    editor.canvas().double_click(center).unwrap();

    editor
        .canvas()
        .pointer_down(plutis_core::PointerInput::left(Point::new(700.0, 550.0)))
        .unwrap();

    let objects = ids(&editor);
    assert_eq!(objects.len(), 1);
    let group = editor.objects().get(objects[0]).unwrap().unwrap();
    assert_eq!(group.as_group().unwrap().member_ids(), vec![rect_id, text_id]);
    assert!(editor.state().selection().is_empty());
}

/// Assert the document is exactly one group holding `members` in order.
fn assert_single_group(editor: &Editor, members: &[ShapeId]) -> ShapeId {
    let objects = ids(editor);
    assert_eq!(objects.len(), 1);
    let group = editor.objects().get(objects[0]).unwrap().unwrap();
    assert_eq!(group.as_group().unwrap().member_ids(), members);
    objects[0]
}

#[test]
fn test_deselect_ends_editing_and_regroups() {
    let (editor, _, rect_id, text_id, center) = editor_with_group();
    editor.canvas().double_click(center).unwrap();

    editor.objects().deselect().unwrap();

    assert_single_group(&editor, &[rect_id, text_id]);
    assert!(editor.group_edit().session(text_id).is_none());
    assert!(editor.state().selection().is_empty());
}

#[test]
fn test_selecting_another_object_regroups() {
    let (editor, _, rect_id, text_id, center) = editor_with_group();
    let other = editor.objects().add(filled_rect(600.0, 400.0, 50.0, 50.0)).unwrap();
    editor.canvas().double_click(center).unwrap();

    // Selecting the text being edited keeps the session open
    editor.objects().select(text_id).unwrap();
    assert!(editor.group_edit().session(text_id).is_some());

    editor.objects().select(other).unwrap();

    let objects = ids(&editor);
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[1], other);
    let group = editor.objects().get(objects[0]).unwrap().unwrap();
    assert_eq!(group.as_group().unwrap().member_ids(), vec![rect_id, text_id]);
    assert!(editor.group_edit().active_sessions().is_empty());
    assert_eq!(editor.state().selection(), vec![other]);
}

#[test]
fn test_undo_while_editing_closes_the_session() {
    let (editor, _, rect_id, text_id, center) = editor_with_group();
    editor.canvas().double_click(center).unwrap();
    let exit = editor.group_edit().wait_for_exit(text_id).unwrap();

    assert!(editor.history().undo().unwrap());
    assert_eq!(block_on(exit), EditCompletion::Exited);
    assert!(ids(&editor).is_empty());
    assert!(editor.group_edit().active_sessions().is_empty());

    assert!(editor.history().redo().unwrap());
    assert_single_group(&editor, &[rect_id, text_id]);
    let surface = editor.canvas().surface();
    assert!(surface.read(|s| s.is_selectable(rect_id)).unwrap());
}

#[test]
fn test_scene_import_while_editing_closes_the_session() {
    let (editor, _, _, text_id, center) = editor_with_group();
    let events = record_events(&editor);
    editor.canvas().double_click(center).unwrap();
    let exit = editor.group_edit().wait_for_exit(text_id).unwrap();

    editor.scene().clear().unwrap();

    assert_eq!(block_on(exit), EditCompletion::Exited);
    assert!(ids(&editor).is_empty());
    assert!(editor.group_edit().active_sessions().is_empty());
    let names: Vec<&str> = events.borrow().iter().map(EditorEvent::name).collect();
    let reformed = names.iter().position(|n| *n == "group:reformed").unwrap();
    let loaded = names.iter().position(|n| *n == "scene:loaded").unwrap();
    assert!(reformed < loaded);
}

#[test]
fn test_pointer_moves_after_double_click_do_not_drag() {
    let (editor, _, rect_id, text_id, center) = editor_with_group();
    let canvas = editor.canvas();
    let surface = canvas.surface();
    let depth_before = surface.read(|s| s.document.undo_depth()).unwrap();

    canvas.pointer_down(plutis_core::PointerInput::left(center)).unwrap();
    canvas.pointer_up(plutis_core::PointerInput::left(center)).unwrap();
    let second = center + kurbo::Vec2::new(1.0, 1.0);
    canvas.pointer_down(plutis_core::PointerInput::left(second)).unwrap();
    assert!(surface.read(|s| s.is_editing(text_id)).unwrap());
    for step in 1..=3 {
        let to = second + kurbo::Vec2::new(f64::from(step), 0.0);
        canvas.pointer_move(plutis_core::PointerInput::left(to)).unwrap();
    }
    canvas.pointer_up(plutis_core::PointerInput::left(second)).unwrap();

    assert!(!editor.input().is_dragging());
    assert_eq!(surface.read(|s| s.document.undo_depth()).unwrap(), depth_before);
    assert!(surface.read(|s| s.is_editing(text_id)).unwrap());

    canvas.exit_editing().unwrap();
    assert_single_group(&editor, &[rect_id, text_id]);
    assert!(editor.history().undo().unwrap());
    assert!(ids(&editor).is_empty());
}

#[test]
fn test_wait_for_exit() {
    let (editor, _, _, text_id, center) = editor_with_group();
    editor.canvas().double_click(center).unwrap();

    let mut exit = editor.group_edit().wait_for_exit(text_id).unwrap();
    assert!(poll_once(&mut exit).is_pending());

    editor.canvas().exit_editing().unwrap();
    assert_eq!(block_on(exit), EditCompletion::Exited);
}

#[test]
fn test_cancel_regroups() {
    let (editor, _, rect_id, text_id, center) = editor_with_group();
    let events = record_events(&editor);
    editor.canvas().double_click(center).unwrap();
    let exit = editor.group_edit().wait_for_exit(text_id).unwrap();

    assert!(editor.cancel_group_edit(text_id).unwrap());

    assert_eq!(block_on(exit), EditCompletion::Cancelled);
    let objects = ids(&editor);
    assert_eq!(objects.len(), 1);
    let group = editor.objects().get(objects[0]).unwrap().unwrap();
    assert_eq!(group.as_group().unwrap().member_ids(), vec![rect_id, text_id]);
    assert!(events.borrow().iter().any(|e| e.name() == "editing:cancelled"));
    // Exactly one regroup despite the exit notification sent by cancel
    let reforms = events.borrow().iter().filter(|e| e.name() == "group:reformed").count();
    assert_eq!(reforms, 1);
}

#[test]
fn test_stuck_sessions_are_reaped() {
    init_logger();
    let partial = plutis_editor::PartialEditorConfig {
        edit_timeout_secs: Some(0),
        ..Default::default()
    };
    let editor = Editor::new(EditorOptions::new("e1").with_config(partial)).unwrap();
    let label = text(10.0, 10.0, "Stuck");
    let center = label.edit_box(Affine::IDENTITY).center();
    let text_id = label.id();
    editor
        .objects()
        .add(Shape::Group(Group::new(vec![
            filled_rect(0.0, 0.0, 200.0, 100.0),
            Shape::Text(label),
        ])))
        .unwrap();

    editor.canvas().double_click(center).unwrap();
    let exit = editor.group_edit().wait_for_exit(text_id).unwrap();
    assert_eq!(editor.group_edit().stuck_sessions(Duration::ZERO), vec![text_id]);

    assert_eq!(editor.reap_stuck_edits().unwrap(), 1);
    assert_eq!(block_on(exit), EditCompletion::Cancelled);
    assert_eq!(ids(&editor).len(), 1);
    assert!(editor.canvas().surface().read(|s| s.editing_object().is_none()).unwrap());
}

#[test]
fn test_destroy_resolves_waiters() {
    let (editor, _, _, text_id, center) = editor_with_group();
    editor.canvas().double_click(center).unwrap();
    let exit = editor.group_edit().wait_for_exit(text_id).unwrap();

    editor.destroy().unwrap();
    assert_eq!(block_on(exit), EditCompletion::Cancelled);
    assert!(editor.group_edit().active_sessions().is_empty());
}
