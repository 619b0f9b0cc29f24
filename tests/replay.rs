//! Replay-engine properties: determinism, undo/redo laws, base absorption.

use image::Rgba;
use paintkit::ops::Action;
use paintkit::ops::effects::EffectAction;
use paintkit::ops::fill::FillAction;
use paintkit::ops::flood::Wrap;
use paintkit::ops::gradient::{GradientAction, GradientKind};
use paintkit::ops::shapes::RectAction;
use paintkit::ops::strokes::LineAction;
use paintkit::ops::transform::{ResizeAction, TransformAction};
use paintkit::{Canvas, Point, Surface};

const WHITE: [u8; 4] = [255, 255, 255, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];
const RED: [u8; 4] = [255, 0, 0, 255];

fn white_canvas(size: u32) -> Canvas {
    Canvas::new(Surface::filled(size, size, WHITE))
}

fn line(x1: i32, y1: i32, x2: i32, y2: i32, color: [u8; 4], width: u32) -> Action {
    let mut a = LineAction::new(Point::new(x1, y1), color, width);
    a.p2 = Point::new(x2, y2);
    Action::Line(a)
}

fn outline_rect(x1: i32, y1: i32, x2: i32, y2: i32, color: [u8; 4]) -> Action {
    let mut a = RectAction::new(Point::new(x1, y1), Some(color), None);
    a.p2 = Point::new(x2, y2);
    Action::Rect(a)
}

fn sample_log(canvas: &Canvas) -> Vec<Action> {
    let mut grad = GradientAction::new(Point::new(0, 0), BLACK, RED, GradientKind::Linear);
    grad.p2 = Point::new(20, 20);
    vec![
        line(1, 1, 30, 7, BLACK, 1),
        outline_rect(4, 4, 12, 12, RED),
        Action::Gradient(grad),
        Action::Fill(FillAction::new(
            canvas.composite(),
            Point::new(0, 0),
            RED,
            RED,
            0,
            Wrap::Bounded,
        )),
        Action::Effect(EffectAction::Invert),
    ]
}

#[test]
fn replay_is_deterministic_across_canvases() {
    let mut a = white_canvas(32);
    let mut b = white_canvas(32);
    for act in sample_log(&a) {
        a.commit(act.clone());
        b.commit(act);
    }
    assert_eq!(
        a.composite().as_image().as_raw(),
        b.composite().as_image().as_raw()
    );
}

#[test]
fn undo_then_redo_round_trips_exactly() {
    let mut canvas = white_canvas(32);
    for act in sample_log(&canvas) {
        canvas.commit(act);
    }
    let full = canvas.composite().into_image();

    assert!(canvas.undo());
    let shorter = canvas.composite().into_image();
    assert_ne!(full.as_raw(), shorter.as_raw());

    assert!(canvas.redo());
    assert_eq!(canvas.composite().into_image().as_raw(), full.as_raw());
}

#[test]
fn commit_then_undo_restores_precommit_pixels() {
    let mut canvas = white_canvas(32);
    canvas.commit(line(0, 0, 10, 10, BLACK, 1));
    let before = canvas.composite().into_image();

    canvas.commit(outline_rect(2, 2, 5, 5, RED));
    assert!(canvas.undo());
    assert_eq!(canvas.composite().into_image().as_raw(), before.as_raw());
}

#[test]
fn committing_after_undo_discards_redo() {
    let mut canvas = white_canvas(16);
    canvas.commit(line(0, 0, 5, 5, BLACK, 1));
    canvas.commit(line(0, 5, 5, 0, BLACK, 1));
    assert!(canvas.undo());
    assert!(canvas.can_redo());

    canvas.commit(outline_rect(1, 1, 3, 3, RED));
    assert!(!canvas.can_redo());
    assert!(!canvas.redo());
}

#[test]
fn undo_redo_on_empty_stacks_are_noops() {
    let mut canvas = white_canvas(8);
    assert!(!canvas.undo());
    assert!(!canvas.redo());
    assert!(!canvas.can_undo());
    assert!(!canvas.has_unsaved_changes());
}

#[test]
fn diagonal_line_on_white_canvas() {
    let mut canvas = white_canvas(32);
    canvas.commit(line(0, 0, 31, 31, BLACK, 1));
    let out = canvas.composite();
    assert_eq!(out.get(0, 0), Rgba(BLACK));
    assert_eq!(out.get(31, 31), Rgba(BLACK));
    assert_eq!(out.get(0, 31), Rgba(WHITE));
}

#[test]
fn rect_outline_undo_leaves_no_red() {
    let mut canvas = white_canvas(32);
    canvas.commit(outline_rect(2, 2, 5, 5, RED));
    assert!(canvas.undo());
    let out = canvas.composite();
    for y in 0..32 {
        for x in 0..32 {
            assert_eq!(out.get(x, y), Rgba(WHITE));
        }
    }
}

#[test]
fn invert_after_fill_inverts_every_channel() {
    let mut canvas = white_canvas(8);
    let fill = FillAction::new(
        canvas.composite(),
        Point::new(0, 0),
        RED,
        RED,
        0,
        Wrap::Bounded,
    );
    canvas.commit(Action::Fill(fill));
    canvas.commit(Action::Effect(EffectAction::Invert));
    assert!(canvas.base_absorbed());
    let out = canvas.composite();
    for y in 0..8 {
        for x in 0..8 {
            // 255 - red = cyan
            assert_eq!(out.get(x, y), Rgba([0, 255, 255, 255]));
        }
    }
}

#[test]
fn transform_suppresses_base_beneath_its_output() {
    // Shrinking to 50% leaves a transparent border; if the base were still
    // blended underneath, that border would come back white.
    let mut canvas = white_canvas(8);
    canvas.commit(Action::Transform(TransformAction::Zoom { percent: 50.0 }));
    assert!(canvas.base_absorbed());
    let out = canvas.composite();
    assert_eq!(out.get(0, 0)[3], 0);
    assert_eq!(out.get(7, 7)[3], 0);
    assert_eq!(out.get(4, 4), Rgba(WHITE));
}

#[test]
fn undoing_the_transform_restores_the_base() {
    let mut canvas = white_canvas(8);
    canvas.commit(Action::Transform(TransformAction::FlipH));
    assert!(canvas.base_absorbed());
    assert!(canvas.undo());
    assert!(!canvas.base_absorbed());
    assert_eq!(canvas.composite().get(0, 0), Rgba(WHITE));
}

#[test]
fn resize_confines_later_draws() {
    let mut canvas = white_canvas(16);
    canvas.commit(Action::Resize(ResizeAction {
        width: 8,
        height: 8,
    }));
    canvas.commit(line(0, 12, 15, 12, BLACK, 1));
    let out = canvas.composite();
    // the horizontal line at y = 12 lies outside the 8×8 clip
    for x in 0..16 {
        assert_eq!(out.get(x, 12), Rgba(WHITE));
    }
    // while draws inside the clip still land
    let mut canvas2 = white_canvas(16);
    canvas2.commit(Action::Resize(ResizeAction {
        width: 8,
        height: 8,
    }));
    canvas2.commit(line(0, 4, 15, 4, BLACK, 1));
    let out2 = canvas2.composite();
    assert_eq!(out2.get(3, 4), Rgba(BLACK));
    assert_eq!(out2.get(12, 4), Rgba(WHITE));
}

#[test]
fn set_image_clears_both_stacks() {
    let mut canvas = white_canvas(8);
    canvas.commit(line(0, 0, 3, 3, BLACK, 1));
    canvas.undo();
    assert!(canvas.can_redo());
    canvas.set_image(Surface::filled(8, 8, RED));
    assert!(!canvas.can_undo());
    assert!(!canvas.can_redo());
    assert_eq!(canvas.composite().get(0, 0), Rgba(RED));
}

#[test]
fn serialized_log_replays_to_identical_pixels() {
    let mut a = white_canvas(32);
    let log = sample_log(&a);
    for act in &log {
        a.commit(act.clone());
    }

    let bytes = bincode::serialize(&log).expect("serialize action log");
    let restored: Vec<Action> = bincode::deserialize(&bytes).expect("deserialize action log");

    let mut b = white_canvas(32);
    for act in restored {
        b.commit(act);
    }
    assert_eq!(
        a.composite().as_image().as_raw(),
        b.composite().as_image().as_raw()
    );
}
