//! Table-driven gesture recognition.
//!
//! A [`GestureRecognizer`] maps each [`EventKind`] to an optional transition
//! `(event, gesture) -> gesture`. Kinds without an entry pass the gesture
//! through untouched, so callers can assemble any subset of behaviors.

use blockgrid_protocol::{BlockType, Point, Rect};
use tracing::debug;

use super::{DragMode, EventKind, Gesture, PointerEvent};

/// Distance in pixels from a block edge within which a press grabs that edge.
pub const EDGE_THRESHOLD_PX: f64 = 10.0;

pub type Transition = Box<dyn Fn(&PointerEvent, Gesture) -> Gesture>;

#[derive(Default)]
pub struct GestureRecognizer {
    table: [Option<Transition>; 4],
}

impl std::fmt::Debug for GestureRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handled: Vec<EventKind> = EventKind::ALL
            .into_iter()
            .filter(|kind| self.table[kind.slot()].is_some())
            .collect();
        f.debug_struct("GestureRecognizer")
            .field("handled", &handled)
            .finish()
    }
}

impl GestureRecognizer {
    /// A recognizer that handles nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install (or replace) the transition for one event kind.
    pub fn on(
        mut self,
        kind: EventKind,
        transition: impl Fn(&PointerEvent, Gesture) -> Gesture + 'static,
    ) -> Self {
        self.table[kind.slot()] = Some(Box::new(transition));
        self
    }

    pub fn handles(&self, kind: EventKind) -> bool {
        self.table[kind.slot()].is_some()
    }

    pub fn recognize(&self, event: &PointerEvent, gesture: Gesture) -> Gesture {
        match &self.table[event.kind.slot()] {
            Some(transition) => transition(event, gesture),
            None => gesture,
        }
    }

    /// Press on a block to drag it, press on empty space to draw, release to
    /// finish, click to select.
    pub fn planner(edge_threshold_px: f64, default_block_type: BlockType) -> Self {
        Self::new()
            .on(EventKind::PointerDown, move |event, gesture| {
                pointer_down(event, gesture, edge_threshold_px, &default_block_type)
            })
            .on(EventKind::PointerMove, pointer_move)
            .on(EventKind::PointerUp, pointer_up)
            .on(EventKind::Click, click)
    }
}

/// Which part of `rect` a press at `point` grabs.
pub fn detect_drag_mode(point: Point, rect: &Rect, threshold: f64) -> DragMode {
    if (rect.x - point.x).abs() <= threshold {
        return DragMode::Left;
    }
    if (rect.right() - point.x).abs() <= threshold {
        return DragMode::Right;
    }
    DragMode::Both
}

fn pointer_down(
    event: &PointerEvent,
    _gesture: Gesture,
    edge_threshold_px: f64,
    default_block_type: &BlockType,
) -> Gesture {
    match &event.hit {
        Some(hit) => Gesture::Drag {
            origin: event.index,
            destination: event.index,
            drag_mode: detect_drag_mode(event.point, &hit.rect, edge_threshold_px),
            block: hit.block.clone(),
        },
        None => Gesture::MultiDraw {
            origin: event.index,
            destination: None,
            block_type: default_block_type.clone(),
        },
    }
}

fn pointer_move(event: &PointerEvent, gesture: Gesture) -> Gesture {
    match gesture {
        Gesture::MultiDraw {
            origin, block_type, ..
        } => Gesture::MultiDraw {
            origin,
            destination: Some(event.index),
            block_type,
        },
        Gesture::Drag {
            origin,
            drag_mode,
            block,
            ..
        } => Gesture::Drag {
            origin,
            destination: event.index,
            drag_mode,
            block,
        },
        other => other,
    }
}

fn pointer_up(event: &PointerEvent, gesture: Gesture) -> Gesture {
    match gesture {
        Gesture::MultiDraw { .. } => Gesture::Idle,
        Gesture::Drag { .. } => match &event.hit {
            Some(hit) => Gesture::Selection {
                selected: hit.block.clone(),
            },
            None => Gesture::Idle,
        },
        other => other,
    }
}

fn click(event: &PointerEvent, gesture: Gesture) -> Gesture {
    match gesture {
        Gesture::Idle | Gesture::Selection { .. } => match &event.hit {
            Some(hit) => Gesture::Selection {
                selected: hit.block.clone(),
            },
            None => Gesture::Idle,
        },
        // A press and release without movement lands here: keep the pressed
        // block selected even if the pointer slid off it.
        Gesture::Drag { block, .. } => Gesture::Selection {
            selected: event.hit.as_ref().map_or(block, |hit| hit.block.clone()),
        },
        other => other,
    }
}

/// What handling one event produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// The gesture before the event was applied.
    pub previous: Gesture,
    /// The pointer's default behavior (text selection, scrolling) should be
    /// suppressed for this event.
    pub suppress_default: bool,
}

/// Owns the current gesture and advances it one event at a time.
#[derive(Debug)]
pub struct GestureResolver {
    recognizer: GestureRecognizer,
    gesture: Gesture,
}

impl GestureResolver {
    pub fn new(recognizer: GestureRecognizer) -> Self {
        Self {
            recognizer,
            gesture: Gesture::Idle,
        }
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn handle(&mut self, event: &PointerEvent) -> Outcome {
        let previous = std::mem::take(&mut self.gesture);
        self.gesture = self.recognizer.recognize(event, previous.clone());
        if self.gesture.name() != previous.name() {
            debug!(
                kind = ?event.kind,
                from = previous.name(),
                to = self.gesture.name(),
                "gesture transition"
            );
        }
        Outcome {
            suppress_default: event.kind == EventKind::PointerMove && self.gesture.is_active(),
            previous,
        }
    }

    /// Abandon the current gesture.
    pub fn cancel(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// Swap the current gesture, e.g. to refresh a selection after a commit.
    pub fn replace(&mut self, gesture: Gesture) {
        self.gesture = gesture;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockgrid_protocol::{Block, BlockMatch, TimeIndex, TimeSpan};

    fn event(kind: EventKind, x: f64, seconds: f64, row: u32) -> PointerEvent {
        let point = Point::new(x, row as f64 * 48.0);
        PointerEvent::new(kind, point, TimeIndex::new(seconds, row))
    }

    fn on(block: &Block, kind: EventKind, x: f64, seconds: f64, row: u32) -> PointerEvent {
        event(kind, x, seconds, row).with_hit(hit(block))
    }

    fn hit(block: &Block) -> Option<BlockMatch> {
        Some(BlockMatch {
            block: block.clone(),
            rect: Rect::new(100.0, 0.0, 200.0, 48.0),
        })
    }

    fn resolver() -> GestureResolver {
        let recognizer = GestureRecognizer::planner(EDGE_THRESHOLD_PX, BlockType::from("a"));
        GestureResolver::new(recognizer)
    }

    #[test]
    fn press_on_empty_space_draws() {
        let mut r = resolver();
        r.handle(&event(EventKind::PointerDown, 10.0, 0.0, 0));
        assert!(matches!(
            r.gesture(),
            Gesture::MultiDraw { destination: None, block_type, .. } if *block_type == "a"
        ));
        let outcome = r.handle(&event(EventKind::PointerMove, 50.0, 900.0, 2));
        assert!(outcome.suppress_default);
        assert!(matches!(
            r.gesture(),
            Gesture::MultiDraw { destination: Some(TimeIndex { row: 2, .. }), .. }
        ));
        let outcome = r.handle(&event(EventKind::PointerUp, 50.0, 900.0, 2));
        assert_eq!(outcome.previous.name(), "multidraw");
        assert_eq!(r.gesture(), &Gesture::Idle);
    }

    #[test]
    fn press_near_edges_picks_drag_mode() {
        let rect = Rect::new(100.0, 0.0, 200.0, 48.0);
        let mode = |x| detect_drag_mode(Point::new(x, 10.0), &rect, 10.0);
        assert_eq!(mode(95.0), DragMode::Left);
        assert_eq!(mode(305.0), DragMode::Right);
        assert_eq!(mode(200.0), DragMode::Both);
    }

    #[test]
    fn drag_release_on_block_selects_it() {
        let block = Block::new(0, "a", TimeSpan::new(0.0, 3600.0));
        let mut r = resolver();
        r.handle(&on(&block, EventKind::PointerDown, 200.0, 1800.0, 0));
        assert!(matches!(r.gesture(), Gesture::Drag { drag_mode: DragMode::Both, .. }));
        r.handle(&event(EventKind::PointerMove, 250.0, 2400.0, 0));
        assert!(matches!(
            r.gesture(),
            Gesture::Drag { destination: TimeIndex { seconds, .. }, .. } if *seconds == 2400.0
        ));
        r.handle(&on(&block, EventKind::PointerUp, 250.0, 2400.0, 0));
        assert_eq!(r.gesture().selected().map(|b| b.uid), Some(block.uid));
    }

    #[test]
    fn drag_release_off_block_goes_idle() {
        let block = Block::new(0, "a", TimeSpan::new(0.0, 3600.0));
        let mut r = resolver();
        r.handle(&on(&block, EventKind::PointerDown, 200.0, 1800.0, 0));
        r.handle(&event(EventKind::PointerUp, 900.0, 9000.0, 3));
        assert_eq!(r.gesture(), &Gesture::Idle);
    }

    #[test]
    fn click_selects_and_clears() {
        let block = Block::new(0, "a", TimeSpan::new(0.0, 3600.0));
        let mut r = resolver();
        r.handle(&on(&block, EventKind::Click, 200.0, 1800.0, 0));
        assert!(r.gesture().selected().is_some());
        r.handle(&event(EventKind::Click, 900.0, 9000.0, 3));
        assert_eq!(r.gesture(), &Gesture::Idle);
    }

    #[test]
    fn click_during_drag_keeps_pressed_block() {
        let block = Block::new(0, "a", TimeSpan::new(0.0, 3600.0));
        let mut r = resolver();
        r.handle(&on(&block, EventKind::PointerDown, 200.0, 1800.0, 0));
        r.handle(&event(EventKind::Click, 900.0, 9000.0, 3));
        assert_eq!(r.gesture().selected().map(|b| b.uid), Some(block.uid));
    }

    #[test]
    fn move_without_gesture_passes_through() {
        let mut r = resolver();
        let outcome = r.handle(&event(EventKind::PointerMove, 10.0, 0.0, 0));
        assert!(!outcome.suppress_default);
        assert_eq!(r.gesture(), &Gesture::Idle);
    }

    #[test]
    fn unhandled_kinds_are_identity() {
        let recognizer = GestureRecognizer::new().on(EventKind::Click, |_, _| Gesture::Idle);
        assert!(recognizer.handles(EventKind::Click));
        assert!(!recognizer.handles(EventKind::PointerDown));

        let mut r = GestureResolver::new(recognizer);
        r.handle(&event(EventKind::PointerDown, 10.0, 0.0, 0));
        assert_eq!(r.gesture(), &Gesture::Idle);
    }

    #[test]
    fn cancel_resets_to_idle() {
        let mut r = resolver();
        r.handle(&event(EventKind::PointerDown, 10.0, 0.0, 0));
        assert!(r.gesture().is_active());
        r.cancel();
        assert_eq!(r.gesture(), &Gesture::Idle);
    }
}
