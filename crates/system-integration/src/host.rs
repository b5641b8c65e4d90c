//! What the widget needs from its embedding environment

use serde::Serialize;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use std::time::Duration;

/// Container layout size in CSS pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// No usable layout yet
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Deferred work the widget asks the host to run later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimerTask {
    Initialize,
    SettleResize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Schedule {
    NextFrame,
    After(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TimerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ListenerId(pub u32);

/// Timers and window events of the embedding environment.
///
/// The host delivers a scheduled task by calling the widget's `on_timer`,
/// and window resizes through `on_window_resize`. A cancelled timer must
/// never be delivered.
pub trait WidgetHost {
    fn container_dimensions(&self) -> Dimensions;

    fn schedule(&mut self, task: TimerTask, when: Schedule) -> TimerId;

    fn cancel(&mut self, id: TimerId);

    fn add_resize_listener(&mut self) -> ListenerId;

    fn remove_resize_listener(&mut self, id: ListenerId);
}

#[derive(Debug, Default)]
struct ManualState {
    dimensions: Dimensions,
    next_id: u32,
    timers: BTreeMap<TimerId, (TimerTask, Schedule)>,
    listeners: BTreeSet<ListenerId>,
    cancelled: u32,
}

impl ManualState {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Host driven explicitly by its owner: nothing fires until the owner
/// takes a pending task and hands it to the widget. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct ManualHost {
    state: Rc<RefCell<ManualState>>,
}

impl ManualHost {
    pub fn new(dimensions: Dimensions) -> Self {
        let host = Self::default();
        host.set_dimensions(dimensions);
        host
    }

    pub fn set_dimensions(&self, dimensions: Dimensions) {
        self.state.borrow_mut().dimensions = dimensions;
    }

    /// Remove and return the oldest pending task
    pub fn take_next(&self) -> Option<(TimerTask, Schedule)> {
        let mut state = self.state.borrow_mut();
        let id = *state.timers.keys().next()?;
        state.timers.remove(&id)
    }

    pub fn pending(&self) -> Vec<(TimerTask, Schedule)> {
        self.state.borrow().timers.values().copied().collect()
    }

    pub fn pending_count(&self) -> usize {
        self.state.borrow().timers.len()
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    pub fn cancelled_count(&self) -> u32 {
        self.state.borrow().cancelled
    }
}

impl WidgetHost for ManualHost {
    fn container_dimensions(&self) -> Dimensions {
        self.state.borrow().dimensions
    }

    fn schedule(&mut self, task: TimerTask, when: Schedule) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = TimerId(state.next_id());
        state.timers.insert(id, (task, when));
        id
    }

    fn cancel(&mut self, id: TimerId) {
        let mut state = self.state.borrow_mut();
        if state.timers.remove(&id).is_some() {
            state.cancelled += 1;
        }
    }

    fn add_resize_listener(&mut self) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_id());
        state.listeners.insert(id);
        id
    }

    fn remove_resize_listener(&mut self, id: ListenerId) {
        self.state.borrow_mut().listeners.remove(&id);
    }
}
