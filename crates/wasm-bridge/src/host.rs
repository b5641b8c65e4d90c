//! Browser timers and window events for a widget

use crate::instance_manager::InstanceManager;
use eco_chart_integration::{Dimensions, ListenerId, Schedule, TimerId, TimerTask, WidgetHost};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use uuid::Uuid;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlElement, Window};

#[derive(Debug, Clone, Copy)]
enum TimerKind {
    AnimationFrame(i32),
    Timeout(i32),
}

struct PendingTimer {
    kind: TimerKind,
    _closure: Closure<dyn FnMut()>,
}

/// Closures capture the instance id only and reach the widget through
/// [`InstanceManager`]. A closure is kept alive until it has fired and the
/// next schedule or cancel prunes it, so no running closure is dropped.
pub struct BrowserHost {
    instance_id: Uuid,
    element: HtmlElement,
    window: Window,
    next_id: u32,
    timers: HashMap<TimerId, PendingTimer>,
    fired: Rc<RefCell<Vec<TimerId>>>,
    listeners: HashMap<ListenerId, Closure<dyn FnMut()>>,
}

impl BrowserHost {
    pub fn new(element: HtmlElement, instance_id: Uuid) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window available"))?;
        Ok(Self {
            instance_id,
            element,
            window,
            next_id: 0,
            timers: HashMap::new(),
            fired: Rc::new(RefCell::new(Vec::new())),
            listeners: HashMap::new(),
        })
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn prune_fired(&mut self) {
        let fired: Vec<TimerId> = self.fired.borrow_mut().drain(..).collect();
        for id in fired {
            self.timers.remove(&id);
        }
    }

    fn register(&self, closure: &Closure<dyn FnMut()>, when: Schedule) -> Result<TimerKind, JsValue> {
        let callback = closure.as_ref().unchecked_ref();
        match when {
            Schedule::NextFrame => self
                .window
                .request_animation_frame(callback)
                .map(TimerKind::AnimationFrame),
            Schedule::After(delay) => self
                .window
                .set_timeout_with_callback_and_timeout_and_arguments_0(
                    callback,
                    delay.as_millis().min(i32::MAX as u128) as i32,
                )
                .map(TimerKind::Timeout),
        }
    }
}

impl WidgetHost for BrowserHost {
    fn container_dimensions(&self) -> Dimensions {
        Dimensions::new(
            self.element.client_width().max(0) as u32,
            self.element.client_height().max(0) as u32,
        )
    }

    fn schedule(&mut self, task: TimerTask, when: Schedule) -> TimerId {
        self.prune_fired();
        let id = TimerId(self.next_id());
        let instance_id = self.instance_id;
        let fired = Rc::clone(&self.fired);

        let closure = Closure::wrap(Box::new(move || {
            InstanceManager::with_widget_mut(&instance_id, |widget| widget.on_timer(task));
            fired.borrow_mut().push(id);
        }) as Box<dyn FnMut()>);

        match self.register(&closure, when) {
            Ok(kind) => {
                self.timers.insert(
                    id,
                    PendingTimer {
                        kind,
                        _closure: closure,
                    },
                );
            }
            Err(e) => log::warn!("Scheduling {:?} failed: {:?}", task, e),
        }
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.prune_fired();
        let Some(timer) = self.timers.remove(&id) else {
            return;
        };
        let result = match timer.kind {
            TimerKind::AnimationFrame(handle) => self.window.cancel_animation_frame(handle),
            TimerKind::Timeout(handle) => {
                self.window.clear_timeout_with_handle(handle);
                Ok(())
            }
        };
        if let Err(e) = result {
            log::warn!("Cancelling timer failed: {:?}", e);
        }
    }

    fn add_resize_listener(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id());
        let instance_id = self.instance_id;
        let closure = Closure::wrap(Box::new(move || {
            InstanceManager::with_widget_mut(&instance_id, |widget| widget.on_window_resize());
        }) as Box<dyn FnMut()>);

        match self
            .window
            .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
        {
            Ok(()) => {
                self.listeners.insert(id, closure);
            }
            Err(e) => log::warn!("Adding resize listener failed: {:?}", e),
        }
        id
    }

    fn remove_resize_listener(&mut self, id: ListenerId) {
        let Some(closure) = self.listeners.remove(&id) else {
            return;
        };
        if let Err(e) = self
            .window
            .remove_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
        {
            log::warn!("Removing resize listener failed: {:?}", e);
        }
    }
}
