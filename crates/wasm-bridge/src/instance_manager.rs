//! Widget instances keyed by id
//!
//! Browser callbacks capture only the instance id and look the widget up
//! here. Borrows use `try_borrow*`, so a callback fired re-entrantly while a
//! widget is already borrowed is dropped instead of panicking.

use std::cell::RefCell;
use std::collections::HashMap;
use uuid::Uuid;

use crate::echarts::EchartsEngine;
use crate::host::BrowserHost;
use eco_chart_integration::EcoChartWidget;

pub type BrowserWidget = EcoChartWidget<EchartsEngine, BrowserHost>;

thread_local! {
    static WIDGETS: RefCell<HashMap<Uuid, BrowserWidget>> = RefCell::new(HashMap::new());
}

pub struct InstanceManager;

impl InstanceManager {
    pub fn insert(id: Uuid, widget: BrowserWidget) {
        WIDGETS.with(|widgets| match widgets.try_borrow_mut() {
            Ok(mut widgets) => {
                widgets.insert(id, widget);
            }
            Err(_) => log::warn!("Widget registry busy, instance {} not registered", id),
        });
    }

    pub fn with_widget<F, R>(id: &Uuid, f: F) -> Option<R>
    where
        F: FnOnce(&BrowserWidget) -> R,
    {
        WIDGETS.with(|widgets| match widgets.try_borrow() {
            Ok(widgets) => widgets.get(id).map(f),
            Err(_) => {
                log::debug!("Re-entrant read of instance {} dropped", id);
                None
            }
        })
    }

    pub fn with_widget_mut<F, R>(id: &Uuid, f: F) -> Option<R>
    where
        F: FnOnce(&mut BrowserWidget) -> R,
    {
        WIDGETS.with(|widgets| match widgets.try_borrow_mut() {
            Ok(mut widgets) => widgets.get_mut(id).map(f),
            Err(_) => {
                log::debug!("Re-entrant call on instance {} dropped", id);
                None
            }
        })
    }

    /// Remove an instance; the caller tears it down outside the registry borrow
    pub fn remove(id: &Uuid) -> Option<BrowserWidget> {
        WIDGETS.with(|widgets| widgets.try_borrow_mut().ok()?.remove(id))
    }

    pub fn contains(id: &Uuid) -> bool {
        WIDGETS.with(|widgets| {
            widgets
                .try_borrow()
                .map(|widgets| widgets.contains_key(id))
                .unwrap_or(false)
        })
    }

    pub fn instance_count() -> usize {
        WIDGETS.with(|widgets| widgets.try_borrow().map(|w| w.len()).unwrap_or(0))
    }
}
