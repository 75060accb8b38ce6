//! Notifications from the editor to whatever is presenting it.

use std::cell::RefCell;
use std::rc::Rc;

use crate::model::ModelEvent;

/// Receives status hints and model change notifications.
///
/// Both methods default to doing nothing so a front end only implements what
/// it renders.
pub trait EditorObserver {
    /// A short message for a status bar.
    fn on_status(&mut self, _message: &str) {}

    /// A change to the model that may need redrawing.
    fn on_model_event(&mut self, _event: &ModelEvent) {}
}

/// Everything a [`RecordingObserver`] has been told.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ObserverLog {
    pub statuses: Vec<String>,
    pub events: Vec<ModelEvent>,
}

/// Observer that keeps every notification in a shared log.
///
/// Clone it before subscribing to keep a handle for reading the log.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    log: Rc<RefCell<ObserverLog>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.log.borrow().statuses.clone()
    }

    pub fn events(&self) -> Vec<ModelEvent> {
        self.log.borrow().events.clone()
    }

    pub fn last_status(&self) -> Option<String> {
        self.log.borrow().statuses.last().cloned()
    }

    pub fn clear(&self) {
        *self.log.borrow_mut() = ObserverLog::default();
    }
}

impl EditorObserver for RecordingObserver {
    fn on_status(&mut self, message: &str) {
        self.log.borrow_mut().statuses.push(message.to_string());
    }

    fn on_model_event(&mut self, event: &ModelEvent) {
        self.log.borrow_mut().events.push(event.clone());
    }
}
