//! Typed events between the movement/portal core and the presentation layer.
//!
//! The overlay UI subscribes with a [`UiListener`]; the core never touches
//! overlay internals directly.

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Show a content overlay for a module/section.
    OpenGameModule { module_name: String },
    /// Hide the active content overlay.
    CloseGameModule,
    /// Full-screen transition flash on.
    FlashShown,
    /// Full-screen transition flash off.
    FlashHidden,
    /// "Press Enter to enter <name>" prompt for the hovered portal.
    PortalPrompt { name: String },
    PromptHidden,
    /// The pointer lock was released (overlay opened).
    PointerLockReleased,
    /// A different scene became active.
    SceneChanged { scene: String },
}

pub trait UiListener {
    fn on_ui_event(&mut self, event: &UiEvent);
}

impl<F: FnMut(&UiEvent)> UiListener for F {
    fn on_ui_event(&mut self, event: &UiEvent) {
        self(event)
    }
}

/// Fan-out of [`UiEvent`]s to every subscribed listener, in subscription order.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Box<dyn UiListener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl UiListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn emit(&mut self, event: UiEvent) {
        log::debug!("ui event: {:?}", event);
        for listener in &mut self.listeners {
            listener.on_ui_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn every_listener_sees_events_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        for tag in ["a", "b"] {
            let seen = Rc::clone(&seen);
            bus.subscribe(move |e: &UiEvent| seen.borrow_mut().push((tag, e.clone())));
        }
        bus.emit(UiEvent::FlashShown);
        bus.emit(UiEvent::CloseGameModule);
        let seen = seen.borrow();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0], ("a", UiEvent::FlashShown));
        assert_eq!(seen[1], ("b", UiEvent::FlashShown));
        assert_eq!(seen[3], ("b", UiEvent::CloseGameModule));
    }
}
