/// Notifications fired synchronously from dock operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockEvent {
    Embedded,
    Unembedded,
    Error(String),
}

type Listener = Box<dyn FnMut(&DockEvent)>;

/// Subscriber list, called in registration order on the caller's thread
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&DockEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn emit(&mut self, event: DockEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
