mod channel;
mod event_types;
mod hooks;
mod push;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
pub use push::{stock_depleted_push_hook, PushMessage, PushRegistry};
