use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, StockDepletedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub stock_depleted_producer: Vec<EventProducer<StockDepletedEvent>>,
}

pub struct EventHandlers {
    pub on_stock_depleted: Option<EventHandler<StockDepletedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_stock_depleted = hooks.on_stock_depleted.map(|f| EventHandler::new(buffer_size, f));
        Self { on_stock_depleted }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_stock_depleted {
            result.stock_depleted_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_stock_depleted {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_stock_depleted: Option<Handler<StockDepletedEvent>>,
}

impl EventHooks {
    pub fn on_stock_depleted<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(StockDepletedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_stock_depleted = Some(Arc::new(f));
        self
    }
}
