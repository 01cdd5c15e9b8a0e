use view_engine::ViewEngine;

pub(crate) struct AppState {
    pub(crate) engine: ViewEngine,
}

impl AppState {
    pub(crate) fn new(engine: ViewEngine) -> Self {
        Self { engine }
    }
}
