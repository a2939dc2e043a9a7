use std::sync::Arc;

use crate::backend::OllamaModel;
use crate::generation::{GenerationService, LanguageModel};
use crate::proxy::{ChatProxyHandler, HttpUpstream, Upstream};

// app's shared state
pub struct AppState<M: LanguageModel = OllamaModel, U: Upstream = HttpUpstream> {
    pub generation: GenerationService<M>,
    pub chat: ChatProxyHandler<U>,
}

pub type SharedState<M = OllamaModel, U = HttpUpstream> = Arc<AppState<M, U>>;
