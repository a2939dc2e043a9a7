use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::generation::LanguageModel;
use crate::proxy::{ProxyResponse, Upstream};
use crate::state::SharedState;

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, self.body).into_response();
        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (HeaderName::try_from(name.as_str()), HeaderValue::from_str(value)) {
                headers.insert(name, value);
            }
        }
        response
    }
}

// Raw body so malformed json reaches the proxy instead of axum's rejection
pub async fn chat_handler<M: LanguageModel, U: Upstream>(
    State(state): State<SharedState<M, U>>,
    body: String,
) -> ProxyResponse {
    state.chat.handle(&body).await
}

pub async fn chat_preflight_handler<M: LanguageModel, U: Upstream>(
    State(state): State<SharedState<M, U>>,
) -> ProxyResponse {
    state.chat.preflight()
}
