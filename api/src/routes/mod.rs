mod events;
mod room;
mod session;
mod table;
mod user_sync;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(session::routes())
        .merge(room::routes())
        .merge(table::routes())
        .merge(events::routes());

    Router::new()
        .nest("/v1", api)
        .merge(user_sync::routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
