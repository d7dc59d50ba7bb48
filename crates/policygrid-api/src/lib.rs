//! policygrid-api — REST API for policy binding.
//!
//! Thin axum layer over [`PolicyBinder`]: handlers decode the request, run
//! one bind or unbind, and map the outcome to a status code.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | PUT | `/v1/apps/{app_id}/policy` | Bind a policy (201 new, 200 replaced) |
//! | DELETE | `/v1/apps/{app_id}/policy` | Unbind the policy |
//! | GET | `/v1/apps/{app_id}/policy` | Read the stored policy |
//! | GET | `/v1/apps` | Application ids with a policy |
//! | GET | `/v1/policies` | Every stored policy record |
//! | GET | `/healthz` | Liveness |

pub mod handlers;

use axum::Router;
use axum::routing::get;
use policygrid_binding::PolicyBinder;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub binder: PolicyBinder,
}

/// Build the complete API router.
pub fn build_router(binder: PolicyBinder) -> Router {
    let state = ApiState { binder };

    let api_routes = Router::new()
        .route(
            "/apps/{app_id}/policy",
            get(handlers::get_policy)
                .put(handlers::bind_policy)
                .delete(handlers::unbind_policy),
        )
        .route("/apps", get(handlers::list_app_ids))
        .route("/policies", get(handlers::list_policies))
        .with_state(state);

    Router::new()
        .nest("/v1", api_routes)
        .route("/healthz", get(handlers::healthz))
}
