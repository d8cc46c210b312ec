//! OpenAPI document for every HTTP endpoint.

use utoipa::OpenApi;

use crate::api::dto::{ActionRequest, ActionResponse, InfoResponse, KillResponse};
use crate::api::handlers::{action, admin, system};
use crate::error::{ErrorBody, ErrorResponse};
use crate::stream::handler as stream;

/// Generated OpenAPI specification.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "command-relay",
        description = "Bounded command queue and live streaming relay for a shared robot."
    ),
    paths(
        action::submit_action,
        stream::actions_handler,
        admin::info_handler,
        admin::kill_handler,
        admin::list_commands_handler,
        system::health_handler,
    ),
    components(schemas(
        ActionRequest,
        ActionResponse,
        InfoResponse,
        KillResponse,
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
    )),
    tags(
        (name = "Commands", description = "Command submission"),
        (name = "Stream", description = "Live observer stream"),
        (name = "Admin", description = "Status and secret-gated admin operations"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        for path in ["/action", "/actions", "/info", "/kill", "/commands", "/health"] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
