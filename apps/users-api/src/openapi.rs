use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(schemas(axum_helpers::ErrorResponse, axum_helpers::ErrorBody)),
    info(
        title = "Users API",
        version = "0.1.0",
        description = "User management with broker notifications for lifecycle changes"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = "/users", api = domain_users::handlers::ApiDoc),
        (path = "/admin", api = domain_notifications::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;
