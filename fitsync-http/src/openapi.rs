use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "fitsync API",
        version = "0.1.0",
        description = "Offline mutation queue for fitness-tracking clients. Queue writes while offline, inspect the queue, and trigger or observe syncing.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:7800", description = "Local development")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::queue::enqueue,
        crate::handlers::queue::list_queue,
        crate::handlers::queue::clear_queue,
        crate::handlers::sync::force_sync,
        crate::handlers::sync::sync_status,
        crate::handlers::network::set_network,
        crate::handlers::sessions::start_session,
        crate::handlers::sessions::list_sessions,
        crate::handlers::sessions::get_session,
        crate::handlers::sessions::record_set,
        crate::handlers::sessions::complete_session,
        crate::handlers::sessions::delete_session,
    ),
    components(
        schemas(
            crate::dto::EnqueueRequest,
            crate::dto::ClearQueueResponse,
            crate::dto::NetworkRequest,
            crate::dto::NetworkResponse,
            crate::dto::StartSessionRequest,
            crate::dto::HealthResponse,
            fitsync::types::SyncQueueItem,
            fitsync::types::MutationPayload,
            fitsync::types::Priority,
            fitsync::types::SyncStatus,
            fitsync::types::SetEntry,
            fitsync::manager::DrainOutcome,
            fitsync::manager::DrainReport,
            fitsync::session::OfflineWorkoutSession,
        )
    ),
    tags(
        (name = "health", description = "Health check"),
        (name = "queue", description = "Pending mutation queue"),
        (name = "sync", description = "Draining and connectivity"),
        (name = "sessions", description = "Offline workout sessions"),
    )
)]
pub struct ApiDoc;
