use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use roomcast::config::ServerConfig;
use roomcast::room::repository::{InMemoryRoomRepository, PostgresRoomRepository, RoomRepository};
use roomcast::room::{self, CleanupConfig, RoomDirectory};
use roomcast::session::{
    self,
    repository::{InMemorySessionRepository, PostgresSessionRepository, SessionRepository},
    service::SessionService,
    token::TokenConfig,
};
use roomcast::shared::AppState;
use roomcast::user::{
    self,
    repository::{InMemoryUserRepository, PostgresUserRepository, UserRepository},
    service::UserService,
};
use roomcast::websockets::{websocket_handler, HubConfig, RoomHub};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roomcast=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting room broadcast server");

    let server_config = ServerConfig::from_env();
    let hub = RoomHub::new(HubConfig::from_env());
    let cleanup_config = CleanupConfig::from_env();

    let app_state = match &server_config.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url).await?;
            info!("Using PostgreSQL repositories");
            build_state(
                Arc::new(PostgresSessionRepository::new(pool.clone())),
                Arc::new(PostgresUserRepository::new(pool.clone())),
                Arc::new(PostgresRoomRepository::new(pool)),
                hub,
                cleanup_config,
            )
        }
        None => {
            info!("DATABASE_URL not set, using in-memory repositories");
            build_state(
                Arc::new(InMemorySessionRepository::new()),
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemoryRoomRepository::new()),
                hub,
                cleanup_config,
            )
        }
    };

    // Sweeper runs for the lifetime of the process
    tokio::spawn(room::start_cleanup_task(
        app_state.hub.clone(),
        Arc::clone(&app_state.room_directory),
        app_state.cleanup_config.clone(),
    ));

    let auth = middleware::from_fn_with_state(app_state.clone(), session::jwt_auth);

    let app = Router::new()
        .route(
            "/session",
            post(session::create_session)
                .merge(delete(session::end_session).route_layer(auth.clone())),
        )
        .route("/auth/register", post(user::register))
        .route("/auth/login", post(user::login))
        .route("/profile", get(user::profile).route_layer(auth.clone()))
        .route("/room", post(room::create_room).route_layer(auth.clone()))
        .route("/room/join", post(room::join_room))
        .route("/room/:join_code/end", post(room::end_room).route_layer(auth))
        .route("/ws", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&server_config.bind_addr).await?;
    info!(bind_addr = %server_config.bind_addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_state<R>(
    session_repository: Arc<dyn SessionRepository + Send + Sync>,
    user_repository: Arc<dyn UserRepository + Send + Sync>,
    room_repository: Arc<R>,
    hub: RoomHub,
    cleanup_config: CleanupConfig,
) -> AppState
where
    R: RoomRepository + RoomDirectory + Send + Sync + 'static,
{
    let session_service = Arc::new(SessionService::new(session_repository, TokenConfig::new()));
    let user_service = Arc::new(UserService::new(
        user_repository,
        Arc::clone(&session_service),
        bcrypt::DEFAULT_COST,
    ));
    AppState::new(
        session_service,
        user_service,
        room_repository,
        hub,
        cleanup_config,
    )
}
