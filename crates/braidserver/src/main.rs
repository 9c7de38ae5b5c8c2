use actix_cors::Cors;
use actix_web::{
    get, post, web, App, HttpResponse, HttpServer, Responder, Result as ActixResult,
};
use actix_ws::Message;
use braidcore::{
    BroadcastSink, EchoGenerator, EngineError, ExecutionContext, ExecutionStore, Graph,
    SharedEventSink, StoreError,
};
use braidengine::{DispatchQueue, MemoryExecutionStore, QueueConfig, WorkflowEngine, WorkflowJob};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info};
use uuid::Uuid;

/// Application state shared across handlers
struct AppState {
    engine: Arc<WorkflowEngine>,
    queue: DispatchQueue,
    store: Arc<MemoryExecutionStore>,
    events: Arc<BroadcastSink>,
}

fn default_project() -> String {
    "default".to_string()
}

fn default_user() -> String {
    "anonymous".to_string()
}

/// Request body for synchronous and queued workflow execution
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteRequest {
    graph: Graph,
    #[serde(default)]
    variables: Map<String, Value>,
    #[serde(default = "default_project")]
    project_id: String,
    #[serde(default = "default_user")]
    user_id: String,
}

/// Error response
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Map engine failures onto HTTP statuses: structural problems are the
/// caller's (400), per-node config rejections are separable (422), the rest
/// is on us (500).
fn engine_error_response(err: &EngineError) -> HttpResponse {
    let body = ErrorResponse {
        error: err.to_string(),
    };
    match err {
        EngineError::Validation(_) => HttpResponse::BadRequest().json(body),
        EngineError::InvalidNodeConfig { .. } => HttpResponse::UnprocessableEntity().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

/// Health check endpoint
#[get("/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "braid"
    }))
}

/// List the node kinds the engine can execute
#[get("/api/nodes")]
async fn list_node_kinds(data: web::Data<AppState>) -> ActixResult<impl Responder> {
    let kinds: Vec<_> = data
        .engine
        .registry()
        .kinds()
        .iter()
        .map(|kind| {
            serde_json::json!({
                "type": kind.as_str(),
                "description": kind.describe(),
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(kinds))
}

/// Run a workflow to completion and return the accumulated results
#[post("/api/execute")]
async fn execute_workflow(
    data: web::Data<AppState>,
    req: web::Json<ExecuteRequest>,
) -> ActixResult<impl Responder> {
    let req = req.into_inner();

    info!("Executing workflow for project: {}", req.project_id);

    let context =
        ExecutionContext::new(req.project_id, req.user_id).with_variables(req.variables);

    match data.engine.execute(&req.graph, context).await {
        Ok(results) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "results": results,
        }))),
        Err(e) => {
            error!("Workflow execution failed: {}", e);
            Ok(engine_error_response(&e))
        }
    }
}

/// Queue a workflow for background execution
#[post("/api/dispatch")]
async fn dispatch_workflow(
    data: web::Data<AppState>,
    req: web::Json<ExecuteRequest>,
) -> ActixResult<impl Responder> {
    let req = req.into_inner();
    let context = ExecutionContext::new(req.project_id.clone(), req.user_id.clone())
        .with_variables(req.variables);
    let job = WorkflowJob {
        project_id: req.project_id,
        user_id: req.user_id,
        graph: req.graph,
        context,
    };

    match data.queue.submit(job) {
        Ok(job_id) => Ok(HttpResponse::Accepted().json(serde_json::json!({
            "jobId": job_id,
            "status": "queued",
        }))),
        Err(e) => Ok(HttpResponse::ServiceUnavailable().json(ErrorResponse {
            error: e.to_string(),
        })),
    }
}

/// List execution records, most recent first
#[get("/api/executions")]
async fn list_executions(data: web::Data<AppState>) -> ActixResult<impl Responder> {
    Ok(HttpResponse::Ok().json(data.store.list().await))
}

/// Fetch a single execution record
#[get("/api/executions/{id}")]
async fn get_execution(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> ActixResult<impl Responder> {
    let id = path.into_inner();

    match data.store.get(id).await {
        Ok(record) => Ok(HttpResponse::Ok().json(record)),
        Err(StoreError::NotFound { .. }) => Ok(HttpResponse::NotFound().json(ErrorResponse {
            error: format!("Execution {} not found", id),
        })),
        Err(e) => Ok(HttpResponse::InternalServerError().json(ErrorResponse {
            error: e.to_string(),
        })),
    }
}

/// Mark an execution cancelled
#[post("/api/executions/{id}/cancel")]
async fn cancel_execution(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> ActixResult<impl Responder> {
    let id = path.into_inner();

    match data.store.cancel(id).await {
        Ok(()) => {
            info!("Cancelled execution: {}", id);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "id": id,
                "status": "cancelled",
            })))
        }
        Err(StoreError::NotFound { .. }) => Ok(HttpResponse::NotFound().json(ErrorResponse {
            error: format!("Execution {} not found", id),
        })),
        Err(e) => Ok(HttpResponse::InternalServerError().json(ErrorResponse {
            error: e.to_string(),
        })),
    }
}

/// WebSocket endpoint for real-time engine events
#[get("/api/events")]
async fn websocket_events(
    req: actix_web::HttpRequest,
    stream: web::Payload,
    data: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let (res, mut session, mut msg_stream) = actix_ws::handle(&req, stream)?;

    info!("WebSocket client connected");

    // Subscribe to engine events
    let mut events = data.events.subscribe();

    // Spawn task to relay events to the socket
    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Ok(event) => {
                            if let Ok(json) = serde_json::to_string(&event) {
                                if session.text(json).await.is_err() {
                                    break;
                                }
                            }
                        }
                        // A lagging client only misses messages; keep relaying.
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    }
                }

                // Handle incoming WebSocket messages (ping/pong)
                Some(Ok(msg)) = msg_stream.recv() => {
                    match msg {
                        Message::Ping(bytes) => {
                            if session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        _ => {}
                    }
                }

                else => break,
            }
        }

        info!("WebSocket client disconnected");
        let _ = session.close(None).await;
    });

    Ok(res)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("🚀 Starting Braid workflow server");

    let events = Arc::new(BroadcastSink::new(256));
    let sink: SharedEventSink = events.clone();

    let store = Arc::new(MemoryExecutionStore::new());
    let registry = braidnodes::builtin_registry(Arc::new(EchoGenerator), sink.clone());
    let engine = Arc::new(WorkflowEngine::new(registry, store.clone(), sink));
    let queue = DispatchQueue::new(engine.clone(), QueueConfig::default());

    info!("✅ Engine initialized with built-in node handlers");

    let app_state = web::Data::new(AppState {
        engine,
        queue,
        store,
        events,
    });

    let bind_address = std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    info!("🌐 Server starting on http://{}", bind_address);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .service(health_check)
            .service(list_node_kinds)
            .service(execute_workflow)
            .service(dispatch_workflow)
            .service(list_executions)
            .service(get_execution)
            .service(cancel_execution)
            .service(websocket_events)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
