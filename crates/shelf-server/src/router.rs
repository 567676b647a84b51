//! Server router: dispatches method calls to services.

use std::future::Future;
use std::pin::Pin;

use parking_lot::RwLock;
use serde_json::Value;
use shelf_protocol::{ApiError, ErrorKind, HandlerResult};
use shelf_services::Service;
use shelf_transport::RequestHandler;
use tracing::{debug, info, warn};

/// The server: owns services and routes requests.
pub struct ShelfServer {
    /// Registered services (boxed for object safety)
    services: Vec<Box<dyn ServiceDyn>>,
    /// Server state
    state: RwLock<ServerState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServerState {
    Uninitialized,
    Running,
    Shutdown,
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe wrapper for the Service trait.
trait ServiceDyn: Send + Sync {
    fn namespace_dyn(&self) -> &str;
    fn handle_dyn<'a>(
        &'a self,
        method: &'a str,
        params: Option<Value>,
    ) -> BoxFuture<'a, HandlerResult>;
    fn init_dyn(&self) -> BoxFuture<'_, Result<(), Box<dyn std::error::Error + Send + Sync>>>;
    fn shutdown_dyn(&self) -> BoxFuture<'_, ()>;
}

impl<T: Service> ServiceDyn for T {
    fn namespace_dyn(&self) -> &str {
        self.namespace()
    }
    fn handle_dyn<'a>(
        &'a self,
        method: &'a str,
        params: Option<Value>,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(self.handle(method, params))
    }
    fn init_dyn(&self) -> BoxFuture<'_, Result<(), Box<dyn std::error::Error + Send + Sync>>> {
        Box::pin(self.init())
    }
    fn shutdown_dyn(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.shutdown())
    }
}

impl ShelfServer {
    pub fn new() -> Self {
        Self {
            services: Vec::new(),
            state: RwLock::new(ServerState::Uninitialized),
        }
    }

    /// Register a service with the server.
    pub fn register_service<S: Service + 'static>(&mut self, service: S) {
        info!("Registering service: {}", service.namespace());
        self.services.push(Box::new(service));
    }

    /// Initialize all services.
    pub async fn initialize(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        for service in &self.services {
            service.init_dyn().await?;
        }

        *self.state.write() = ServerState::Running;
        info!("Server initialized ({} services)", self.services.len());
        Ok(())
    }

    /// Shutdown all services.
    pub async fn shutdown(&self) {
        {
            let mut state = self.state.write();
            if *state == ServerState::Shutdown {
                return;
            }
            *state = ServerState::Shutdown;
        }

        info!("Shutting down server...");
        for service in &self.services {
            service.shutdown_dyn().await;
        }
        info!("Server shutdown complete");
    }

    /// Route a request to the appropriate service.
    async fn route_request(&self, method: &str, params: Option<Value>) -> HandlerResult {
        let namespace = method.split('/').next().unwrap_or("");

        // First: exact namespace match
        for service in &self.services {
            if service.namespace_dyn() == namespace {
                return service.handle_dyn(method, params).await;
            }
        }

        // Fallback: try all services for multi-namespace handlers
        // (e.g. WorkspaceService answers config/get)
        for service in &self.services {
            match service.handle_dyn(method, params.clone()).await {
                Err(e) if e.kind() == ErrorKind::MethodNotFound => continue,
                result => return result,
            }
        }

        Err(ApiError::method_not_found(method))
    }
}

impl Default for ShelfServer {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestHandler for ShelfServer {
    async fn handle_request(&self, method: &str, params: Option<Value>) -> HandlerResult {
        let state = *self.state.read();
        if state != ServerState::Running {
            return Err(ApiError::not_ready());
        }

        let result = self.route_request(method, params).await;

        match &result {
            Ok(_) => debug!("{method} ok"),
            Err(e) if e.kind() == ErrorKind::PathEscape => {
                warn!(target: "security", "{method} rejected: {}", e.message);
            }
            Err(e) if e.kind().is_server_fault() => warn!("{method} failed: {}", e.message),
            Err(e) => debug!("{method} -> {}: {}", e.code, e.message),
        }

        result
    }
}
