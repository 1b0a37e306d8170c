#![allow(dead_code)]

use axum::Router;
use ms3_client::{
    ClientBuilder, ObjectStoreClient, WaiterConfig, routes::routes::app,
    services::storage_service::StorageService,
};
use std::time::Duration;
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_router(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/", addr)
}

/// Start the in-memory reference server.
pub async fn spawn_server() -> (String, StorageService) {
    let service = StorageService::new();
    let base = spawn_router(app(service.clone())).await;
    (base, service)
}

pub fn client_for(base: &str) -> ObjectStoreClient {
    ClientBuilder::default()
        .server_url(base)
        .waiter_config(WaiterConfig {
            delay: Duration::from_millis(10),
            max_attempts: 50,
        })
        .build()
        .unwrap()
}
