//! Shared test utilities
#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;

use cogbot::{CommandRegistry, Config, Database, ServiceHandle};
use serenity::http::Http;

/// Build a service handle without touching the network
#[must_use]
pub fn service_handle(config: Config) -> ServiceHandle {
    let database = config.database.as_ref().map(Database::connect_lazy);
    ServiceHandle::new(
        Arc::new(config),
        Arc::new(Http::new("")),
        database,
        CommandRegistry::new(),
    )
}

/// Build an in-memory ZIP archive from `(path, content)` pairs
#[must_use]
pub fn build_archive(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in files {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .expect("failed to start archive entry");
        writer.write_all(content).expect("failed to write archive entry");
    }
    writer
        .finish()
        .expect("failed to finish archive")
        .into_inner()
}

/// Serve a router on an ephemeral local port, returning its base URL
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test server");
    let addr = listener.local_addr().expect("no local address");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("test server failed");
    });
    format!("http://{addr}")
}

/// Sorted `(relative path, bytes)` of every file under `dir`
#[must_use]
pub fn list_files(dir: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<_> = walkdir::WalkDir::new(dir)
        .into_iter()
        .flatten()
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e
                .path()
                .strip_prefix(dir)
                .expect("entry outside dir")
                .to_string_lossy()
                .into_owned();
            (rel, std::fs::read(e.path()).expect("failed to read file"))
        })
        .collect();
    files.sort();
    files
}
