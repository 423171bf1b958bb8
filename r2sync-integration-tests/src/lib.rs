//! Fixtures shared by the end-to-end tests: a fake public bucket served by
//! actix-web and an on-disk miniflare state directory.

use std::path::{Path, PathBuf};

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use r2sync_local_store::MiniflareR2Layout;
use tokio::runtime::{Builder, Runtime};

pub const BUCKET: &str = "products";

/// Answers by the first path segment: `present/` 200, `empty/` 204,
/// `unchanged/` 304, `broken/` 500, `denied/` 403, anything else 404.
async fn fake_object(req: HttpRequest) -> HttpResponse {
    let path = req.path().trim_start_matches('/');
    match path.split('/').next() {
        Some("present") => HttpResponse::Ok().finish(),
        Some("empty") => HttpResponse::NoContent().finish(),
        Some("unchanged") => HttpResponse::NotModified().finish(),
        Some("broken") => HttpResponse::InternalServerError().finish(),
        Some("denied") => HttpResponse::Forbidden().finish(),
        _ => HttpResponse::NotFound().finish(),
    }
}

pub struct FakeBucket {
    pub base_url: String,
    _runtime: Runtime,
}

impl FakeBucket {
    pub fn start() -> Self {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        runtime.spawn(async move {
            // HttpServer is not Send; only the running Server may live across the await
            let server = {
                let http_server =
                    HttpServer::new(|| App::new().default_service(web::to(fake_object)))
                        .workers(1)
                        .bind(("127.0.0.1", 0))
                        .unwrap();
                tx.send(http_server.addrs()[0].port()).unwrap();
                http_server.run()
            };
            server.await.unwrap();
        });
        let port = rx.recv().unwrap();

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            _runtime: runtime,
        }
    }
}

/// Writes a wrangler.toml pointing at `base_url` and returns its path.
pub fn write_wrangler_toml(dir: &Path, base_url: &str) -> PathBuf {
    let path = dir.join("wrangler.toml");
    let text = format!(
        r#"name = "atelier"
main = "src/index.ts"

[vars]
MEDIA_PUBLIC_BASE_URL = "{}/"

[[r2_buckets]]
binding = "MEDIA"
bucket_name = "{}"
"#,
        base_url, BUCKET
    );
    std::fs::write(&path, text).unwrap();
    path
}

/// Creates `<dir>/state` holding an object index and a blob for every row.
pub fn write_state(dir: &Path, objects: &[(&str, &str)]) -> PathBuf {
    let persist_dir = dir.join("state");
    let layout = MiniflareR2Layout::new(&persist_dir, BUCKET);
    std::fs::create_dir_all(layout.db_dir()).unwrap();
    std::fs::create_dir_all(layout.blobs_dir()).unwrap();

    let db = rusqlite::Connection::open(layout.db_dir().join("index.sqlite")).unwrap();
    db.execute(
        "CREATE TABLE _mf_objects (key TEXT PRIMARY KEY, blob_id TEXT)",
        rusqlite::params![],
    )
    .unwrap();
    for (key, blob_id) in objects {
        db.execute(
            "INSERT INTO _mf_objects (key, blob_id) VALUES (?, ?)",
            rusqlite::params![key, blob_id],
        )
        .unwrap();
        std::fs::write(layout.blob_path(blob_id).unwrap(), key.as_bytes()).unwrap();
    }
    persist_dir
}
