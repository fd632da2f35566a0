//! Common test utilities for gallery-fetch integration tests

#![allow(dead_code)]

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use gallery_fetch::Config;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Gallery id served by [`GalleryServer`]
pub const GALLERY_ID: &str = "4242";

/// Deterministic payload for an item
pub fn item_bytes(name: &str) -> Vec<u8> {
    format!("image bytes of {name}").into_bytes()
}

/// Mock image host serving `/<GALLERY_ID>/<item>`
pub struct GalleryServer {
    pub server: MockServer,
}

impl GalleryServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Serve `name` with [`item_bytes`]
    pub async fn serve(&self, name: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/{GALLERY_ID}/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(item_bytes(name)))
            .mount(&self.server)
            .await;
    }

    /// Answer `name` with `status`, expecting exactly `attempts` requests
    pub async fn fail(&self, name: &str, status: u16, attempts: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/{GALLERY_ID}/{name}")))
            .respond_with(ResponseTemplate::new(status))
            .expect(attempts)
            .mount(&self.server)
            .await;
    }

    /// Fail the first `failures` requests for `name`, then serve it
    pub async fn flaky(&self, name: &str, failures: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/{GALLERY_ID}/{name}")))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(failures)
            .with_priority(1)
            .mount(&self.server)
            .await;
        self.serve(name).await;
    }

    /// Config pointing at this server and writing under `dir`
    pub fn config(&self, dir: &Path) -> Config {
        let mut config = Config::new(GALLERY_ID, self.server.uri());
        config.workers = 3;
        config.max_attempts = 2;
        config.http.timeout = Duration::from_secs(5);
        config.output.dir = dir.to_path_buf();
        config
    }
}

/// Read every entry of a zip archive as `(name, bytes)`, in archive order
pub fn read_archive(path: &Path) -> Vec<(String, Vec<u8>)> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            (entry.name().to_string(), data)
        })
        .collect()
}
