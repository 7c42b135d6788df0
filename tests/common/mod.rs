//! Shared fixtures for the end-to-end tests
//!
//! A small two-route application: `home` and `about` chunks plus a shared
//! vendor chunk, with the module payloads a render pass would resolve.

use splitload::{
    loader_fn, AssetSource, Chunk, ChunkModule, Compilation, LoadError, Loader, ModuleIdentity,
};
use indexmap::IndexMap;
use std::time::Duration;

/// A rendered module as the tests model it
pub type Module = &'static str;

/// Loader resolving `payload` after `ms` milliseconds
pub fn slow_loader(ms: u64, payload: Module) -> Loader<Module> {
    loader_fn(move || async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(payload)
    })
}

/// Loader failing with `message` after `ms` milliseconds
pub fn failing_loader(ms: u64, message: &'static str) -> Loader<Module> {
    loader_fn(move || async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Err(LoadError::failed(message))
    })
}

fn module(id: i64, name: &str, request: &str) -> ChunkModule {
    ChunkModule {
        identity: ModuleIdentity {
            id: Some(id),
            name: Some(name.to_string()),
            raw_request: request.to_string(),
        },
        concatenation_root: None,
    }
}

fn chunk(name: &str, files: &[&str], modules: Vec<ChunkModule>) -> Chunk {
    Chunk {
        name: Some(name.to_string()),
        files: files.iter().map(|file| file.to_string()).collect(),
        modules,
    }
}

/// The two-route application's compilation snapshot
pub fn sample_compilation() -> Compilation {
    let mut assets = IndexMap::new();
    assets.insert(
        String::from("home.js"),
        AssetSource {
            content: String::from("render home"),
            hash: Some(String::from("h0me")),
        },
    );
    assets.insert(
        String::from("about.js"),
        AssetSource {
            content: String::from("render about"),
            hash: Some(String::from("ab0ut")),
        },
    );
    assets.insert(
        String::from("vendor.js"),
        AssetSource {
            content: String::from("vendor blob"),
            hash: Some(String::from("v3nd0r")),
        },
    );

    Compilation {
        public_path: String::from("/assets/"),
        chunks: vec![
            chunk(
                "home",
                &["home.js", "vendor.js"],
                vec![module(1, "home", "./routes/Home")],
            ),
            chunk(
                "about",
                &["about.js", "vendor.js"],
                vec![module(2, "about", "./routes/About")],
            ),
        ],
        assets,
    }
}
