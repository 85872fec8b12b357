// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Coverage Engine: aggregate protection benefits across cards, plans and policies
//!
//! This crate hydrates a static catalog of credit cards and protection plans,
//! combines it with a user's selection and uploaded insurance policies, and
//! answers per-category coverage questions. Each user's selection is kept in
//! a versioned, per-identity durable record.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;

use std::sync::Arc;

use config::{Config, StorageBackend};
use db::StorageDb;
use error::Result;
use services::{Catalog, SelectionStore};

/// Shared process state.
pub struct CoverageContext {
    pub config: Config,
    pub catalog: Arc<Catalog>,
    pub store: SelectionStore,
}

impl CoverageContext {
    /// Load the catalog, open storage and (if configured) run the startup sweep.
    pub async fn open(config: Config) -> Result<Self> {
        let catalog = match &config.catalog_dir {
            Some(dir) => {
                tracing::info!(path = %dir.display(), "Loading catalog from directory");
                Catalog::load_from_dir(dir)?
            }
            None => Catalog::builtin()?,
        };

        let storage = match config.storage_backend {
            StorageBackend::Memory => StorageDb::new_memory(),
            StorageBackend::File => StorageDb::open_dir(&config.storage_dir).await?,
        };
        let store = SelectionStore::new(storage);

        if config.sweep_on_start {
            // Cleanup only; a failure here must not block startup
            if let Err(e) = store.startup_sweep().await {
                tracing::warn!(error = %e, "Startup sweep failed");
            }
        }

        Ok(Self {
            config,
            catalog: Arc::new(catalog),
            store,
        })
    }
}
