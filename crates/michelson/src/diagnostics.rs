// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

//! Optional `slog` diagnostics. The core is a pure, synchronous library
//! and must not force a logging backend on callers, so this is entirely
//! feature-gated: with `slog` disabled every call here compiles away to
//! nothing; callers who want visibility into decode/walk failures
//! enable the feature and install a logger once at startup, the way a
//! host binary wires up its root `slog::Logger` before spawning
//! workers.

#[cfg(feature = "slog")]
mod enabled {
    use std::sync::RwLock;

    lazy_static::lazy_static! {
        static ref LOGGER: RwLock<Option<slog::Logger>> = RwLock::new(None);
    }

    pub fn set_logger(logger: slog::Logger) {
        *LOGGER.write().expect("diagnostics logger lock poisoned") = Some(logger);
    }

    pub fn log_debug(message: &str, err: &dyn std::fmt::Display) {
        if let Some(logger) = LOGGER.read().expect("diagnostics logger lock poisoned").as_ref() {
            slog::debug!(logger, "{}", message; "error" => %err);
        }
    }
}

#[cfg(not(feature = "slog"))]
mod disabled {
    pub fn log_debug(_message: &str, _err: &dyn std::fmt::Display) {}
}

#[cfg(feature = "slog")]
pub use enabled::{log_debug, set_logger};

#[cfg(not(feature = "slog"))]
pub use disabled::log_debug;
