// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use pointmoney_store::config::{Config, LogFormat};
use pointmoney_store::state::AppState;
use pointmoney_store::storage::repository::UserRole;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.log_format);

    let state = match AppState::open(&config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(
                path = %config.database_path().display(),
                error = %e,
                "Failed to open store"
            );
            return ExitCode::FAILURE;
        }
    };

    let users = state.users.get_all();
    let admins = users
        .values()
        .filter(|u| u.role == UserRole::Admin)
        .count();

    tracing::info!(
        path = %config.database_path().display(),
        prefix = %state.store.namespace().prefix(),
        scheme = ?config.password_scheme,
        users = users.len(),
        admins,
        credentials = state.credentials.get_credentials().len(),
        point_transactions = state.points.get_all().len(),
        pending_withdrawals = state.withdrawals.get_pending().len(),
        "Store ready"
    );

    ExitCode::SUCCESS
}
