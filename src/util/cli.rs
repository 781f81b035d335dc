/* This file is part of DarkFi (https://dark.fi)
 *
 * Copyright (C) 2020-2025 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::path::Path;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;

use crate::{Error, Result};

#[macro_export]
macro_rules! cli_desc {
    () => {{
        let mut desc = env!("CARGO_PKG_DESCRIPTION").to_string();
        desc.push_str("\n");
        desc.push_str(env!("CARGO_PKG_VERSION"));
        Box::leak(desc.into_boxed_str()) as &'static str
    }};
}

/// Map a `-v` occurrence count onto a log level.
pub fn log_level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global `tracing` subscriber. Logs go to stderr, or to
/// `log_file` when one is given. The returned guard must be held for
/// as long as file logging should be flushed.
pub fn init_logger(verbosity: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = log_level(verbosity);

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| Error::SetLoggerError(e.to_string()))?;
        return Ok(None)
    };

    let (dir, file) = match (path.parent(), path.file_name()) {
        (Some(dir), Some(file)) => (dir, file),
        _ => return Err(Error::ConfigurationError(format!("Invalid log file path {path:?}"))),
    };

    let appender = tracing_appender::rolling::never(dir, file);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(|e| Error::SetLoggerError(e.to_string()))?;

    Ok(Some(guard))
}
