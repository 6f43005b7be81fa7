// Copyright (C) 2025 Category Labs, Inc.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Converts cluster monitor event logs into Chrome trace JSON so resource
//! outages and e2e test runs can be inspected on a timeline.

use thiserror::Error;

pub mod classify;
pub mod config;
pub mod convert;
pub mod duration;
pub mod intervals;
pub mod record;
pub mod registry;
pub mod translator;

pub use convert::{convert, Summary};
pub use record::{decode_line, DecodeError, LogRecord, Severity};
pub use translator::{LineTranslator, TranslatorOptions};

#[derive(Error, Debug)]
pub enum Error {
    #[error("line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: DecodeError,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("trace output error: {0}")]
    Trace(#[from] chrome_trace_format::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
