/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright (c) 2022, Clemens Lutz <lutzcle@cml.li>
 * Author: Clemens Lutz <lutzcle@cml.li>
 */

use bench_runtime::error::Error as BenchRuntimeError;
use datagen::error::Error as DatagenError;
use sql_ops::error::Error as SqlOpsError;
use std::convert::From;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum ErrorKind {
    BenchRuntimeError(BenchRuntimeError),
    CsvError(csv::Error),
    DatagenError(DatagenError),
    IntegerOverflow(String),
    InvalidArgument(String),
    IoError(::std::io::Error),
    SqlOpsError(SqlOpsError),
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.kind, f)
    }
}

impl From<BenchRuntimeError> for Error {
    fn from(error: BenchRuntimeError) -> Self {
        Self {
            kind: ErrorKind::BenchRuntimeError(error),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self {
            kind: ErrorKind::CsvError(error),
        }
    }
}

impl From<DatagenError> for Error {
    fn from(error: DatagenError) -> Self {
        Self {
            kind: ErrorKind::DatagenError(error),
        }
    }
}

impl From<::std::io::Error> for Error {
    fn from(error: ::std::io::Error) -> Self {
        Self {
            kind: ErrorKind::IoError(error),
        }
    }
}

impl From<SqlOpsError> for Error {
    fn from(error: SqlOpsError) -> Self {
        Self {
            kind: ErrorKind::SqlOpsError(error),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self { kind }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::BenchRuntimeError(ref e) => std::fmt::Display::fmt(e, f),
            ErrorKind::CsvError(ref e) => std::fmt::Display::fmt(e, f),
            ErrorKind::DatagenError(ref e) => std::fmt::Display::fmt(e, f),
            ErrorKind::IntegerOverflow(ref s) => write!(f, "Integer overflow: {}", s),
            ErrorKind::InvalidArgument(ref s) => write!(f, "Invalid argument: {}", s),
            ErrorKind::IoError(ref e) => std::fmt::Display::fmt(e, f),
            ErrorKind::SqlOpsError(ref e) => std::fmt::Display::fmt(e, f),
        }
    }
}
