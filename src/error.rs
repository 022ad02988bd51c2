// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Error taxonomy for the sensor engine
//!
//! None of these errors terminate the process. Read and scan failures are
//! logged and the previous value is retained; configuration errors drop only
//! the offending sensor.

use thiserror::Error;

/// Failure of the primitive underneath a sensor or scanner
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("no device responding at address {0:#04x}")]
    NoDevice(u8),

    #[error("bus I/O failed: {0}")]
    Io(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("HTTP request returned status {0}")]
    Status(u16),
}

/// A device or network read failed
#[derive(Error, Debug, Clone, PartialEq)]
#[error("failed to read \"{source_name}\": {cause}")]
pub struct ReadError {
    pub source_name: String,
    #[source]
    pub cause: TransportError,
}

impl ReadError {
    pub fn new(source_name: &str, cause: TransportError) -> Self {
        Self {
            source_name: source_name.to_string(),
            cause,
        }
    }
}

/// A scanner payload could not be turned into a result
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("payload contained no usable rows")]
    Empty,

    #[error("element `{0}` not found in document")]
    MissingElement(String),
}

/// One failed fetch-and-parse attempt of a background scanner
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("failed to parse {scanner} payload: {source}")]
    Parse {
        scanner: String,
        #[source]
        source: ParseError,
    },
}

impl ScanError {
    pub fn parse(scanner: &str, source: ParseError) -> Self {
        Self::Parse {
            scanner: scanner.to_string(),
            source,
        }
    }
}

/// A sensor declaration could not be turned into a live sensor
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("unknown sensor type \"{0}\"")]
    UnknownSensorType(String),

    #[error("sensor \"{name}\" has invalid bus address {address:#04x}")]
    InvalidAddress { name: String, address: u8 },

    #[error("sensor \"{name}\" could not be initialised: {cause}")]
    Unavailable {
        name: String,
        #[source]
        cause: TransportError,
    },
}
