//! Defines the general error type for the crate and various conversions into it
use std::convert;
use std::fmt;

/// General error type for the crate
#[derive(Debug)]
pub enum Error {
    ConflictingFilterError,
    Csv(csv::Error),
    GeoJson(geojson::Error),
    InvalidConfigurationValue(String),
    InvalidGeometryError(String),
    InvalidRadiusError(f64),
    Io(std::io::Error),
    Json(serde_json::Error),
    MissingColumnError(String),
    Other(String),
    Request(reqwest::Error),
    RequestError(reqwest::StatusCode, String),
    RouteParseError(String),
    UnknownServiceHandler(String),
    Xml(quick_xml::Error),
    Yaml(serde_yaml::Error),
}

impl convert::From<csv::Error> for Error {
    fn from(err: csv::Error) -> Error {
        Error::Csv(err)
    }
}

impl convert::From<geojson::Error> for Error {
    fn from(err: geojson::Error) -> Error {
        Error::GeoJson(err)
    }
}

impl convert::From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl convert::From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}

impl convert::From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Error {
        Error::Request(err)
    }
}

impl convert::From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Error {
        Error::Xml(err)
    }
}

impl convert::From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Error {
        Error::Yaml(err)
    }
}

impl convert::From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Error {
        Error::Io(err.error)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConflictingFilterError => write!(
                f,
                "Choose only one status filter: unmapped markers OR mapped markers"
            ),
            Error::Csv(e) => write!(f, "{}", e),
            Error::GeoJson(e) => write!(f, "{}", e),
            Error::InvalidConfigurationValue(msg) => write!(f, "{}", msg),
            Error::InvalidGeometryError(msg) => write!(f, "Invalid geometry: {}", msg),
            Error::InvalidRadiusError(radius) => write!(
                f,
                "Search radius must be a positive number of miles, got: {}",
                radius
            ),
            Error::Io(e) => write!(f, "{}", e),
            Error::Json(e) => write!(f, "{}", e),
            Error::MissingColumnError(column) => {
                write!(f, "Missing expected column in marker table: '{}'", column)
            }
            Error::Other(msg) => write!(f, "{}", msg),
            Error::Request(e) => write!(f, "{}", e),
            Error::RequestError(code, msg) => {
                write!(f, "Request failed with code: {} - {}", code, msg)
            }
            Error::RouteParseError(msg) => write!(f, "Could not load route: {}", msg),
            Error::UnknownServiceHandler(msg) => write!(f, "{}", msg),
            Error::Xml(e) => write!(f, "{}", e),
            Error::Yaml(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}
