use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use std::fmt;
use std::io::Cursor;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    ConnectionError(String),
    ApiError(String),
    Timeout,
    UnexpectedApiResponse,
    InvalidResponse(String, String),
    UnknownDeviceKind(u64),
    NoData,
    FormatError,
    InternalError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConnectionError(s) => write!(f, "unable to reach inverter: {}", s),
            Error::ApiError(s) => write!(f, "inverter API error: {}", s),
            Error::Timeout => write!(f, "timed out waiting for inverter"),
            Error::UnexpectedApiResponse => write!(f, "unexpected inverter API response"),
            Error::InvalidResponse(body, e) => {
                write!(f, "invalid inverter API response ({}): {}", e, body)
            }
            Error::UnknownDeviceKind(code) => write!(f, "unknown device kind: {}", code),
            Error::NoData => write!(f, "no data collected yet"),
            Error::FormatError => write!(f, "unable to format output"),
            Error::InternalError => write!(f, "internal error"),
        }
    }
}

impl std::error::Error for Error {}

/// Escape text for an HTML element body. `&` goes first so entities are not doubled.
fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn page(status: Status, title: &str, body: &str) -> String {
    format!(
        "<html><body><h3>{} {}</h3><code>{}</code></body></html>",
        status.code,
        title,
        escape(body)
    )
}

fn html(status: Status, title: &str, body: String) -> response::Result<'static> {
    let page = page(status, title, &body);
    Response::build()
        .status(status)
        .sized_body(page.len(), Cursor::new(page))
        .header(ContentType::new("text", "html"))
        .ok()
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        match self {
            Error::ConnectionError(_) | Error::ApiError(_) | Error::InvalidResponse(_, _) => {
                html(Status::BadGateway, "Bad Gateway", self.to_string())
            }
            Error::Timeout => html(Status::GatewayTimeout, "Gateway Timeout", self.to_string()),
            Error::NoData => html(
                Status::ServiceUnavailable,
                "Service Unavailable",
                self.to_string(),
            ),
            _ => html(
                Status::InternalServerError,
                "Unknown exception",
                format!("{:?}", self),
            ),
        }
    }
}
