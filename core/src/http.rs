//! HTTP vocabulary shared by requests and transports.
//!
//! # Design
//! Both enums are closed sets. Parsing from strings is the only place an
//! unknown value can enter, so `FromStr` is where `InvalidMethod` and
//! `InvalidContentType` are raised. Serde goes through the same string forms
//! so configuration files read the way the wire does.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KnockError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = KnockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            _ => Err(KnockError::InvalidMethod(s.to_string())),
        }
    }
}

/// MIME type of the request body.
///
/// Only `Json` changes how the body is encoded; every other variant hands
/// the data fields to the transport as they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ContentType {
    #[default]
    Json,
    Xml,
    Form,
    Multipart,
    Text,
    Html,
    Javascript,
    Css,
    Csv,
    Pdf,
    Zip,
    Gzip,
    Tar,
    Rar,
    SevenZip,
    Image,
    Audio,
    Video,
    Font,
    Any,
}

const MIME_TABLE: [(ContentType, &str); 20] = [
    (ContentType::Json, "application/json"),
    (ContentType::Xml, "application/xml"),
    (ContentType::Form, "application/x-www-form-urlencoded"),
    (ContentType::Multipart, "multipart/form-data"),
    (ContentType::Text, "text/plain"),
    (ContentType::Html, "text/html"),
    (ContentType::Javascript, "application/javascript"),
    (ContentType::Css, "text/css"),
    (ContentType::Csv, "text/csv"),
    (ContentType::Pdf, "application/pdf"),
    (ContentType::Zip, "application/zip"),
    (ContentType::Gzip, "application/gzip"),
    (ContentType::Tar, "application/x-tar"),
    (ContentType::Rar, "application/x-rar-compressed"),
    (ContentType::SevenZip, "application/x-7z-compressed"),
    (ContentType::Image, "image/*"),
    (ContentType::Audio, "audio/*"),
    (ContentType::Video, "video/*"),
    (ContentType::Font, "font/*"),
    (ContentType::Any, "*/*"),
];

impl ContentType {
    pub fn mime(&self) -> &'static str {
        MIME_TABLE
            .iter()
            .find(|(ct, _)| ct == self)
            .map(|(_, mime)| *mime)
            .unwrap_or("*/*")
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

impl FromStr for ContentType {
    type Err = KnockError;

    /// Parameters such as `; charset=utf-8` are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let essence = s.split(';').next().unwrap_or("").trim();
        MIME_TABLE
            .iter()
            .find(|(_, mime)| mime.eq_ignore_ascii_case(essence))
            .map(|(ct, _)| *ct)
            .ok_or_else(|| KnockError::InvalidContentType(s.to_string()))
    }
}

impl TryFrom<String> for ContentType {
    type Error = KnockError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContentType> for String {
    fn from(ct: ContentType) -> Self {
        ct.mime().to_string()
    }
}
