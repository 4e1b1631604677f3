#![deny(
    missing_debug_implementations,
    absolute_paths_not_starting_with_crate,
    anonymous_parameters,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    meta_variable_misuse,
    missing_docs,
    non_ascii_idents,
    trivial_numeric_casts,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces,
    unused_lifetimes
)]

//! # api-request
//!
//! ## HTTP 请求构建器
//!
//! 针对固定基础地址，逐步设置 HTTP 方法、路径、HTTP 头、请求体、查询参数、表单参数、Cookie 和至多一个附件，
//! 然后阻塞发送请求并返回响应。
//!
//! 底层 HTTP 客户端通过 [`HttpCaller`] 接口接入，默认使用基于 Ureq 的 [`UreqCaller`]。
//! 连接池、TLS、重定向和响应解析均由底层客户端负责。

mod attachment;
mod caller;
mod cookie;
mod error;
mod method;
mod multipart;
mod params;
mod prepared;
mod request;
mod response;

pub use attachment::{Attachment, FilePath, FileSource, InMemory};
pub use caller::{HttpCaller, UreqCaller, UreqCallerBuilder};
pub use cookie::Cookie;
pub use error::{Error, ResponseError, ResponseErrorBuilder, ResponseErrorKind, Result};
pub use method::{InvalidMethod, Method};
pub use multipart::{Multipart, Part, PartMetadata};
pub use params::Params;
pub use prepared::{Payload, PreparedRequest};
pub use request::Request;
pub use response::{Response, ResponseBuilder};

pub use http;
pub use ureq;
pub use url;
