use super::{
    error::{ResponseError, ResponseErrorKind, Result},
    prepared::{Payload, PreparedRequest},
    response::Response,
};
use anyhow::Error as AnyError;
use http::{HeaderName, HeaderValue, StatusCode, Version};
use log::debug;
use std::{
    fmt::{self, Debug, Display},
    io::{Error as IoError, ErrorKind as IoErrorKind, Read},
    time::Duration,
};
use ureq::{
    Agent, AgentBuilder, Error as UreqError, ErrorKind as UreqErrorKind, Request as UreqRequest,
    Response as UreqResponse,
};

/// HTTP 请求处理接口
///
/// 实现该接口，即可替换请求构建器使用的 HTTP 客户端。实现者负责跟随重定向。
pub trait HttpCaller: Debug + Send + Sync {
    /// 阻塞发送 HTTP 请求
    fn call(&self, request: &PreparedRequest) -> Result<Response>;
}

const DEFAULT_REDIRECTS: u32 = 5;

/// Ureq 客户端
#[derive(Clone)]
pub struct UreqCaller {
    agent: Agent,
}

impl UreqCaller {
    /// 创建 Ureq 客户端
    #[inline]
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }

    /// 创建 Ureq 客户端构建器
    #[inline]
    pub fn builder() -> UreqCallerBuilder {
        UreqCallerBuilder::default()
    }
}

impl Default for UreqCaller {
    #[inline]
    fn default() -> Self {
        Self::builder().build()
    }
}

impl From<Agent> for UreqCaller {
    #[inline]
    fn from(agent: Agent) -> Self {
        Self::new(agent)
    }
}

impl Debug for UreqCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqCaller").finish()
    }
}

/// Ureq 客户端构建器
#[derive(Debug, Clone)]
pub struct UreqCallerBuilder {
    redirects: u32,
    user_agent: String,
    timeout: Option<Duration>,
}

impl Default for UreqCallerBuilder {
    #[inline]
    fn default() -> Self {
        Self {
            redirects: DEFAULT_REDIRECTS,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            timeout: None,
        }
    }
}

impl UreqCallerBuilder {
    /// 设置最大重定向次数
    ///
    /// 重定向总是被跟随，因此不能关闭：传入 0 时会被替换为默认的 5 次
    #[inline]
    #[must_use]
    pub fn redirects(mut self, redirects: u32) -> Self {
        self.redirects = if redirects == 0 { DEFAULT_REDIRECTS } else { redirects };
        self
    }

    /// 设置默认 UserAgent，请求中的 `User-Agent` 头优先
    #[inline]
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// 设置整体超时时长
    #[inline]
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// 构建 Ureq 客户端
    pub fn build(self) -> UreqCaller {
        let mut builder = AgentBuilder::new()
            .redirects(self.redirects)
            .user_agent(&self.user_agent);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        UreqCaller::new(builder.build())
    }
}

impl HttpCaller for UreqCaller {
    fn call(&self, request: &PreparedRequest) -> Result<Response> {
        let payload = request.payload()?;
        let mut ureq_request = make_ureq_request(&self.agent, request)?;
        debug!("{} {}", request.method(), request.url());

        let result = match payload {
            Payload::Empty => ureq_request.call(),
            Payload::Raw(body) => ureq_request.send_bytes(&body),
            Payload::Form(form) => {
                if !request.header_params().contains_ignore_case("Content-Type") {
                    ureq_request = ureq_request.set("Content-Type", mime::APPLICATION_WWW_FORM_URLENCODED.as_ref());
                }
                ureq_request.send_string(&form)
            }
            Payload::Multipart { content_type, body } => ureq_request
                .set("Content-Type", &content_type)
                .send_bytes(&body),
        };
        let response = match result {
            Ok(response) => make_response(response, request)?,
            Err(err) => {
                let kind = err.kind();
                match err {
                    UreqError::Status(_, response) => make_response(response, request)?,
                    UreqError::Transport(transport) => {
                        return Err(from_ureq_error(kind, AnyError::new(transport), request).into())
                    }
                }
            }
        };
        debug!("{} {} -> {}", request.method(), request.url(), response.status_code());
        Ok(response)
    }
}

fn make_ureq_request(agent: &Agent, request: &PreparedRequest) -> Result<UreqRequest> {
    let mut ureq_request = agent.request(request.method().as_str(), request.url().as_str());
    for (name, value) in request.header_params().iter() {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            return Err(build_header_name_error(request, name, &"illegal characters").into());
        }
        if HeaderValue::from_str(value).is_err() {
            return Err(build_header_value_error(request, value, &"illegal characters").into());
        }
        ureq_request = ureq_request.set(name, value);
    }
    Ok(ureq_request)
}

fn make_response(response: UreqResponse, request: &PreparedRequest) -> Result<Response> {
    let mut builder = Response::builder()
        .status_code(status_code_of_response(&response, request)?)
        .version(parse_http_version(response.http_version(), request)?)
        .url(response.get_url());
    for header_name_str in response.headers_names() {
        let header_name = HeaderName::from_bytes(header_name_str.as_bytes())
            .map_err(|err| build_header_name_error(request, &header_name_str, &err))?;
        for header_value_str in response.all(&header_name_str) {
            let header_value = HeaderValue::from_str(header_value_str)
                .map_err(|err| build_header_value_error(request, header_value_str, &err))?;
            builder = builder.header(header_name.to_owned(), header_value);
        }
    }
    let mut body = Vec::new();
    response.into_reader().read_to_end(&mut body).map_err(|err| {
        ResponseError::builder(ResponseErrorKind::LocalIoError, err)
            .uri(request.url())
            .build()
    })?;
    Ok(builder.body(body).build())
}

fn build_status_code_error(request: &PreparedRequest, code: u16, err: &dyn Display) -> ResponseError {
    ResponseError::builder_with_msg(
        ResponseErrorKind::InvalidRequestResponse,
        format!("invalid status code({}): {}", code, err),
    )
    .uri(request.url())
    .build()
}

fn build_header_name_error(request: &PreparedRequest, header_name: &str, err: &dyn Display) -> ResponseError {
    ResponseError::builder_with_msg(
        ResponseErrorKind::InvalidHeader,
        format!("invalid header name({}): {}", header_name, err),
    )
    .uri(request.url())
    .build()
}

fn build_header_value_error(request: &PreparedRequest, header_value: &str, err: &dyn Display) -> ResponseError {
    ResponseError::builder_with_msg(
        ResponseErrorKind::InvalidHeader,
        format!("invalid header value({}): {}", header_value, err),
    )
    .uri(request.url())
    .build()
}

fn status_code_of_response(response: &UreqResponse, request: &PreparedRequest) -> Result<StatusCode> {
    StatusCode::from_u16(response.status())
        .map_err(|err| build_status_code_error(request, response.status(), &err).into())
}

fn parse_http_version(version: &str, request: &PreparedRequest) -> Result<Version> {
    match version {
        "HTTP/0.9" => Ok(Version::HTTP_09),
        "HTTP/1.0" => Ok(Version::HTTP_10),
        "HTTP/1.1" => Ok(Version::HTTP_11),
        "HTTP/2.0" => Ok(Version::HTTP_2),
        "HTTP/3.0" => Ok(Version::HTTP_3),
        _ => Err(ResponseError::builder_with_msg(
            ResponseErrorKind::InvalidRequestResponse,
            format!("invalid http version: {}", version),
        )
        .uri(request.url())
        .build()
        .into()),
    }
}

fn from_ureq_error(kind: UreqErrorKind, err: AnyError, request: &PreparedRequest) -> ResponseError {
    #[allow(unreachable_patterns)]
    let response_error_kind = match kind {
        UreqErrorKind::InvalidUrl => ResponseErrorKind::InvalidUrl,
        UreqErrorKind::UnknownScheme => ResponseErrorKind::InvalidUrl,
        UreqErrorKind::Dns => ResponseErrorKind::DnsServerError,
        UreqErrorKind::ConnectionFailed => ResponseErrorKind::ConnectError,
        UreqErrorKind::TooManyRedirects => ResponseErrorKind::TooManyRedirect,
        UreqErrorKind::BadStatus => ResponseErrorKind::InvalidRequestResponse,
        UreqErrorKind::BadHeader => ResponseErrorKind::InvalidHeader,
        UreqErrorKind::Io if is_timed_out(&err) => ResponseErrorKind::TimeoutError,
        UreqErrorKind::Io => ResponseErrorKind::LocalIoError,
        UreqErrorKind::InvalidProxyUrl => ResponseErrorKind::ProxyError,
        UreqErrorKind::ProxyConnect => ResponseErrorKind::ProxyError,
        UreqErrorKind::ProxyUnauthorized => ResponseErrorKind::ProxyError,
        UreqErrorKind::HTTP => ResponseErrorKind::InvalidRequestResponse,
        UreqErrorKind::InsecureRequestHttpsOnly => ResponseErrorKind::SslError,
        _ => ResponseErrorKind::UnknownError,
    };
    ResponseError::builder(response_error_kind, err)
        .uri(request.url())
        .build()
}

fn is_timed_out(err: &AnyError) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<IoError>()
            .map_or(false, |err| matches!(err.kind(), IoErrorKind::TimedOut | IoErrorKind::WouldBlock))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, Method};
    use url::Url;

    #[test]
    fn test_parse_http_version() {
        let request = PreparedRequest::new(Method::GET, Url::parse("http://127.0.0.1/").unwrap());
        assert_eq!(parse_http_version("HTTP/1.1", &request).unwrap(), Version::HTTP_11);
        assert_eq!(parse_http_version("HTTP/2.0", &request).unwrap(), Version::HTTP_2);
        match parse_http_version("SPDY/3", &request) {
            Err(Error::Response(err)) => {
                assert_eq!(err.kind(), ResponseErrorKind::InvalidRequestResponse);
                assert_eq!(err.uri(), Some("http://127.0.0.1/"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_map_ureq_error_kind() {
        let request = PreparedRequest::new(Method::GET, Url::parse("http://127.0.0.1/").unwrap());
        let err = from_ureq_error(UreqErrorKind::ConnectionFailed, AnyError::msg("refused"), &request);
        assert_eq!(err.kind(), ResponseErrorKind::ConnectError);
        let err = from_ureq_error(UreqErrorKind::TooManyRedirects, AnyError::msg("loop"), &request);
        assert_eq!(err.kind(), ResponseErrorKind::TooManyRedirect);
        let err = from_ureq_error(UreqErrorKind::Io, AnyError::msg("broken pipe"), &request);
        assert_eq!(err.kind(), ResponseErrorKind::LocalIoError);
    }

    #[test]
    fn test_io_timeout_is_timeout_error() {
        let request = PreparedRequest::new(Method::GET, Url::parse("http://127.0.0.1/").unwrap());
        let timed_out = AnyError::new(IoError::new(IoErrorKind::TimedOut, "timed out reading response"));
        let err = from_ureq_error(UreqErrorKind::Io, timed_out, &request);
        assert_eq!(err.kind(), ResponseErrorKind::TimeoutError);

        let wrapped = AnyError::new(IoError::new(IoErrorKind::WouldBlock, "read timeout")).context("reading body");
        let err = from_ureq_error(UreqErrorKind::Io, wrapped, &request);
        assert_eq!(err.kind(), ResponseErrorKind::TimeoutError);
    }

    #[test]
    fn test_zero_redirects_falls_back_to_default() {
        assert_eq!(UreqCallerBuilder::default().redirects, DEFAULT_REDIRECTS);
        assert_eq!(UreqCaller::builder().redirects(0).redirects, DEFAULT_REDIRECTS);
        assert_eq!(UreqCaller::builder().redirects(2).redirects, 2);
    }

    #[test]
    fn test_connection_refused_is_transport_error() {
        env_logger::builder().is_test(true).try_init().ok();

        // 端口 1 上没有服务
        let request = PreparedRequest::new(Method::GET, Url::parse("http://127.0.0.1:1/").unwrap());
        match UreqCaller::default().call(&request) {
            Err(Error::Response(err)) => assert_eq!(err.uri(), Some("http://127.0.0.1:1/")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_reject_illegal_header_name() {
        let mut request = PreparedRequest::new(Method::GET, Url::parse("http://127.0.0.1:1/").unwrap());
        request.headers(&crate::Params::from([("bad header", "v")]));
        match UreqCaller::default().call(&request) {
            Err(Error::Response(err)) => assert_eq!(err.kind(), ResponseErrorKind::InvalidHeader),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
