use super::method::InvalidMethod;
use anyhow::Error as AnyError;
use std::{
    error::Error as StdError,
    fmt::{self, Debug, Display},
    io::Error as IoError,
};
use thiserror::Error;

/// 请求构建器错误
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// 非法的 HTTP 方法
    #[error(transparent)]
    InvalidMethod(#[from] InvalidMethod),

    /// 尚未调用 `build()` 就发送请求
    #[error("request specification is not built, call build() before send()")]
    NotBuilt,

    /// 尚未设置 HTTP 头
    #[error("headers are not set")]
    NoHeaders,

    /// 基础地址与路径拼接后不是合法的 URL
    #[error("invalid url({url}): {source}")]
    InvalidUrl {
        /// 拼接后的 URL
        url: String,
        /// 解析错误
        #[source]
        source: url::ParseError,
    },

    /// 读取附件失败
    #[error("failed to read attachment {path}: {source}")]
    Attachment {
        /// 附件数据源描述
        path: String,
        /// IO 错误
        #[source]
        source: IoError,
    },

    /// 同时设置了两种不能一起发送的请求体
    #[error("{first} and {second} cannot be sent in the same request")]
    ConflictingPayload {
        /// 先被折叠的部分
        first: &'static str,
        /// 与之冲突的部分
        second: &'static str,
    },

    /// HTTP 调用失败
    #[error(transparent)]
    Response(#[from] ResponseError),
}

/// HTTP 调用错误类型
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResponseErrorKind {
    /// 非法的请求 / 响应错误
    InvalidRequestResponse,

    /// 非法的 URL
    InvalidUrl,

    /// 非法的 HTTP 头
    InvalidHeader,

    /// 网络连接失败
    ConnectError,

    /// 代理连接失败
    ProxyError,

    /// 域名解析失败
    DnsServerError,

    /// 本地 IO 失败
    LocalIoError,

    /// 超时失败
    TimeoutError,

    /// SSL 错误
    SslError,

    /// 重定向次数过多
    TooManyRedirect,

    /// 未知错误
    UnknownError,
}

/// HTTP 调用错误
///
/// 由 [`crate::HttpCaller`] 的实现返回，请求构建器不做任何转换或重试
pub struct ResponseError {
    kind: ResponseErrorKind,
    error: AnyError,
    uri: Option<String>,
}

/// HTTP 调用错误构建器
#[derive(Debug)]
pub struct ResponseErrorBuilder {
    inner: ResponseError,
}

impl ResponseError {
    /// 创建 HTTP 调用错误构建器
    #[inline]
    pub fn builder(kind: ResponseErrorKind, err: impl Into<AnyError>) -> ResponseErrorBuilder {
        ResponseErrorBuilder {
            inner: Self {
                kind,
                error: err.into(),
                uri: None,
            },
        }
    }

    /// 使用错误信息创建 HTTP 调用错误构建器
    #[inline]
    pub fn builder_with_msg(kind: ResponseErrorKind, msg: impl Display + Debug + Send + Sync + 'static) -> ResponseErrorBuilder {
        ResponseErrorBuilder {
            inner: Self {
                kind,
                error: AnyError::msg(msg),
                uri: None,
            },
        }
    }

    /// 获取 HTTP 调用错误类型
    #[inline]
    pub fn kind(&self) -> ResponseErrorKind {
        self.kind
    }

    /// 获取请求 URL
    #[inline]
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// 转换为内部错误
    #[inline]
    pub fn into_inner(self) -> AnyError {
        self.error
    }
}

impl ResponseErrorBuilder {
    /// 设置请求 URL
    #[inline]
    #[must_use]
    pub fn uri(mut self, uri: impl Display) -> Self {
        self.inner.uri = Some(uri.to_string());
        self
    }

    /// 构建 HTTP 调用错误
    #[inline]
    pub fn build(self) -> ResponseError {
        self.inner
    }
}

impl Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}]", self.kind)?;
        if let Some(uri) = &self.uri {
            write!(f, "[{}]", uri)?;
        }
        write!(f, " {}", self.error)
    }
}

impl Debug for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseError")
            .field("kind", &self.kind)
            .field("error", &self.error)
            .field("uri", &self.uri)
            .finish()
    }
}

impl StdError for ResponseError {
    #[inline]
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        let source: &(dyn StdError + 'static) = &*self.error;
        Some(source)
    }
}

/// 请求构建器结果
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_error_display() {
        let err = ResponseError::builder_with_msg(ResponseErrorKind::ConnectError, "connection refused")
            .uri("http://127.0.0.1:1/")
            .build();
        assert_eq!(err.kind(), ResponseErrorKind::ConnectError);
        assert_eq!(err.uri(), Some("http://127.0.0.1:1/"));
        assert_eq!(
            err.to_string(),
            "[ConnectError][http://127.0.0.1:1/] connection refused"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_wraps_invalid_method() {
        let err: Error = "FOO".parse::<crate::Method>().unwrap_err().into();
        assert!(matches!(err, Error::InvalidMethod(_)));
        assert!(err.to_string().contains("FOO"));
        assert!(err.to_string().contains("[GET, POST, DELETE, PUT, PATCH]"));
    }
}
