use super::cookie::Cookie;
use assert_impl::assert_impl;
use http::{
    header::{AsHeaderName, HeaderMap, HeaderName, HeaderValue, SET_COOKIE},
    response::Response as HttpResponse,
    status::StatusCode,
    Version,
};
use serde::de::DeserializeOwned;
use std::str::{from_utf8, Utf8Error};

/// HTTP 响应
///
/// 响应体已被完整读入内存，构建器本身不解释响应内容
#[derive(Debug, Default)]
pub struct Response {
    inner: HttpResponse<Vec<u8>>,
    url: Option<String>,
}

impl Response {
    /// 返回 HTTP 响应构建器
    #[inline]
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }

    /// 获取 HTTP 响应
    #[inline]
    pub fn http(&self) -> &HttpResponse<Vec<u8>> {
        &self.inner
    }

    /// HTTP 状态码
    #[inline]
    pub fn status_code(&self) -> StatusCode {
        self.inner.status()
    }

    /// HTTP 协议版本
    #[inline]
    pub fn version(&self) -> Version {
        self.inner.version()
    }

    /// HTTP Headers
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// 获取 HTTP 响应头
    #[inline]
    pub fn header(&self, header_name: impl AsHeaderName) -> Option<&HeaderValue> {
        self.inner.headers().get(header_name)
    }

    /// 最终响应的 URL，跟随重定向后可能与请求 URL 不同
    #[inline]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// HTTP 响应体
    #[inline]
    pub fn body(&self) -> &[u8] {
        self.inner.body()
    }

    /// 转换为 HTTP 响应体
    #[inline]
    pub fn into_body(self) -> Vec<u8> {
        self.inner.into_body()
    }

    /// 以 UTF-8 字符串读取响应体
    #[inline]
    pub fn text(&self) -> Result<&str, Utf8Error> {
        from_utf8(self.body())
    }

    /// 以 JSON 解析响应体
    #[inline]
    pub fn parse_json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(self.body())
    }

    /// 获取 `Set-Cookie` 响应头中的所有 Cookie
    pub fn cookies(&self) -> Vec<Cookie> {
        self.inner
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(Cookie::parse_set_cookie)
            .collect()
    }

    /// 获取指定名称的 Cookie 值
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies()
            .into_iter()
            .find(|cookie| cookie.name() == name)
            .map(|cookie| cookie.value().to_owned())
    }

    #[allow(dead_code)]
    fn ignore() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

/// HTTP 响应构建器
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    inner: Response,
}

impl ResponseBuilder {
    /// 设置 HTTP 状态码
    #[inline]
    #[must_use]
    pub fn status_code(mut self, status_code: StatusCode) -> Self {
        *self.inner.inner.status_mut() = status_code;
        self
    }

    /// 设置 HTTP 协议版本
    #[inline]
    #[must_use]
    pub fn version(mut self, version: Version) -> Self {
        *self.inner.inner.version_mut() = version;
        self
    }

    /// 设置 HTTP Headers
    #[inline]
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        *self.inner.inner.headers_mut() = headers;
        self
    }

    /// 追加 HTTP 响应头
    #[inline]
    #[must_use]
    pub fn header(mut self, header_name: HeaderName, header_value: HeaderValue) -> Self {
        self.inner.inner.headers_mut().append(header_name, header_value);
        self
    }

    /// 设置最终响应的 URL
    #[inline]
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.inner.url = Some(url.into());
        self
    }

    /// 设置 HTTP 响应体
    #[inline]
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        *self.inner.inner.body_mut() = body.into();
        self
    }

    /// 构建 HTTP 响应
    #[inline]
    pub fn build(self) -> Response {
        self.inner
    }
}
