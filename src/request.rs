use super::{
    attachment::{Attachment, FilePath, FileSource},
    caller::{HttpCaller, UreqCaller},
    cookie::Cookie,
    error::{Error, Result},
    method::{InvalidMethod, Method},
    params::Params,
    prepared::PreparedRequest,
    response::Response,
};
use assert_impl::assert_impl;
use log::{debug, info};
use std::{path::PathBuf, sync::Arc};
use url::Url;

/// 绑定到基础地址的 HTTP 客户端规格
///
/// 由 [`Request::build`] 创建，之后每次发送都基于它组装请求
#[derive(Debug, Clone)]
struct RequestSpec {
    base_url: String,
    caller: Arc<dyn HttpCaller>,
}

/// HTTP 请求构建器
///
/// 使用方式为：构造 → 任意顺序设置参数 → [`Request::build`] → [`Request::send`]（可重复调用）。
/// 每次发送时都会重新读取当前设置，因此 `build()` 之后的设置依然生效。
///
/// ### 发送请求代码实例
///
/// ```no_run
/// use api_request::Request;
///
/// # fn example() -> anyhow::Result<()> {
/// let mut request = Request::new("https://api.example/");
/// request
///     .set_endpoint("orders")
///     .set_headers([("Content-Type", "application/json")])
///     .set_body(r#"{"id":1}"#)
///     .set_http_method("post")?;
/// let response = request.build().send()?;
/// println!("{}", response.status_code());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    base_url: String,
    method: Option<Method>,
    endpoint: String,
    headers: Option<Params>,
    body: Option<String>,
    query_params: Option<Params>,
    form_params: Option<Params>,
    cookie: Option<Cookie>,
    attachment: Option<Attachment>,
    caller: Option<Arc<dyn HttpCaller>>,
    spec: Option<RequestSpec>,
}

impl Request {
    /// 创建请求构建器，使用默认的 Ureq 客户端
    ///
    /// 基础地址原样保存，不做任何校验
    #[inline]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            method: None,
            endpoint: String::new(),
            headers: None,
            body: None,
            query_params: None,
            form_params: None,
            cookie: None,
            attachment: None,
            caller: None,
            spec: None,
        }
    }

    /// 创建请求构建器，使用指定的 HTTP 客户端
    #[inline]
    pub fn with_caller(base_url: impl Into<String>, caller: Arc<dyn HttpCaller>) -> Self {
        let mut request = Self::new(base_url);
        request.caller = Some(caller);
        request
    }

    /// 设置 HTTP 方法
    ///
    /// 传入的字符串被转换为大写，不在 [`Method::ACCEPTABLE`] 中时返回错误，且已设置的方法保持不变
    pub fn set_http_method(&mut self, method: &str) -> std::result::Result<&mut Self, InvalidMethod> {
        self.method = Some(method.parse()?);
        Ok(self)
    }

    /// 设置 HTTP 方法
    #[inline]
    pub fn set_method(&mut self, method: Method) -> &mut Self {
        self.method = Some(method);
        self
    }

    /// 设置追加在基础地址之后的路径
    #[inline]
    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) -> &mut Self {
        self.endpoint = endpoint.into();
        self
    }

    /// 设置全部 HTTP 头，替换之前的设置
    #[inline]
    pub fn set_headers(&mut self, headers: impl Into<Params>) -> &mut Self {
        self.headers = Some(headers.into());
        self
    }

    /// 设置原始请求体
    #[inline]
    pub fn set_body(&mut self, body: impl Into<String>) -> &mut Self {
        self.body = Some(body.into());
        self
    }

    /// 设置全部查询参数，替换之前的设置
    #[inline]
    pub fn set_query_params(&mut self, query_params: impl Into<Params>) -> &mut Self {
        self.query_params = Some(query_params.into());
        self
    }

    /// 设置全部表单参数，替换之前的设置
    #[inline]
    pub fn set_form_params(&mut self, form_params: impl Into<Params>) -> &mut Self {
        self.form_params = Some(form_params.into());
        self
    }

    /// 设置 Cookie
    #[inline]
    pub fn set_cookie(&mut self, cookie: impl Into<Cookie>) -> &mut Self {
        self.cookie = Some(cookie.into());
        self
    }

    /// 设置附件为磁盘文件，替换之前的附件
    ///
    /// 文件在发送时才被打开
    #[inline]
    pub fn add_file(&mut self, field_name: impl Into<String>, absolute_path: impl Into<PathBuf>) -> &mut Self {
        self.add_file_source(field_name, FilePath::new(absolute_path))
    }

    /// 设置附件为任意数据源，替换之前的附件
    #[inline]
    pub fn add_file_source(&mut self, field_name: impl Into<String>, source: impl FileSource + 'static) -> &mut Self {
        self.attachment = Some(Attachment::new(field_name, source));
        self
    }

    /// 创建绑定到基础地址的 HTTP 客户端规格
    ///
    /// 必须在 [`Request::send`] 之前调用，重复调用会重新绑定
    pub fn build(&mut self) -> &mut Self {
        if self.spec.is_some() {
            info!("Request spec for {} is rebuilt", self.base_url);
        }
        let caller = match &self.caller {
            Some(caller) => caller.to_owned(),
            None => {
                let caller: Arc<dyn HttpCaller> = Arc::new(UreqCaller::default());
                self.caller = Some(caller.to_owned());
                caller
            }
        };
        self.spec = Some(RequestSpec {
            base_url: self.base_url.to_owned(),
            caller,
        });
        self
    }

    /// 组装本次发送的请求描述
    ///
    /// 依次折叠 HTTP 头、表单参数、查询参数、请求体、Cookie 和附件，每个部分只在设置后才被加入
    pub fn prepare(&self) -> Result<PreparedRequest> {
        let spec = self.spec.as_ref().ok_or(Error::NotBuilt)?;
        let url = join_url(&spec.base_url, &self.endpoint);
        let url = Url::parse(&url).map_err(|err| Error::InvalidUrl { url, source: err })?;

        let mut prepared = PreparedRequest::new(self.method.unwrap_or(Method::GET).dispatch_method(), url);
        if let Some(headers) = &self.headers {
            prepared.headers(headers);
        }
        if let Some(form_params) = &self.form_params {
            prepared.form_params(form_params);
        }
        if let Some(query_params) = &self.query_params {
            prepared.query_params(query_params);
        }
        if let Some(body) = &self.body {
            prepared.body(body);
        }
        if let Some(cookie) = &self.cookie {
            prepared.cookie(cookie);
        }
        if let Some(attachment) = &self.attachment {
            prepared.attachment(attachment);
        }
        Ok(prepared)
    }

    /// 发送请求并返回响应
    ///
    /// 方法未设置或为 PATCH 时发送 GET 请求，自动跟随重定向。任何错误都原样返回给调用者
    pub fn send(&self) -> Result<Response> {
        let prepared = self.prepare()?;
        let spec = self.spec.as_ref().ok_or(Error::NotBuilt)?;
        debug!("Sending {} request to {}", prepared.method(), prepared.url());
        spec.caller.call(&prepared)
    }

    /// 获取 `Cookie` HTTP 头的值
    ///
    /// 与 [`Request::cookie`] 无关，HTTP 头尚未设置时返回 [`Error::NoHeaders`]
    #[inline]
    pub fn cookie_header(&self) -> Result<Option<&str>> {
        self.headers
            .as_ref()
            .map(|headers| headers.get_ignore_case("Cookie"))
            .ok_or(Error::NoHeaders)
    }

    /// 获取 Cookie
    #[inline]
    pub fn cookie(&self) -> Option<&Cookie> {
        self.cookie.as_ref()
    }

    /// 获取基础地址
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 获取 HTTP 方法
    #[inline]
    pub fn method(&self) -> Option<Method> {
        self.method
    }

    /// 获取路径
    #[inline]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 获取 HTTP 头
    #[inline]
    pub fn headers(&self) -> Option<&Params> {
        self.headers.as_ref()
    }

    /// 获取原始请求体
    #[inline]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// 获取查询参数
    #[inline]
    pub fn query_params(&self) -> Option<&Params> {
        self.query_params.as_ref()
    }

    /// 获取表单参数
    #[inline]
    pub fn form_params(&self) -> Option<&Params> {
        self.form_params.as_ref()
    }

    /// 获取附件
    #[inline]
    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    /// 是否已经调用过 [`Request::build`]
    #[inline]
    pub fn is_built(&self) -> bool {
        self.spec.is_some()
    }

    #[allow(dead_code)]
    fn ignore() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

fn join_url(base_url: &str, endpoint: &str) -> String {
    if endpoint.is_empty() {
        return base_url.to_owned();
    }
    if base_url.is_empty() {
        return endpoint.to_owned();
    }
    match (base_url.ends_with('/'), endpoint.starts_with('/')) {
        (true, true) => format!("{}{}", base_url, &endpoint[1..]),
        (false, false) => format!("{}/{}", base_url, endpoint),
        _ => format!("{}{}", base_url, endpoint),
    }
}
