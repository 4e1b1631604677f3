use super::{
    attachment::Attachment,
    cookie::Cookie,
    error::{Error, Result},
    method::Method,
    multipart::{Multipart, Part},
    params::Params,
};
use url::Url;

/// 单次发送的请求描述
///
/// 由请求构建器在每次发送时组装，按顺序折叠了 HTTP 头、表单参数、查询参数、请求体、Cookie 和附件。
/// 表单参数与请求体同时存在时两者都会被保留，由 [`PreparedRequest::payload`] 拒绝这种组合。
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    method: Method,
    url: Url,
    headers: Params,
    form_params: Option<Params>,
    body: Option<String>,
    attachment: Option<Attachment>,
}

/// 最终发送的请求体
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// 没有请求体
    Empty,

    /// 原始请求体
    Raw(Vec<u8>),

    /// `application/x-www-form-urlencoded` 编码的表单
    Form(String),

    /// `multipart/form-data` 编码的表单
    Multipart {
        /// `Content-Type` 头的值，包含分隔符
        content_type: String,
        /// 编码后的请求体
        body: Vec<u8>,
    },
}

impl PreparedRequest {
    pub(crate) fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Default::default(),
            form_params: None,
            body: None,
            attachment: None,
        }
    }

    pub(crate) fn headers(&mut self, headers: &Params) -> &mut Self {
        self.headers.extend(headers.iter());
        self
    }

    pub(crate) fn form_params(&mut self, form_params: &Params) -> &mut Self {
        self.form_params = Some(form_params.to_owned());
        self
    }

    pub(crate) fn query_params(&mut self, query_params: &Params) -> &mut Self {
        if !query_params.is_empty() {
            self.url.query_pairs_mut().extend_pairs(query_params.iter());
        }
        self
    }

    pub(crate) fn body(&mut self, body: &str) -> &mut Self {
        self.body = Some(body.to_owned());
        self
    }

    pub(crate) fn cookie(&mut self, cookie: &Cookie) -> &mut Self {
        let merged = cookie.append_to_header(self.headers.get_ignore_case("Cookie"));
        self.headers = self
            .headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case("Cookie"))
            .chain([("Cookie", merged.as_str())])
            .collect();
        self
    }

    pub(crate) fn attachment(&mut self, attachment: &Attachment) -> &mut Self {
        self.attachment = Some(attachment.to_owned());
        self
    }

    /// HTTP 方法
    #[inline]
    pub fn method(&self) -> Method {
        self.method
    }

    /// 完整的请求 URL，包含查询参数
    #[inline]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// 所有 HTTP 头，Cookie 已被合并到 `Cookie` 头中
    #[inline]
    pub fn header_params(&self) -> &Params {
        &self.headers
    }

    /// 表单参数
    #[inline]
    pub fn form(&self) -> Option<&Params> {
        self.form_params.as_ref()
    }

    /// 原始请求体
    #[inline]
    pub fn raw_body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Multipart 附件
    #[inline]
    pub fn multipart_attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    /// 计算最终发送的请求体
    ///
    /// 有附件时发送 Multipart 表单，表单参数作为文本组件放在附件之前；
    /// 否则有原始请求体时发送原始请求体；否则发送 URL 编码的表单参数。
    /// 原始请求体不能与附件或非空的表单参数一起发送，此时返回 [`Error::ConflictingPayload`]。
    /// 附件在这里才被读取。
    pub fn payload(&self) -> Result<Payload> {
        if let Some(body) = &self.body {
            if self.form_params.as_ref().map_or(false, |form_params| !form_params.is_empty()) {
                return Err(Error::ConflictingPayload {
                    first: "form parameters",
                    second: "raw body",
                });
            }
            if self.attachment.is_some() {
                return Err(Error::ConflictingPayload {
                    first: "raw body",
                    second: "multipart attachment",
                });
            }
            return Ok(Payload::Raw(body.as_bytes().to_vec()));
        }
        if let Some(attachment) = &self.attachment {
            let mut multipart = Multipart::new();
            if let Some(form_params) = &self.form_params {
                for (name, value) in form_params.iter() {
                    multipart = multipart.add_part(name, Part::text(value));
                }
            }
            let part = attachment.to_part().map_err(|err| Error::Attachment {
                path: attachment.source().describe().into_owned(),
                source: err,
            })?;
            multipart = multipart.add_part(attachment.field_name(), part);
            return Ok(Payload::Multipart {
                content_type: multipart.content_type(),
                body: multipart.into_bytes(),
            });
        }
        if let Some(form_params) = &self.form_params {
            return Ok(Payload::Form(form_params.to_form_urlencoded()));
        }
        Ok(Payload::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::{FilePath, InMemory};

    fn prepared(method: Method) -> PreparedRequest {
        PreparedRequest::new(method, Url::parse("https://api.example/users").unwrap())
    }

    #[test]
    fn test_query_params_keep_order() {
        let mut request = prepared(Method::GET);
        request.query_params(&Params::from([("page", "2"), ("size", "10")]));
        assert_eq!(request.url().as_str(), "https://api.example/users?page=2&size=10");
        assert_eq!(request.payload().unwrap(), Payload::Empty);
    }

    #[test]
    fn test_cookie_merges_into_header() {
        let mut request = prepared(Method::DELETE);
        request
            .headers(&Params::from([("cookie", "lang=en"), ("X-Trace", "t1")]))
            .cookie(&Cookie::new("sid", "abc"));
        assert_eq!(request.header_params().get("X-Trace"), Some("t1"));
        assert_eq!(request.header_params().get("Cookie"), Some("lang=en; sid=abc"));
        assert_eq!(request.header_params().len(), 2);

        let mut request = prepared(Method::DELETE);
        request.cookie(&Cookie::new("sid", "abc"));
        assert_eq!(request.header_params().get("Cookie"), Some("sid=abc"));
    }

    #[test]
    fn test_form_payload() {
        let mut request = prepared(Method::POST);
        request.form_params(&Params::from([("u", "alice"), ("p", "secret")]));
        assert_eq!(request.payload().unwrap(), Payload::Form("u=alice&p=secret".to_owned()));
    }

    #[test]
    fn test_raw_payload() {
        let mut request = prepared(Method::PUT);
        request.body("{\"id\":1}");
        assert_eq!(request.payload().unwrap(), Payload::Raw(b"{\"id\":1}".to_vec()));

        request.form_params(&Params::new());
        assert_eq!(request.payload().unwrap(), Payload::Raw(b"{\"id\":1}".to_vec()));
    }

    #[test]
    fn test_form_params_become_text_parts() {
        let mut request = prepared(Method::POST);
        request
            .form_params(&Params::from([("u", "alice"), ("p", "secret")]))
            .attachment(&Attachment::new(
                "file",
                InMemory::new(Some("b.bin".to_owned()), b"BBB".to_vec()),
            ));
        match request.payload().unwrap() {
            Payload::Multipart { content_type, body } => {
                assert!(content_type.starts_with("multipart/form-data; boundary="));
                let body = String::from_utf8(body).unwrap();
                assert!(body.contains("name=\"u\"\r\n\r\nalice\r\n"));
                assert!(body.contains("name=\"p\"\r\n\r\nsecret\r\n"));
                assert!(body.contains("name=\"file\"; filename=\"b.bin\""));
                assert!(body.contains("\r\n\r\nBBB\r\n"));
                assert!(body.find("name=\"p\"").unwrap() < body.find("name=\"file\"").unwrap());
            }
            payload => panic!("unexpected payload: {:?}", payload),
        }
    }

    #[test]
    fn test_body_with_form_params_is_rejected() {
        let mut request = prepared(Method::POST);
        request
            .form_params(&Params::from([("u", "alice")]))
            .body("{\"id\":1}");
        assert_eq!(request.form().map(Params::len), Some(1));
        assert_eq!(request.raw_body(), Some("{\"id\":1}"));
        match request.payload() {
            Err(err @ Error::ConflictingPayload { .. }) => {
                assert_eq!(
                    err.to_string(),
                    "form parameters and raw body cannot be sent in the same request"
                );
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_body_with_attachment_is_rejected() {
        let mut request = prepared(Method::POST);
        request.body("raw").attachment(&Attachment::new(
            "file",
            InMemory::new(Some("b.bin".to_owned()), b"BBB".to_vec()),
        ));
        match request.payload() {
            Err(Error::ConflictingPayload { first, second }) => {
                assert_eq!(first, "raw body");
                assert_eq!(second, "multipart attachment");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_attachment_file() {
        let mut request = prepared(Method::POST);
        request.attachment(&Attachment::new("file", FilePath::new("/definitely/not/here.bin")));
        match request.payload() {
            Err(Error::Attachment { path, .. }) => assert_eq!(path, "/definitely/not/here.bin"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
