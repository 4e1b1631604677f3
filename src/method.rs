use std::{error::Error, fmt, str::FromStr};

/// HTTP 方法
///
/// 仅包含请求构建器可以接受的方法
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET 方法
    GET,
    /// POST 方法
    POST,
    /// PUT 方法
    PUT,
    /// PATCH 方法
    PATCH,
    /// DELETE 方法
    DELETE,
}

impl Method {
    /// 所有可以接受的 HTTP 方法
    pub const ACCEPTABLE: [Method; 5] = [Method::GET, Method::POST, Method::DELETE, Method::PUT, Method::PATCH];

    /// 将 HTTP 方法转换成字符串
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::PATCH => "PATCH",
            Method::DELETE => "DELETE",
        }
    }

    /// 实际发送时使用的 HTTP 方法
    ///
    /// 只有 POST、PUT 和 DELETE 有各自的发送分支，其余方法（包括 PATCH）均按 GET 发送
    #[inline]
    pub fn dispatch_method(self) -> Method {
        match self {
            Method::POST | Method::PUT | Method::DELETE => self,
            Method::GET | Method::PATCH => Method::GET,
        }
    }
}

impl FromStr for Method {
    type Err = InvalidMethod;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_uppercase().as_str() {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "PATCH" => Ok(Method::PATCH),
            "DELETE" => Ok(Method::DELETE),
            _ => Err(InvalidMethod(value.into())),
        }
    }
}

impl TryFrom<&str> for Method {
    type Error = InvalidMethod;

    #[inline]
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl AsRef<str> for Method {
    #[inline]
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for Method {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Method {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    #[inline]
    fn from(method: Method) -> Self {
        match method {
            Method::GET => http::Method::GET,
            Method::POST => http::Method::POST,
            Method::PUT => http::Method::PUT,
            Method::PATCH => http::Method::PATCH,
            Method::DELETE => http::Method::DELETE,
        }
    }
}

/// 非法的 HTTP 方法错误
///
/// 保存调用者传入的原始值
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidMethod(Box<str>);

impl InvalidMethod {
    /// 获取调用者传入的原始值
    #[inline]
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvalidMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid method: {}\nValid methods: [", self.0)?;
        for (i, method) in Method::ACCEPTABLE.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(method.as_str())?;
        }
        f.write_str("]")
    }
}

impl Error for InvalidMethod {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("get".parse::<Method>(), Ok(Method::GET));
        assert_eq!("GET".parse::<Method>(), Ok(Method::GET));
        assert_eq!("Post".parse::<Method>(), Ok(Method::POST));
        assert_eq!("pAtCh".parse::<Method>(), Ok(Method::PATCH));
        assert_eq!(Method::try_from("delete"), Ok(Method::DELETE));
        assert_eq!(Method::try_from("put"), Ok(Method::PUT));
    }

    #[test]
    fn test_invalid_method_message() {
        let err = "foo".parse::<Method>().unwrap_err();
        assert_eq!(err.value(), "foo");
        assert_eq!(
            err.to_string(),
            "Invalid method: foo\nValid methods: [GET, POST, DELETE, PUT, PATCH]"
        );
        assert!("HEAD".parse::<Method>().is_err());
        assert!("".parse::<Method>().is_err());
    }

    #[test]
    fn test_dispatch_method() {
        assert_eq!(Method::GET.dispatch_method(), Method::GET);
        assert_eq!(Method::POST.dispatch_method(), Method::POST);
        assert_eq!(Method::PUT.dispatch_method(), Method::PUT);
        assert_eq!(Method::DELETE.dispatch_method(), Method::DELETE);
        assert_eq!(Method::PATCH.dispatch_method(), Method::GET);
    }

    #[test]
    fn test_http_method_conversion() {
        for method in Method::ACCEPTABLE {
            assert_eq!(http::Method::from(method).as_str(), method.as_str());
            assert_eq!(method, method.as_str());
        }
    }
}
