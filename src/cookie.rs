use std::fmt;

/// Cookie
///
/// 仅包含名称和值，发送时渲染为 `name=value`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Cookie {
    name: String,
    value: String,
}

impl Cookie {
    /// 创建 Cookie
    #[inline]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// 获取 Cookie 名称
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 获取 Cookie 值
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// 解析 `Set-Cookie` 响应头的值
    ///
    /// 只取第一个 `;` 之前的 `name=value`，其余属性被忽略。名称为空时返回 [`None`]。
    pub fn parse_set_cookie(header_value: &str) -> Option<Self> {
        let pair = header_value.split(';').next()?;
        let (name, value) = pair.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self::new(name, unquote(value.trim())))
    }

    pub(crate) fn append_to_header(&self, existing: Option<&str>) -> String {
        match existing.map(str::trim).filter(|existing| !existing.is_empty()) {
            Some(existing) => format!("{}; {}", existing, self),
            None => self.to_string(),
        }
    }
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

impl<N: Into<String>, V: Into<String>> From<(N, V)> for Cookie {
    #[inline]
    fn from((name, value): (N, V)) -> Self {
        Self::new(name, value)
    }
}
