use std::{
    collections::{BTreeMap, HashMap},
    vec::IntoIter,
};

/// 有序的名称 / 值对集合
///
/// 用于 HTTP 头、查询参数和表单参数，保留调用者给出的顺序。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    /// 创建空集合
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    /// 追加名称 / 值对
    #[inline]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((name.into(), value.into()));
        self
    }

    /// 获取第一个名称完全匹配的值
    #[inline]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// 获取第一个名称匹配的值，名称比较忽略大小写
    ///
    /// HTTP 头名称不区分大小写，查找 HTTP 头时应使用该方法
    #[inline]
    pub fn get_ignore_case(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 是否包含指定名称，名称比较忽略大小写
    #[inline]
    pub fn contains_ignore_case(&self, name: &str) -> bool {
        self.get_ignore_case(name).is_some()
    }

    /// 集合长度
    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// 集合是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// 遍历名称 / 值对
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// 编码为 `application/x-www-form-urlencoded` 字符串
    pub fn to_form_urlencoded(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Params {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        Self {
            pairs: iter.into_iter().map(|(n, v)| (n.into(), v.into())).collect(),
        }
    }
}

impl<N: Into<String>, V: Into<String>> Extend<(N, V)> for Params {
    fn extend<T: IntoIterator<Item = (N, V)>>(&mut self, iter: T) {
        self.pairs
            .extend(iter.into_iter().map(|(n, v)| (n.into(), v.into())))
    }
}

impl<N: Into<String>, V: Into<String>, const L: usize> From<[(N, V); L]> for Params {
    #[inline]
    fn from(pairs: [(N, V); L]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<N: Into<String>, V: Into<String>> From<Vec<(N, V)>> for Params {
    #[inline]
    fn from(pairs: Vec<(N, V)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl<N: Into<String>, V: Into<String>> From<HashMap<N, V>> for Params {
    #[inline]
    fn from(map: HashMap<N, V>) -> Self {
        map.into_iter().collect()
    }
}

impl<N: Into<String>, V: Into<String>> From<BTreeMap<N, V>> for Params {
    #[inline]
    fn from(map: BTreeMap<N, V>) -> Self {
        map.into_iter().collect()
    }
}

impl IntoIterator for Params {
    type Item = (String, String);
    type IntoIter = IntoIter<(String, String)>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}
