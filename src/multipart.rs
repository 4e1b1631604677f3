use assert_impl::assert_impl;
use mime::Mime;
use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use rand::random;
use regex::Regex;

/// Multipart 表单
///
/// 组件按添加顺序编码，编码结果一次性生成在内存中
#[derive(Debug)]
pub struct Multipart {
    boundary: String,
    fields: Vec<(String, Part)>,
}

/// Multipart 表单组件
#[derive(Debug)]
pub struct Part {
    meta: PartMetadata,
    body: Vec<u8>,
}

/// Multipart 表单组件元信息
#[derive(Default, Debug, Clone)]
pub struct PartMetadata {
    content_type: Option<Mime>,
    file_name: Option<String>,
}

impl Default for Multipart {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Multipart {
    /// 创建 Multipart 表单
    #[inline]
    pub fn new() -> Self {
        Self {
            boundary: gen_boundary(),
            fields: Default::default(),
        }
    }

    /// 获取分隔符
    #[inline]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// 添加 Multipart 表单组件
    #[inline]
    #[must_use]
    pub fn add_part(mut self, name: impl Into<String>, part: Part) -> Self {
        self.fields.push((name.into(), part));
        self
    }

    /// 表单组件数量
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// 表单是否没有组件
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 获取 `Content-Type` 头的值
    #[inline]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// 编码为请求体
    pub fn into_bytes(self) -> Vec<u8> {
        let mut buf = Vec::new();
        for (name, part) in self.fields {
            buf.extend_from_slice(b"--");
            buf.extend_from_slice(self.boundary.as_bytes());
            buf.extend_from_slice(b"\r\n");
            buf.extend_from_slice(&encode_headers(&name, &part.meta));
            buf.extend_from_slice(b"\r\n\r\n");
            buf.extend_from_slice(&part.body);
            buf.extend_from_slice(b"\r\n");
        }
        buf.extend_from_slice(b"--");
        buf.extend_from_slice(self.boundary.as_bytes());
        buf.extend_from_slice(b"--\r\n");
        buf
    }

    #[allow(dead_code)]
    fn ignore() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

impl Part {
    /// 创建字符串组件
    #[inline]
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            meta: Default::default(),
            body: value.into().into_bytes(),
        }
    }

    /// 创建二进制数据组件
    #[inline]
    #[must_use]
    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Self {
            meta: Default::default(),
            body: value.into(),
        }
    }

    /// 设置组件元信息
    #[inline]
    #[must_use]
    pub fn metadata(mut self, metadata: PartMetadata) -> Self {
        self.meta = metadata;
        self
    }
}

impl PartMetadata {
    /// 设置组件的 MIME 类型
    #[inline]
    #[must_use]
    pub fn mime(mut self, mime: Mime) -> Self {
        self.content_type = Some(mime);
        self
    }

    /// 设置组件的文件名
    #[inline]
    #[must_use]
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

fn gen_boundary() -> String {
    format!("{:016x}{:016x}", random::<u64>(), random::<u64>())
}

fn encode_headers(name: &str, meta: &PartMetadata) -> Vec<u8> {
    let mut buf = b"content-disposition: form-data; ".to_vec();
    buf.extend_from_slice(&format_parameter("name", name));
    if let Some(file_name) = meta.file_name.as_ref() {
        buf.extend_from_slice(b"; ");
        buf.extend_from_slice(format_file_name(file_name).as_bytes());
    }
    if let Some(content_type) = meta.content_type.as_ref() {
        buf.extend_from_slice(b"\r\ncontent-type: ");
        buf.extend_from_slice(content_type.as_ref().as_bytes());
    }
    buf
}

fn format_file_name(filename: &str) -> String {
    static REGEX: Lazy<Regex> = Lazy::new(|| Regex::new("\\\\|\"|\r|\n").unwrap());
    let mut formatted = String::from("filename=\"");
    let mut last_match = 0;
    for m in REGEX.find_iter(filename) {
        formatted.push_str(&filename[last_match..m.start()]);
        match m.as_str() {
            "\\" => formatted.push_str("\\\\"),
            "\"" => formatted.push_str("\\\""),
            "\r" => formatted.push_str("\\\r"),
            "\n" => formatted.push_str("\\\n"),
            _ => unreachable!(),
        }
        last_match = m.end();
    }
    formatted.push_str(&filename[last_match..]);
    formatted.push('"');
    formatted
}

const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%');

fn format_parameter(name: &str, value: &str) -> Vec<u8> {
    let legal_value = utf8_percent_encode(value, PATH_SEGMENT_ENCODE_SET).to_string();
    let mut formatted = name.as_bytes().to_vec();
    if value.len() == legal_value.len() {
        formatted.extend_from_slice(b"=\"");
        formatted.extend_from_slice(value.as_bytes());
        formatted.extend_from_slice(b"\"");
    } else {
        formatted.extend_from_slice(b"*=utf-8''");
        formatted.extend_from_slice(legal_value.as_bytes());
    };
    formatted
}
