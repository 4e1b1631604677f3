use super::multipart::{Part, PartMetadata};
use mime::Mime;
use std::{
    borrow::Cow,
    fmt::Debug,
    fs::File,
    io::{Read, Result as IoResult},
    path::{Path, PathBuf},
    sync::Arc,
};

/// 附件数据源
///
/// 数据在发送请求时才被读取，实现者不应在构造时打开任何资源
pub trait FileSource: Debug + Send + Sync {
    /// 附件文件名，作为 Multipart 组件的 `filename` 参数
    fn file_name(&self) -> Option<Cow<'_, str>>;

    /// 附件的 MIME 类型
    fn mime(&self) -> Mime;

    /// 读取附件全部内容
    fn read_all(&self) -> IoResult<Vec<u8>>;

    /// 数据源描述，用于日志和错误信息
    fn describe(&self) -> Cow<'_, str>;
}

/// 磁盘文件数据源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePath {
    path: PathBuf,
}

impl FilePath {
    /// 创建磁盘文件数据源
    ///
    /// 不检查文件是否存在
    #[inline]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 获取文件路径
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileSource for FilePath {
    #[inline]
    fn file_name(&self) -> Option<Cow<'_, str>> {
        self.path.file_name().map(|name| name.to_string_lossy())
    }

    #[inline]
    fn mime(&self) -> Mime {
        mime_guess::from_path(&self.path).first_or_octet_stream()
    }

    fn read_all(&self) -> IoResult<Vec<u8>> {
        // 文件句柄在离开作用域时关闭，无论读取是否成功
        let mut file = File::open(&self.path)?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }

    #[inline]
    fn describe(&self) -> Cow<'_, str> {
        self.path.to_string_lossy()
    }
}

/// 内存数据源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemory {
    file_name: Option<String>,
    bytes: Vec<u8>,
}

impl InMemory {
    /// 创建内存数据源
    #[inline]
    pub fn new(file_name: Option<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name,
            bytes: bytes.into(),
        }
    }
}

impl FileSource for InMemory {
    #[inline]
    fn file_name(&self) -> Option<Cow<'_, str>> {
        self.file_name.as_deref().map(Cow::Borrowed)
    }

    #[inline]
    fn mime(&self) -> Mime {
        self.file_name
            .as_deref()
            .map(|name| mime_guess::from_path(name).first_or_octet_stream())
            .unwrap_or(mime::APPLICATION_OCTET_STREAM)
    }

    #[inline]
    fn read_all(&self) -> IoResult<Vec<u8>> {
        Ok(self.bytes.to_owned())
    }

    #[inline]
    fn describe(&self) -> Cow<'_, str> {
        match &self.file_name {
            Some(name) => Cow::Owned(format!("<memory:{}>", name)),
            None => Cow::Borrowed("<memory>"),
        }
    }
}

/// Multipart 附件
///
/// 字段名称与数据源的组合，请求最多只能携带一个附件
#[derive(Debug, Clone)]
pub struct Attachment {
    field_name: String,
    source: Arc<dyn FileSource>,
}

impl Attachment {
    /// 创建附件
    #[inline]
    pub fn new(field_name: impl Into<String>, source: impl FileSource + 'static) -> Self {
        Self {
            field_name: field_name.into(),
            source: Arc::new(source),
        }
    }

    /// 获取表单字段名称
    #[inline]
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// 获取数据源
    #[inline]
    pub fn source(&self) -> &dyn FileSource {
        self.source.as_ref()
    }

    pub(crate) fn to_part(&self) -> IoResult<Part> {
        let mut metadata = PartMetadata::default().mime(self.source.mime());
        if let Some(file_name) = self.source.file_name() {
            metadata = metadata.file_name(file_name);
        }
        Ok(Part::bytes(self.source.read_all()?).metadata(metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_file_path_reads_at_call_time() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let tempdir = tempdir()?;
        let path = tempdir.path().join("data.json");
        let source = FilePath::new(&path);
        assert!(source.read_all().is_err());

        File::create(&path)?.write_all(b"{}")?;
        assert_eq!(source.read_all()?, b"{}");
        assert_eq!(source.file_name().as_deref(), Some("data.json"));
        assert_eq!(source.mime(), mime::APPLICATION_JSON);
        assert_eq!(source.path(), path.as_path());

        tempdir.close()?;
        Ok(())
    }

    #[test]
    fn test_in_memory() -> anyhow::Result<()> {
        let source = InMemory::new(Some("a.bin".to_owned()), b"abc".to_vec());
        assert_eq!(source.read_all()?, b"abc");
        assert_eq!(source.mime(), mime::APPLICATION_OCTET_STREAM);
        assert_eq!(source.describe(), "<memory:a.bin>");

        let source = InMemory::new(None, Vec::new());
        assert!(source.file_name().is_none());
        assert_eq!(source.describe(), "<memory>");
        Ok(())
    }

    #[test]
    fn test_attachment_to_part() -> anyhow::Result<()> {
        let attachment = Attachment::new("file", InMemory::new(Some("a.txt".to_owned()), "hello"));
        assert_eq!(attachment.field_name(), "file");
        assert_eq!(attachment.source().describe(), "<memory:a.txt>");
        attachment.to_part()?;
        Ok(())
    }
}
