use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

/// Byte source behind an uploaded file.
pub trait FileStream: Read + Seek + Send {}

impl<T: Read + Seek + Send> FileStream for T {}

/// One file submitted through a form.
///
/// A file is *present* when it carries a non-empty filename. Browsers submit an
/// entry with an empty filename when a file input is left untouched.
pub struct UploadedFile {
    filename: String,
    content_type: String,
    content_length: u64,
    stream: Box<dyn FileStream>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, stream: impl FileStream + 'static) -> Self {
        Self {
            filename: filename.into(),
            content_type: String::new(),
            content_length: 0,
            stream: Box::new(stream),
        }
    }

    pub fn from_bytes(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::new(filename, Cursor::new(data.into()))
    }

    /// Entry a browser submits for a file input with nothing selected: no
    /// filename and no bytes. It is not present, so the field adapter drops it.
    pub fn empty_input() -> Self {
        Self::from_bytes("", Vec::new())
            .with_content_type(mime::APPLICATION_OCTET_STREAM.essence_str())
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_content_length(mut self, content_length: u64) -> Self {
        self.content_length = content_length;
        self
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Declared length from the part headers; `0` when unknown.
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn stream_mut(&mut self) -> &mut dyn FileStream {
        &mut *self.stream
    }

    pub fn is_present(&self) -> bool {
        !self.filename.is_empty()
    }

    /// Degenerate entry some clients send for an empty multi-file input: it
    /// carries a filename but is untyped and zero-length. Unlike
    /// [`empty_input`](Self::empty_input) it survives the presence filter.
    pub fn is_placeholder(&self) -> bool {
        self.is_present()
            && self.content_type == mime::APPLICATION_OCTET_STREAM.essence_str()
            && self.content_length == 0
    }

    /// Reads the whole stream to count its bytes, then rewinds it to the start.
    ///
    /// The rewind happens even when reading fails.
    pub fn measure_size(&mut self) -> io::Result<u64> {
        let counted = io::copy(&mut self.stream, &mut io::sink());
        let rewound = self.stream.seek(SeekFrom::Start(0));
        let size = counted?;
        rewound?;
        Ok(size)
    }

    /// Reads the full contents and rewinds.
    pub fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        let read = self.stream.read_to_end(&mut buf);
        let rewound = self.stream.seek(SeekFrom::Start(0));
        read?;
        rewound?;
        Ok(buf)
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}
