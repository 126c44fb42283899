use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;
use url::Url;

use super::form::ValidationError;
use crate::api::AttachmentUpload;
use crate::config::as_base;

/// The two upload slots every application carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Document,
}

impl AttachmentKind {
    /// Multipart field name expected by the API.
    pub const fn field(self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Document => "document",
        }
    }

    pub const fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            AttachmentKind::Image => &["jpg", "jpeg", "png"],
            AttachmentKind::Document => &["pdf", "doc", "docx"],
        }
    }

    pub fn accepts(self, file_name: &str) -> bool {
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.allowed_extensions()
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

/// A file picked for upload, held until the next submission.
#[derive(Debug)]
pub struct SelectedFile {
    kind: AttachmentKind,
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
    preview: Option<PreviewHandle>,
}

impl SelectedFile {
    /// Read and validate a file from disk. Images also acquire a preview handle
    /// that lives exactly as long as the selection.
    pub fn open(
        kind: AttachmentKind,
        path: impl AsRef<Path>,
        previews: &PreviewRegistry,
    ) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| ValidationError::UnreadableAttachment {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "path has no usable file name",
                ),
            })?;

        if !kind.accepts(&file_name) {
            return Err(ValidationError::UnsupportedAttachment { kind, file_name });
        }

        let bytes = std::fs::read(path).map_err(|source| ValidationError::UnreadableAttachment {
            path: path.to_path_buf(),
            source,
        })?;

        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        let preview = match kind {
            AttachmentKind::Image => Some(previews.acquire(path)),
            AttachmentKind::Document => None,
        };

        Ok(Self {
            kind,
            file_name,
            content_type,
            bytes,
            preview,
        })
    }

    pub fn kind(&self) -> AttachmentKind {
        self.kind
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }

    pub fn to_upload(&self) -> AttachmentUpload {
        AttachmentUpload {
            file_name: self.file_name.clone(),
            content_type: self.content_type.clone(),
            bytes: self.bytes.clone(),
        }
    }
}

/// Tracks live local previews of selected images.
///
/// Each [`PreviewHandle`] is registered on acquisition and removed when dropped,
/// so replacing a selection or tearing down a form releases the old preview.
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: AtomicU64,
    live: Mutex<BTreeMap<u64, PathBuf>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, source: &Path) -> PreviewHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        if let Ok(mut live) = self.inner.live.lock() {
            live.insert(id, source.to_path_buf());
        }
        debug!(preview_id = id, source = %source.display(), "preview acquired");
        PreviewHandle {
            id,
            registry: Arc::clone(&self.inner),
        }
    }

    pub fn live(&self) -> usize {
        self.inner.live.lock().map(|live| live.len()).unwrap_or(0)
    }
}

#[derive(Debug)]
pub struct PreviewHandle {
    id: u64,
    registry: Arc<RegistryInner>,
}

impl PreviewHandle {
    /// Local reference to the preview, valid while the handle is alive.
    pub fn reference(&self) -> String {
        format!("preview://{}", self.id)
    }

    pub fn source(&self) -> Option<PathBuf> {
        self.registry
            .live
            .lock()
            .ok()
            .and_then(|live| live.get(&self.id).cloned())
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        if let Ok(mut live) = self.registry.live.lock() {
            live.remove(&self.id);
        }
        debug!(preview_id = self.id, "preview released");
    }
}

/// Resolve an attachment reference from the API into a link. Absolute URLs pass
/// through untouched; server-relative paths are appended to the API base,
/// path prefix included.
pub fn resolve_attachment_url(base: &Url, reference: Option<&str>) -> Option<String> {
    let reference = reference.map(str::trim).filter(|value| !value.is_empty())?;

    if let Ok(absolute) = Url::parse(reference) {
        if !absolute.cannot_be_a_base() {
            return Some(absolute.into());
        }
    }

    as_base(base.clone())
        .join(reference.trim_start_matches('/'))
        .ok()
        .map(String::from)
}
