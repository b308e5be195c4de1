use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

/// Public path videos are served under
pub const VIDEO_MOUNT: &str = "/uploads";
/// Public path assignment files are served under
pub const ASSIGNMENT_MOUNT: &str = "/AssignmentUpload";

const SUFFIX_RANGE: u32 = 1_000_000_000;

/// Name an uploaded file was stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    name: String,
}

impl StoredFile {
    /// Pick a fresh name for an upload: `<field>-<unix millis>-<random><ext>`,
    /// keeping the original extension.
    pub fn for_upload(field: &str, original_name: &str) -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let suffix = rand::rng().random_range(0..SUFFIX_RANGE);
        Self::with_parts(field, original_name, millis, suffix)
    }

    fn with_parts(field: &str, original_name: &str, millis: u128, suffix: u32) -> Self {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        Self {
            name: format!("{}-{}-{}{}", field, millis, suffix, ext),
        }
    }

    /// Wrap a name chosen by the upload layer itself.
    pub fn from_name(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url_under(&self, mount: &str) -> String {
        format!("{}/{}", mount.trim_end_matches('/'), self.name)
    }
}
