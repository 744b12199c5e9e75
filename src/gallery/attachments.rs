use super::{AttributeLookup, GalleryError, ImageAttributes, ImageId};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

/// Metadata record for one stored image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// URL or relative path of the (possibly scaled) stored image.
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shoot_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_timestamp: Option<i64>,
}

impl Attachment {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            original_location: None,
            shoot_timestamp: None,
            file_timestamp: None,
            upload_timestamp: None,
        }
    }

    pub fn filename(&self) -> String {
        basename(&self.location)
    }

    pub fn attributes(&self) -> ImageAttributes {
        ImageAttributes {
            filename: self.filename(),
            shoot_timestamp: self.shoot_timestamp.unwrap_or(0),
            file_timestamp: self.file_timestamp.unwrap_or(0),
            upload_timestamp: self.upload_timestamp.unwrap_or(0),
        }
    }
}

/// Last path segment of a URL or filesystem path.
pub fn basename(location: &str) -> String {
    if let Ok(url) = url::Url::parse(location)
        && url.has_host()
    {
        return url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
            .to_string();
    }

    location
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttachmentStore {
    #[serde(default)]
    pub attachments: BTreeMap<String, Attachment>,
}

impl AttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ImageId) -> Option<&Attachment> {
        self.attachments.get(&id.to_string())
    }

    pub fn insert(&mut self, id: ImageId, attachment: Attachment) {
        self.attachments.insert(id.to_string(), attachment);
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ImageId, &Attachment)> {
        self.attachments
            .iter()
            .filter_map(|(key, attachment)| key.parse().ok().map(|id| (ImageId(id), attachment)))
    }

    pub fn next_id(&self) -> ImageId {
        ImageId(self.iter().map(|(id, _)| id.0).max().unwrap_or(0) + 1)
    }

    /// Register an attachment under the next free id.
    pub fn register(&mut self, attachment: Attachment) -> ImageId {
        let id = self.next_id();
        self.insert(id, attachment);
        id
    }

    pub fn find_by_location(&self, location: &str) -> Option<ImageId> {
        self.iter()
            .find(|(_, attachment)| attachment.location == location)
            .map(|(id, _)| id)
    }

    /// Walk `root` and register every image not already known by location.
    ///
    /// Locations are the path relative to `root`, prefixed with `base_url` when given.
    /// Shoot time comes from EXIF, file time from the file's modification time and
    /// upload time is the moment of registration.
    pub fn scan_directory(
        &mut self,
        root: &Path,
        base_url: Option<&str>,
    ) -> Result<Vec<ImageId>, GalleryError> {
        if !root.is_dir() {
            return Err(GalleryError::ScanFailed(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let uploaded_at = Utc::now().timestamp();
        let mut registered = Vec::new();

        for entry in WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .flatten()
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !is_image(path) {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }

            let relative = path
                .strip_prefix(root)
                .unwrap_or(path)
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            let location = match base_url {
                Some(base) => format!("{}/{}", base.trim_end_matches('/'), relative),
                None => relative,
            };

            if self.find_by_location(&location).is_some() {
                trace!("Already registered: {}", location);
                continue;
            }

            let file_timestamp = match entry.metadata() {
                Ok(metadata) => metadata.modified().ok().and_then(unix_seconds),
                Err(e) => {
                    warn!("Failed to read metadata for {}: {}", path.display(), e);
                    None
                }
            };

            let attachment = Attachment {
                location,
                original_location: None,
                shoot_timestamp: extract_shoot_timestamp(path),
                file_timestamp,
                upload_timestamp: Some(uploaded_at),
            };

            let id = self.register(attachment);
            debug!("Registered attachment {} for {}", id, path.display());
            registered.push(id);
        }

        info!(
            "Scanned {}: {} new attachments, {} total",
            root.display(),
            registered.len(),
            self.len()
        );

        Ok(registered)
    }
}

impl AttributeLookup for AttachmentStore {
    fn attributes(&self, id: ImageId) -> Option<ImageAttributes> {
        self.get(id).map(Attachment::attributes)
    }
}

fn is_image(path: &Path) -> bool {
    mime_guess::from_path(path)
        .first()
        .is_some_and(|mime| mime.type_() == mime_guess::mime::IMAGE)
}

fn unix_seconds(time: SystemTime) -> Option<i64> {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .ok()
        .and_then(|d| i64::try_from(d.as_secs()).ok())
}

fn extract_shoot_timestamp(path: &Path) -> Option<i64> {
    let exif = match rexif::parse_file(path) {
        Ok(exif) => exif,
        Err(e) => {
            trace!("No EXIF data for {}: {}", path.display(), e);
            return None;
        }
    };

    let date_fields = [
        rexif::ExifTag::DateTimeOriginal,
        rexif::ExifTag::DateTimeDigitized,
        rexif::ExifTag::DateTime,
    ];

    date_fields.iter().find_map(|field| {
        exif.entries
            .iter()
            .find(|e| e.tag == *field)
            .and_then(|entry| parse_exif_datetime(&entry.value_more_readable))
    })
}

/// EXIF datetimes look like "2005:07:30 07:22:46" and carry no zone; they are read as UTC.
pub(crate) fn parse_exif_datetime(value: &str) -> Option<i64> {
    let value = value.trim();
    let formats = ["%Y:%m:%d %H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"];

    for format in &formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).timestamp());
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(&format!("{} 00:00:00", value), format) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).timestamp());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_basename_of_url_and_path() {
        assert_eq!(
            basename("https://example.com/uploads/2024/05/IMG_0042-scaled.jpg"),
            "IMG_0042-scaled.jpg"
        );
        assert_eq!(basename("https://example.com/a.jpg?size=large"), "a.jpg");
        assert_eq!(basename("albums/summer/beach.JPG"), "beach.JPG");
        assert_eq!(basename("plain.png"), "plain.png");
    }

    #[test]
    fn test_attributes_default_missing_timestamps() {
        let mut attachment = Attachment::new("photos/a.jpg");
        attachment.file_timestamp = Some(1_700_000_000);

        let attributes = attachment.attributes();
        assert_eq!(attributes.filename, "a.jpg");
        assert_eq!(attributes.shoot_timestamp, 0);
        assert_eq!(attributes.file_timestamp, 1_700_000_000);
        assert_eq!(attributes.upload_timestamp, 0);
    }

    #[test]
    fn test_register_assigns_increasing_ids() {
        let mut store = AttachmentStore::new();
        store.insert(ImageId(10), Attachment::new("a.jpg"));

        let id = store.register(Attachment::new("b.jpg"));
        assert_eq!(id, ImageId(11));
        assert_eq!(store.find_by_location("b.jpg"), Some(ImageId(11)));
        assert_eq!(store.attributes(ImageId(11)).unwrap().filename, "b.jpg");
        assert!(store.attributes(ImageId(99)).is_none());
    }

    #[test]
    fn test_parse_exif_datetime() {
        assert_eq!(parse_exif_datetime("1970:01:01 00:01:40"), Some(100));
        assert_eq!(parse_exif_datetime("1970-01-02 00:00:00"), Some(86_400));
        assert_eq!(parse_exif_datetime("not a date"), None);
    }

    #[test]
    fn test_scan_directory_registers_images_once() {
        let temp_dir = TempDir::new().unwrap();
        let album = temp_dir.path().join("album");
        fs::create_dir_all(&album).unwrap();
        fs::write(album.join("b.jpg"), b"not really a jpeg").unwrap();
        fs::write(album.join("a.png"), b"not really a png").unwrap();
        fs::write(album.join("notes.txt"), b"skip me").unwrap();
        fs::write(album.join(".hidden.jpg"), b"skip me too").unwrap();

        let mut store = AttachmentStore::new();
        let registered = store
            .scan_directory(temp_dir.path(), Some("https://cdn.example.com/media/"))
            .unwrap();

        assert_eq!(registered, vec![ImageId(1), ImageId(2)]);
        let first = store.get(ImageId(1)).unwrap();
        assert_eq!(first.location, "https://cdn.example.com/media/album/a.png");
        assert!(first.file_timestamp.is_some());
        assert!(first.upload_timestamp.is_some());
        assert_eq!(first.shoot_timestamp, None);

        let again = store.scan_directory(temp_dir.path(), Some("https://cdn.example.com/media")).unwrap();
        assert!(again.is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_scan_rejects_missing_directory() {
        let mut store = AttachmentStore::new();
        let result = store.scan_directory(Path::new("/definitely/not/here"), None);
        assert!(matches!(result, Err(GalleryError::ScanFailed(_))));
    }
}
