//! Resolution and memoization of tag images
//!
//! Every script load produces a fresh set of attachment images and
//! referenced paths. Decoding on-disk files is the expensive part, so file
//! results are memoized per referenced path until the script directory
//! changes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};

use crate::paths::{add_double_quotes, candidates, is_absolute, strip_quotes};
use crate::tag_images::attachment::Attachment;
use crate::tag_images::decode::{decode_file, ImageDecoder, StandardImageDecoder};
use crate::tag_images::{TagImage, TagImageFormat};
use crate::utils::text::basename_lower;

/// A key paired with the image the engine should serve for it
pub type Registration = (String, Arc<TagImage>);

/// Tag images for the active script plus the per-session file memo
pub struct TagImageCache {
    decoder: Arc<dyn ImageDecoder>,
    directory_scan: bool,
    attachment_images: Vec<Arc<TagImage>>,
    resolved_file_cache: AHashMap<String, Arc<TagImage>>,
    referenced_paths: Vec<String>,
    base_dir: Option<PathBuf>,
    dirty: bool,
}

impl TagImageCache {
    /// Create an empty cache using `decoder` for every image
    pub fn new(decoder: Arc<dyn ImageDecoder>) -> Self {
        Self {
            decoder,
            directory_scan: true,
            attachment_images: Vec::new(),
            resolved_file_cache: AHashMap::new(),
            referenced_paths: Vec::new(),
            base_dir: None,
            dirty: false,
        }
    }

    /// Enable or disable the case-insensitive search of the script directory
    #[must_use]
    pub fn with_directory_scan(mut self, enabled: bool) -> Self {
        self.directory_scan = enabled;
        self
    }

    /// Rebuild the attachment image set and adopt the script's directory
    ///
    /// Only graphic entries are considered; entries that fail to decode are
    /// skipped.
    pub fn prepare(&mut self, attachments: &[Attachment], base_dir: Option<&Path>) {
        self.set_base_dir(base_dir);

        self.attachment_images.clear();
        for attachment in attachments.iter().filter(|a| a.is_graphic()) {
            match attachment.decode_image(self.decoder.as_ref()) {
                Ok(image) => self.attachment_images.push(Arc::new(image)),
                Err(err) => log::debug!("skipping graphic attachment: {err}"),
            }
        }
        self.dirty = true;
    }

    /// Switch to a new script directory, dropping memoized files if it changed
    pub fn set_base_dir(&mut self, base_dir: Option<&Path>) {
        let base_dir = base_dir.filter(|dir| !dir.as_os_str().is_empty());
        if self.base_dir.as_deref() != base_dir {
            if !self.resolved_file_cache.is_empty() {
                log::debug!(
                    "script directory changed, dropping {} memoized tag images",
                    self.resolved_file_cache.len()
                );
            }
            self.resolved_file_cache.clear();
            self.base_dir = base_dir.map(Path::to_path_buf);
        }
    }

    /// Replace the paths referenced by the active script and mark dirty
    pub fn set_referenced_paths(&mut self, paths: Vec<String>) {
        self.referenced_paths = paths;
        self.dirty = true;
    }

    /// Paths referenced by the active script
    pub fn referenced_paths(&self) -> &[String] {
        &self.referenced_paths
    }

    /// Images decoded from graphic attachments, in entry order
    pub fn attachment_images(&self) -> &[Arc<TagImage>] {
        &self.attachment_images
    }

    /// Active script directory
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Number of memoized file results
    pub fn memoized_len(&self) -> usize {
        self.resolved_file_cache.len()
    }

    /// Whether registrations must be pushed to the engine again
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Force the next draw to push registrations again
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Record that registrations have been pushed
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Resolve the active script's references against its directory
    pub fn resolve_active(&mut self) -> Vec<Registration> {
        let paths = std::mem::take(&mut self.referenced_paths);
        let base_dir = self.base_dir.clone();
        let registrations = self.resolve(&paths, base_dir.as_deref());
        self.referenced_paths = paths;
        registrations
    }

    /// Resolve referenced paths to the ordered registrations for the engine
    ///
    /// Attachments are registered first under their own names. Each path
    /// then tries the file memo, the filesystem, and finally (for relative
    /// paths) an attachment with the same basename. Every key is registered
    /// in its bare and double-quoted forms and the first image registered
    /// under a key keeps it.
    pub fn resolve(&mut self, paths: &[String], base_dir: Option<&Path>) -> Vec<Registration> {
        self.set_base_dir(base_dir);

        let mut pass = RegistrationPass::default();
        let mut attachment_by_name: AHashMap<&str, &Arc<TagImage>> = AHashMap::new();
        for image in &self.attachment_images {
            attachment_by_name
                .entry(image.basename_lower())
                .or_insert(image);
            pass.register_variants(image.key(), image);
        }

        for raw_path in paths {
            let path = strip_quotes(raw_path);
            if path.is_empty() {
                continue;
            }
            let Some(format) = TagImageFormat::from_path(path) else {
                log::trace!("ignoring tag image with unsupported extension: {path}");
                continue;
            };

            let mut file_image = self.resolved_file_cache.get(path).cloned();
            if file_image.is_none() {
                if let Some(image) = self.decode_file_image(path, format) {
                    let image = Arc::new(image);
                    self.resolved_file_cache
                        .insert(path.to_owned(), Arc::clone(&image));
                    file_image = Some(image);
                }
            }

            if let Some(image) = file_image.filter(|image| image.format() == format) {
                pass.register_variants(path, &image);
                pass.register_variants(image.key(), &image);
                continue;
            }

            if is_absolute(path) {
                log::debug!("tag image not found: {path}");
                continue;
            }

            match attachment_by_name.get(basename_lower(path).as_str()) {
                Some(image) if image.format() == format => {
                    pass.register_variants(path, image);
                    pass.register_variants(image.key(), image);
                }
                Some(image) => log::debug!(
                    "attachment {} does not match declared format {format} of {path}",
                    image.key()
                ),
                None => log::debug!("tag image not found: {path}"),
            }
        }

        pass.registrations
    }

    /// Decode `path` from the first usable candidate location
    ///
    /// The returned image is keyed by the location it was read from.
    fn decode_file_image(&self, path: &str, format: TagImageFormat) -> Option<TagImage> {
        let base_dir = self.base_dir.as_deref();
        for candidate in candidates(path, base_dir) {
            if !candidate.is_file() {
                continue;
            }
            if let Some(image) = self.decode_candidate(&candidate, format) {
                return Some(image);
            }
        }

        if !self.directory_scan || is_absolute(path) {
            return None;
        }
        let dir = base_dir?;
        let wanted = basename_lower(path);
        if wanted.is_empty() {
            return None;
        }

        let mut matches: Vec<PathBuf> = match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
                .filter(|entry| {
                    entry.file_name().to_string_lossy().to_ascii_lowercase() == wanted
                })
                .map(|entry| entry.path())
                .collect(),
            Err(err) => {
                log::debug!("cannot scan {} for {path}: {err}", dir.display());
                return None;
            }
        };
        matches.sort();

        matches
            .iter()
            .find_map(|candidate| self.decode_candidate(candidate, format))
    }

    fn decode_candidate(&self, candidate: &Path, format: TagImageFormat) -> Option<TagImage> {
        let key = candidate.to_string_lossy();
        match decode_file(self.decoder.as_ref(), candidate, &key, format) {
            Ok(image) => Some(image),
            Err(err) => {
                log::debug!("cannot decode {}: {err}", candidate.display());
                None
            }
        }
    }
}

impl Default for TagImageCache {
    fn default() -> Self {
        Self::new(Arc::new(StandardImageDecoder))
    }
}

impl std::fmt::Debug for TagImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagImageCache")
            .field("attachment_images", &self.attachment_images.len())
            .field("memoized", &self.resolved_file_cache.len())
            .field("referenced_paths", &self.referenced_paths)
            .field("base_dir", &self.base_dir)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

/// Registrations produced by one resolution pass, first writer wins
#[derive(Default)]
struct RegistrationPass {
    registrations: Vec<Registration>,
    registered: AHashSet<String>,
}

impl RegistrationPass {
    fn register_variants(&mut self, key: &str, image: &Arc<TagImage>) {
        let clean = strip_quotes(key);
        if clean.is_empty() {
            return;
        }
        self.register(clean.to_owned(), image);
        self.register(add_double_quotes(clean), image);
    }

    fn register(&mut self, key: String, image: &Arc<TagImage>) {
        if self.registered.insert(key.clone()) {
            self.registrations.push((key, Arc::clone(image)));
        }
    }
}
