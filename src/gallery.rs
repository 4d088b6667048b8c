// SPDX-License-Identifier: MPL-2.0
//! Gallery controller for paginating, selecting, and deleting generated images.
//!
//! A [`GalleryController`] holds one UI session's state: the current page,
//! the active output directory, and the selected image. Page contents are
//! recomputed from a live directory listing on every call, so pages grow and
//! shrink as the generation pipeline writes new files. All operations are
//! synchronous; the host owns the controller and drives it from its event
//! loop, one controller per session.

use crate::config::Config;
use crate::directory_scanner;
use crate::error::{Error, Result};
use crate::metadata;
use image_rs::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Number of images shown on one gallery page.
pub const PAGE_SIZE: usize = 16;

/// Which generation mode's output directory the gallery shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Txt2Img,
    Img2Img,
}

/// A decoded image together with the file it came from.
#[derive(Clone)]
pub struct GalleryImage {
    pub path: PathBuf,
    pub image: DynamicImage,
}

/// One rendered gallery page, ready for the UI layer.
#[derive(Clone)]
pub struct PageView {
    /// Decoded images of the page, in display order.
    pub images: Vec<GalleryImage>,
    /// The page that is actually shown (1-indexed).
    pub page_num: usize,
    /// Whether the UI should drop its current selection highlight.
    pub clear_selection: bool,
}

/// Per-session gallery state and operations.
pub struct GalleryController {
    txt2img_dir: PathBuf,
    img2img_dir: PathBuf,
    page_num: usize,
    source: Source,
    selected: Option<PathBuf>,
}

impl GalleryController {
    /// Creates a controller over the two output directories, starting on
    /// page 1 of the text-to-image outputs with nothing selected.
    pub fn new(txt2img_dir: impl Into<PathBuf>, img2img_dir: impl Into<PathBuf>) -> Self {
        Self {
            txt2img_dir: txt2img_dir.into(),
            img2img_dir: img2img_dir.into(),
            page_num: 1,
            source: Source::Txt2Img,
            selected: None,
        }
    }

    /// Creates a controller from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.txt2img_dir.clone(), config.img2img_dir.clone())
    }

    /// Returns the active source.
    pub fn source(&self) -> Source {
        self.source
    }

    /// Returns the current page number (1-indexed).
    pub fn page_num(&self) -> usize {
        self.page_num
    }

    /// Returns the currently selected image path, if any.
    pub fn selected_image(&self) -> Option<&Path> {
        self.selected.as_deref()
    }

    /// Sets the active source. Does not reset the page or clear the
    /// selection; callers navigate afterwards if they want page 1.
    pub fn set_source(&mut self, source: Source) {
        self.source = source;
    }

    /// Lists and decodes one page of the gallery.
    ///
    /// The page slice is `[(page-1)*16, min(page*16, total))` over the
    /// creation-time-sorted listing. A page past the end yields an empty
    /// view rather than an error; callers wanting bounds use [`goto_page`].
    /// Files that fail to decode are skipped with a warning. Updates the
    /// session's current page.
    ///
    /// [`goto_page`]: GalleryController::goto_page
    pub fn list_page(
        &mut self,
        page_num: usize,
        source_override: Option<Source>,
    ) -> Result<PageView> {
        let directory = self.directory_for(source_override).to_path_buf();
        let files = directory_scanner::list_image_files(&directory)?;

        let page_num = page_num.max(1);
        let start = (page_num - 1) * PAGE_SIZE;
        let end = (start + PAGE_SIZE).min(files.len());

        let mut images = Vec::new();
        if start < files.len() {
            for path in &files[start..end] {
                match image_rs::open(path) {
                    Ok(image) => images.push(GalleryImage {
                        path: path.clone(),
                        image,
                    }),
                    Err(e) => warn!("skipping undecodable image {:?}: {}", path, e),
                }
            }
        }

        self.page_num = page_num;
        debug!(
            "listed page {} of {:?} ({} of {} files shown)",
            page_num,
            directory,
            images.len(),
            files.len()
        );

        Ok(PageView {
            images,
            page_num,
            clear_selection: false,
        })
    }

    /// Loads a specific page, clamping the request into `[1, total_pages]`.
    /// `None` means page 1.
    pub fn goto_page(&mut self, page_num: Option<usize>) -> Result<PageView> {
        let total = self.total_pages(None)?;
        let target = page_num.unwrap_or(1).clamp(1, total);
        self.navigate_to(target)
    }

    /// Advances one page, wrapping around to page 1 past the last page.
    pub fn next_page(&mut self) -> Result<PageView> {
        let total = self.total_pages(None)?;
        let target = if self.page_num >= total {
            1
        } else {
            self.page_num + 1
        };
        self.navigate_to(target)
    }

    /// Retreats one page, wrapping around to the last page below page 1.
    pub fn prev_page(&mut self) -> Result<PageView> {
        let total = self.total_pages(None)?;
        let target = if self.page_num <= 1 {
            total
        } else {
            self.page_num - 1
        };
        self.navigate_to(target)
    }

    /// Jumps to the last page.
    pub fn last_page(&mut self) -> Result<PageView> {
        let total = self.total_pages(None)?;
        self.navigate_to(total)
    }

    /// Records the image at `ordinal` (0-based, within the displayed page)
    /// as selected and returns its embedded prompt metadata.
    ///
    /// The ordinal resolves to absolute index `(page-1)*16 + ordinal` in the
    /// creation-time-sorted listing, the same ordering pages are sliced
    /// from. Returns [`Error::SelectionOutOfRange`] when the index falls
    /// past the end of the listing, and `None` when the selected file
    /// carries no metadata.
    pub fn select_image(&mut self, ordinal: usize) -> Result<Option<String>> {
        let files = directory_scanner::list_image_files(self.directory_for(None))?;
        let absolute = (self.page_num - 1) * PAGE_SIZE + ordinal;

        let path = files
            .get(absolute)
            .cloned()
            .ok_or(Error::SelectionOutOfRange)?;

        debug!("selected {:?} (index {})", path, absolute);
        self.selected = Some(path.clone());

        Ok(metadata::extract_prompt(&path))
    }

    /// Deletes the selected image from disk and re-lists the current page.
    ///
    /// Fails with [`Error::NoImageSelected`] when nothing is selected; a
    /// file that vanished since selection surfaces as an I/O error. The
    /// selection is cleared only after a successful delete.
    pub fn delete_selected(&mut self) -> Result<PageView> {
        let path = self.selected.clone().ok_or(Error::NoImageSelected)?;

        std::fs::remove_file(&path)?;
        info!("deleted {:?}", path);
        self.selected = None;

        let mut view = self.list_page(self.page_num, None)?;
        view.clear_selection = true;
        Ok(view)
    }

    /// Computes the next sequential output filename (`"{highest + 1}.png"`,
    /// or `"1.png"` for a directory without numbered outputs).
    pub fn next_output_filename(&self, source_override: Option<Source>) -> Result<String> {
        directory_scanner::next_output_filename(self.directory_for(source_override))
    }

    fn navigate_to(&mut self, page_num: usize) -> Result<PageView> {
        let mut view = self.list_page(page_num, None)?;
        view.clear_selection = true;
        Ok(view)
    }

    /// Total pages over a live listing, never less than 1 so that the
    /// page-bounds invariant holds for an empty directory too.
    fn total_pages(&self, source_override: Option<Source>) -> Result<usize> {
        let files = directory_scanner::list_image_files(self.directory_for(source_override))?;
        Ok(files.len().div_ceil(PAGE_SIZE).max(1))
    }

    fn directory_for(&self, source_override: Option<Source>) -> &Path {
        match source_override.unwrap_or(self.source) {
            Source::Txt2Img => &self.txt2img_dir,
            Source::Img2Img => &self.img2img_dir,
        }
    }
}
