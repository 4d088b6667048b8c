// SPDX-License-Identifier: MPL-2.0
//! `prompt_gallery` is the gallery back-end for an image-generation front-end.
//!
//! It paginates generated images 16 per page across the two output
//! directories of the generation tool (text-to-image and image-to-image),
//! decodes the current page for display, extracts the embedded positive
//! prompt from selected images (JPEG EXIF `UserComment` or PNG `tEXt`
//! chunk), and handles deletion and sequential output naming. The GUI layer
//! that renders pages and forwards selection events is an external host;
//! it holds one [`gallery::GalleryController`] per session.

pub mod config;
pub mod directory_scanner;
pub mod error;
pub mod gallery;
pub mod metadata;
