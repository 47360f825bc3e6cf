//! # Rooster Content
//! Stateless content selection for broadcasts: a random pick from the
//! configured message catalog, plus best-effort image enrichment via an
//! external search API. Enrichment failures never block the text send.

pub mod catalog;
pub mod images;

pub use catalog::MessageCatalog;
pub use images::{next_image, PixabayClient};
