pub mod content_asset;
pub mod content_item;

pub use content_asset::ContentAsset;
pub use content_item::{ContentItem, ContentStatus};
