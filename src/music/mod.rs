pub mod resolver;
pub mod scraper;
pub mod url;

pub use resolver::{PlaybackKind, PlaybackResult, PlaybackSource, Resolver};
pub use scraper::{CacheMp3Scraper, MediaPathScraper};
pub use url::build_stream_url;
