pub mod fetcher;
pub mod http_scraper;
pub mod mock_scraper;

mod scraper;
pub use fetcher::PageFetcher;
pub use http_scraper::HttpBrowser;
pub use mock_scraper::{MockBrowser, MockPage};
pub use scraper::{Browser, BrowsingSession};
