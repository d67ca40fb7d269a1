pub mod calculate;
pub mod scrape;
pub mod user;
pub mod wikisearch;

pub use calculate::CalculateCommand;
pub use scrape::ScrapeCommand;
pub use user::UserCommand;
pub use wikisearch::WikiSearchCommand;
