mod bing;
mod duckduckgo;
mod google;
mod serper;
mod yandex;

pub use bing::BingSearchProvider;
pub use duckduckgo::DuckDuckGoSearchProvider;
pub use google::GoogleSearchProvider;
pub use serper::SerperSearchProvider;
pub use yandex::YandexSearchProvider;
