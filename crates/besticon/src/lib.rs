//! Discover, fetch, decode and rank the icons a web page advertises.

pub mod cancel;
pub mod color;
pub mod config;
pub mod data_uri;
pub mod decode;
pub mod discovery;
pub mod fetch;
pub mod finder;
pub mod hooks;
pub mod http_client;
pub mod selection;
pub mod size_range;
pub mod types;
pub mod url_util;

pub use cancel::CancellationToken;
pub use color::main_color_for_icons;
pub use config::FinderConfig;
pub use fetch::FetchOptions;
pub use finder::IconFinder;
pub use hooks::OverrideFinder;
pub use http_client::{HttpClient, HttpResponse, Transport};
pub use selection::select_icon;
pub use size_range::{parse_size_range, SizeRange, MAX_ICON_SIZE};
pub use types::*;
