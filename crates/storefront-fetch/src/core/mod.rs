mod cache;
mod conditional;
mod css;

pub use cache::{cache_basename, is_allowed_appstream_url};
pub use conditional::{
    IF_MODIFIED_SINCE, IF_NONE_MATCH, conditional_headers, format_http_date, parse_http_date,
};
pub use css::{CssUrl, css_urls};
