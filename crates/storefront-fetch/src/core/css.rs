use std::ops::Range;

/// One `url(...)` reference in a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssUrl<'a> {
    /// Byte range of everything between the parentheses, quotes included.
    pub span: Range<usize>,
    /// The referenced location, quotes removed.
    pub target: &'a str,
}

/// Find every `url(...)` reference in `css`, in order.
///
/// A reference without a closing parenthesis ends the scan.
pub fn css_urls(css: &str) -> Vec<CssUrl<'_>> {
    let mut urls = Vec::new();
    let mut offset = 0;

    while let Some(pos) = css[offset..].find("url(") {
        let start = offset + pos + "url(".len();
        let Some(len) = css[start..].find(')') else {
            break;
        };
        let end = start + len;

        let inner = css[start..end].trim();
        let inner = inner.strip_prefix(['\'', '"']).unwrap_or(inner);
        let target = inner.strip_suffix(['\'', '"']).unwrap_or(inner);

        urls.push(CssUrl {
            span: start..end,
            target,
        });
        offset = end + 1;
    }

    urls
}
