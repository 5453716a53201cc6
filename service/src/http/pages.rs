//! Generated HTML bodies: error pages and directory listings.

use axum::{
    body::Body,
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    response::Response,
};

const HTML_UTF8: &str = "text/html; charset=utf-8";

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
    pub is_symlink: bool,
}

impl ListingEntry {
    fn display_name(&self) -> String {
        if self.is_symlink {
            format!("{}@", self.name)
        } else if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }

    fn href(&self) -> String {
        let encoded = urlencoding::encode(&self.name);
        if self.is_dir {
            format!("{encoded}/")
        } else {
            encoded.into_owned()
        }
    }
}

/// Escape text for inclusion in HTML element content or a quoted attribute.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the HTML body for an error status.
#[must_use]
pub fn error_page(status: StatusCode) -> String {
    let reason = status.canonical_reason().unwrap_or("Unknown error");
    format!(
        "<!DOCTYPE HTML>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>Error response</title>\n\
         </head>\n\
         <body>\n\
         <h1>Error response</h1>\n\
         <p>Error code: {code}</p>\n\
         <p>Message: {reason}.</p>\n\
         </body>\n\
         </html>\n",
        code = status.as_u16(),
        reason = escape_html(reason),
    )
}

/// Build a complete error response with an HTML body.
#[must_use]
pub fn error_response(status: StatusCode) -> Response {
    html_response(status, error_page(status))
}

/// Render a directory listing. `display_path` is the decoded request path.
///
/// Entries are listed case-insensitively by name regardless of input order.
#[must_use]
pub fn directory_listing(display_path: &str, entries: &[ListingEntry]) -> String {
    let mut sorted: Vec<&ListingEntry> = entries.iter().collect();
    sorted.sort_by_key(|entry| entry.name.to_lowercase());

    let title = format!("Directory listing for {}", escape_html(display_path));
    let mut page = format!(
        "<!DOCTYPE HTML>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{title}</title>\n\
         </head>\n\
         <body>\n\
         <h1>{title}</h1>\n\
         <hr>\n\
         <ul>\n"
    );
    for entry in sorted {
        page.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            escape_html(&entry.href()),
            escape_html(&entry.display_name()),
        ));
    }
    page.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    page
}

/// Wrap an HTML document in a response with explicit content headers.
#[must_use]
pub fn html_response(status: StatusCode, html: String) -> Response {
    let length = html.len();
    let mut response = Response::new(Body::from(html));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(HTML_UTF8));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    response
}
