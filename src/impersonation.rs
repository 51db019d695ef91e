//! Canned 404 responses that imitate well-known web servers.
//!
//! Non-permitted origins get one of these instead of anything that reveals
//! the admin interface exists.

/// Body of the plain (non-imitating) denial
pub const DEFAULT_BODY: &str = "Not Found.";
/// Headers of the plain (non-imitating) denial
pub const DEFAULT_HEADERS: &[(&str, &str)] = &[("Content-Type", "text/html")];

/// Apache 2.2 "Not Found" page
pub const APACHE_BODY: &str = concat!(
    "<!DOCTYPE HTML PUBLIC \"-//IETF//DTD HTML 2.0//EN\">\n",
    "<html><head>\n",
    "<title>404 Not Found</title>\n",
    "</head><body>\n",
    "<h1>Not Found</h1>\n",
    "<p>The requested URL was not found on this server.</p>\n",
    "<hr>\n",
    "<address>Apache/2.2.22 (Ubuntu) Server Port 80</address>\n",
    "</body></html>\n",
);
/// Apache 2.2 headers
pub const APACHE_HEADERS: &[(&str, &str)] = &[
    ("Server", "Apache/2.2.22 (Ubuntu)"),
    ("Content-Type", "text/html; charset=iso-8859-1"),
];

/// IIS 6 "The page cannot be found" page
pub const IIS_BODY: &str = concat!(
    "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 4.01//EN\" ",
    "\"http://www.w3.org/TR/html4/strict.dtd\">\n",
    "<HTML><HEAD><TITLE>The page cannot be found</TITLE>\n",
    "<META HTTP-EQUIV=\"Content-Type\" Content=\"text/html; charset=Windows-1252\">\n",
    "</HEAD><BODY>\n",
    "<h1>The page cannot be found</h1>\n",
    "The page you are looking for might have been removed, had its name changed, ",
    "or is temporarily unavailable.\n",
    "<hr>\n",
    "<p>HTTP Error 404 - File or directory not found.<br>",
    "Internet Information Services (IIS)</p>\n",
    "</BODY></HTML>\n",
);
/// IIS 6 headers
pub const IIS_HEADERS: &[(&str, &str)] = &[
    ("Server", "Microsoft-IIS/6.0"),
    ("X-Powered-By", "ASP.NET"),
    ("Content-Type", "text/html"),
];

/// Configured imitation flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpersonationType {
    Apache,
    Iis,
    Nginx,
    /// Anything else; answered like imitation were disabled
    Unrecognized,
}

impl ImpersonationType {
    /// Exact, case-sensitive match on the configured key; never fails.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "apache" => ImpersonationType::Apache,
            "iis" => ImpersonationType::Iis,
            "nginx" => ImpersonationType::Nginx,
            _ => ImpersonationType::Unrecognized,
        }
    }

    /// The (body, headers) pair sent for this flavour.
    ///
    /// `Nginx` deliberately answers with the Apache page; deployments rely on it.
    #[must_use]
    pub fn canned(self) -> (&'static str, &'static [(&'static str, &'static str)]) {
        match self {
            ImpersonationType::Apache | ImpersonationType::Nginx => (APACHE_BODY, APACHE_HEADERS),
            ImpersonationType::Iis => (IIS_BODY, IIS_HEADERS),
            ImpersonationType::Unrecognized => (DEFAULT_BODY, DEFAULT_HEADERS),
        }
    }
}
