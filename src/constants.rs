//! Application constants for the fuel price proxy
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Listening port override
    pub const PORT: &str = "PORT";

    /// Listening host override
    pub const HOST: &str = "HOST";
}

/// Upstream dataset source
pub mod upstream {
    /// Location of the gzip-compressed dataset
    pub const DATASET_URL: &str = "http://mzoe-gor.hr/data.gz";

    /// Header set sent with every upstream request.
    ///
    /// The upstream rejects requests that do not look like a desktop browser.
    pub const BROWSER_HEADERS: [(&str, &str); 3] = [
        ("accept-charset", "ISO-8859-1,utf-8;q=0.7,*;q=0.3"),
        ("accept-language", "en-US,en;q=0.8"),
        (
            "accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        ),
    ];

    /// Browser user agent sent upstream
    pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_6_8) AppleWebKit/537.13+ (KHTML, like Gecko) Version/5.1.7 Safari/534.57.2";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default upstream request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Skip upstream certificate verification unless configured otherwise
    pub const ACCEPT_INVALID_CERTS: bool = true;

    /// Largest upstream body accepted, compressed
    pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

    /// Upper bound on buffer space reserved from a Content-Length header
    pub const MAX_PREALLOCATION: usize = 8 * 1024 * 1024;
}

/// HTTP server defaults
pub mod server {
    /// Default bind host
    pub const DEFAULT_HOST: &str = "0.0.0.0";

    /// Default listening port
    pub const DEFAULT_PORT: u16 = 3000;

    /// Headers browsers may send cross-origin
    pub const CORS_ALLOWED_HEADERS: [&str; 4] = [
        "content-type",
        "authorization",
        "content-length",
        "x-requested-with",
    ];
}

/// Cache keys, one per dataset section plus the whole document
pub mod sections {
    /// Whole upstream document
    pub const ALL_DATA: &str = "allData";
    /// Fuel stations
    pub const STATIONS: &str = "postajas";
    /// Fuels
    pub const FUELS: &str = "gorivos";
    /// Reporting operators
    pub const OPERATORS: &str = "obvezniks";
    /// Station amenities
    pub const OPTIONS: &str = "opcijas";
    /// Day types
    pub const DAY_TYPES: &str = "vrsta_danas";
    /// Fuel-type categories
    pub const FUEL_CATEGORIES: &str = "vrsta_gorivas";
    /// Fuel-type kinds
    pub const FUEL_KINDS: &str = "tip_gorivas";

    /// Sections cached under their own key
    pub const PARTITIONED: [&str; 7] = [
        STATIONS,
        FUELS,
        OPERATORS,
        OPTIONS,
        DAY_TYPES,
        FUEL_CATEGORIES,
        FUEL_KINDS,
    ];

    /// Reference tables cached with the document but never served
    pub const HIDDEN: [&str; 3] = ["naseljes", "opcina_grads", "zupanijas"];
}

/// Refresh cycle timing
pub mod refresh {
    use super::Duration;

    /// Interval between scheduled refreshes
    pub const INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

    /// Local hour at which cached entries roll over
    pub const ROLLOVER_HOUR: u32 = 0;

    /// Local minute at which cached entries roll over
    pub const ROLLOVER_MINUTE: u32 = 2;

    /// Timeout for the scheduler task to stop on shutdown
    pub const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
}

/// Upstream records known to carry the wrong fuel-type category
pub mod fuel_patch {
    /// Fuel name shared by the mis-tagged diesel records
    pub const EURODIESEL_NAME: &str = "EURODIESEL BS";

    /// Ids of the mis-tagged diesel records
    pub const EURODIESEL_IDS: [i64; 2] = [29, 1055];

    /// Category the diesel records belong to
    pub const EURODIESEL_CATEGORY: i64 = 8;

    /// Id of the second mis-tagged fuel
    pub const FUEL_30_ID: i64 = 30;

    /// Category fuel 30 belongs to
    pub const FUEL_30_CATEGORY: i64 = 7;
}

/// Geographic calculations
pub mod geo {
    /// Earth diameter used by the distance approximation (km)
    pub const EARTH_DIAMETER_KM: f64 = 12742.0;
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

// Re-export commonly used constants for convenience
pub use http::DEFAULT_TIMEOUT as HTTP_TIMEOUT;
pub use server::DEFAULT_PORT;
pub use upstream::DATASET_URL;
