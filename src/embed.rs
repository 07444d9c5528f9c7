//! Origin selection for the embedded stretch-timer app

use crate::config::EmbedOrigins;

const LOCAL_HOSTS: [&str; 4] = ["localhost", "127.0.0.1", "[::1]", "0.0.0.0"];

/// True when the page is served from the developer's machine
pub fn is_local_host(hostname: &str) -> bool {
    let host = hostname.trim().to_ascii_lowercase();
    LOCAL_HOSTS.contains(&host.as_str()) || host.ends_with(".localhost")
}

/// Development origin on local hosts, production everywhere else
pub fn embed_origin<'a>(hostname: &str, origins: &'a EmbedOrigins) -> &'a str {
    if is_local_host(hostname) {
        &origins.development
    } else {
        &origins.production
    }
}

/// Full iframe `src` for `path` on the selected origin
pub fn embed_src(hostname: &str, origins: &EmbedOrigins, path: &str) -> String {
    let origin = embed_origin(hostname, origins).trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        format!("{}/", origin)
    } else {
        format!("{}/{}", origin, path)
    }
}
