use std::sync::LazyLock;

/// Where anonymous browsers are sent when a page requires login.
/// Default: "/"
pub static O2L_REDIRECT_ANON: LazyLock<String> =
    LazyLock::new(|| std::env::var("O2L_REDIRECT_ANON").unwrap_or_else(|_| "/".to_string()));
