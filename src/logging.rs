use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "RECALL_CHAT_LOG";

/// Filter directives in priority order: `RECALL_CHAT_LOG`, `RUST_LOG`, then a default that
/// keeps this crate and `component` at debug.
pub fn filter_directives<F>(component: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    [LOG_ENV, "RUST_LOG"]
        .into_iter()
        .filter_map(|name| lookup(name))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty() && EnvFilter::try_new(value).is_ok())
        .unwrap_or_else(|| format!("info,recall_chat=debug,{component}=debug"))
}

/// Installs the global fmt subscriber. Later calls are no-ops.
pub fn init_tracing(component: &str) {
    let directives = filter_directives(component, |name| std::env::var(name).ok());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directives))
        .with_target(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .compact()
        .try_init();
}

/// Masks a credential for log output, keeping at most four characters at each end.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 11 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}***{tail}")
}
