use once_cell::sync::OnceCell;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

static INIT: OnceCell<()> = OnceCell::new();

/// Library and CLI events at `info`, everything else (hyper, rustls) at `warn`.
const DEFAULT_FILTER: &str = "warn,dashchat_stream=info,dashchat=info";

fn parse_bool_env(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

fn observability_enabled() -> bool {
    std::env::var("DASHCHAT_OBSERVABILITY_ENABLED")
        .ok()
        .map(|value| parse_bool_env(&value).unwrap_or(true))
        .unwrap_or(true)
}

fn resolve_env_filter(
    level: Option<String>,
    rust_log: Option<String>,
) -> tracing_subscriber::EnvFilter {
    level
        .into_iter()
        .chain(rust_log)
        .find_map(|directives| tracing_subscriber::EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize logging once per process.
///
/// Environment variables:
/// - `DASHCHAT_OBSERVABILITY_ENABLED`: optional enable/disable flag (default enabled).
/// - `DASHCHAT_LOG_LEVEL`: optional level/filter override (`info`, `debug`, etc.).
/// - `DASHCHAT_JSON_LOG_PATH`: optional log file path. If set, logs are JSONL in that file.
///   If unset, logs go to stderr in a compact console format so they do not mix
///   with streamed answer text on stdout.
/// - `RUST_LOG`: optional filter, used when `DASHCHAT_LOG_LEVEL` is unset or
///   invalid.
///
/// Without either, only this crate and the `dashchat` binary log at `info`.
/// Session work runs inside a `chat_session` span carrying `session_id`, so
/// both outputs tag every line with the session it belongs to.
pub fn init_observability() {
    INIT.get_or_init(|| {
        if !observability_enabled() {
            return;
        }

        let env_filter = resolve_env_filter(
            std::env::var("DASHCHAT_LOG_LEVEL").ok(),
            std::env::var("RUST_LOG").ok(),
        );
        if let Ok(path_raw) = std::env::var("DASHCHAT_JSON_LOG_PATH") {
            let path = std::path::PathBuf::from(path_raw);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                let _ = std::fs::create_dir_all(parent);
            }
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("dashchat.logs.jsonl");
            let writer = tracing_appender::rolling::never(dir, file_name);
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(false)
                .with_writer(writer);
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(json_layer)
                .try_init();
        } else {
            let console_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr);
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .try_init();
        }
    });
}
