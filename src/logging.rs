use cfg_if::cfg_if;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};
use tracing_subscriber::util::SubscriberInitExt;

/// Used when RUST_LOG is unset: controller state transitions at debug,
/// everything else at info, and the chatty GPU stack at warn.
const DEFAULT_FILTER: &str = "info,thirdperson=debug,wgpu_core=warn,wgpu_hal=warn,naga=warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        /// Route spans and events to the browser console.
        pub fn init() {
            let console = tracing_wasm::WASMLayer::new(tracing_wasm::WASMLayerConfig::default());

            // Re-running start() on hot reload keeps the first subscriber
            let _ = tracing_subscriber::registry()
                .with(env_filter())
                .with(console)
                .try_init();

            #[cfg(feature = "console_error_panic_hook")]
            console_error_panic_hook::set_once();
        }
    } else {
        use std::path::{Path, PathBuf};
        use once_cell::sync::OnceCell;
        use tracing_appender::non_blocking::WorkerGuard;
        use tracing_subscriber::fmt;

        /// Keeps the file writer flushing until process exit.
        static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

        const DEFAULT_LOG_FILE: &str = "logs/thirdperson.log";

        fn log_file_path() -> PathBuf {
            std::env::var_os("RUST_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
        }

        /// Daily-rotated plain-text writer next to `path`.
        fn file_writer(path: &Path) -> tracing_appender::non_blocking::NonBlocking {
            let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let prefix = path.file_name().unwrap_or(std::ffi::OsStr::new("thirdperson.log"));
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, prefix));
            let _ = FILE_GUARD.set(guard);
            writer
        }

        fn log_panics() {
            std::panic::set_hook(Box::new(|info| {
                let payload = info
                    .payload()
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| info.payload().downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "<non-string panic>".to_string());
                let location = info
                    .location()
                    .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                    .unwrap_or_default();
                let backtrace = std::backtrace::Backtrace::force_capture();
                tracing::error!(%location, "panic: {payload}\n{backtrace}");
            }));
        }

        /// Compact stderr output plus a rolling log file (`RUST_LOG_FILE`).
        pub fn init() {
            let path = log_file_path();

            let stderr_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact();
            let file_layer = fmt::layer()
                .with_writer(file_writer(&path))
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .compact();

            let _ = tracing_subscriber::registry()
                .with(env_filter())
                .with(stderr_layer)
                .with(file_layer)
                .try_init();

            log_panics();
            tracing::debug!(log_file = %path.display(), "logging initialised");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        let filter = EnvFilter::try_new(DEFAULT_FILTER);
        assert!(filter.is_ok(), "default filter rejected: {:?}", filter.err());
        assert!(DEFAULT_FILTER.contains("thirdperson=debug"));
    }
}
