use std::{backtrace::Backtrace, cell::RefCell, sync::Once, time::Instant};

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::errors::FaultLocation;

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
    install_panic_hook();
}

thread_local! {
    static LAST_PANIC: RefCell<Option<FaultLocation>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Routes panics through `tracing` with the panic site and a backtrace taken
/// before unwinding, and remembers the site for `take_panic_location`.
pub fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let location = info.location().map(FaultLocation::from);
            let message = info
                .payload()
                .downcast_ref::<&str>()
                .map(|message| message.to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());

            let site = location
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "unknown".to_string());
            error!(
                error = %message,
                location = %site,
                backtrace = %Backtrace::force_capture(),
                "panic"
            );
            LAST_PANIC.with(|slot| *slot.borrow_mut() = location);

            // Without a global subscriber (tests) the event above goes nowhere.
            if !tracing::dispatcher::has_been_set() {
                previous(info);
            }
        }));
    });
}

/// Site of the most recent panic on this thread, if the hook recorded one.
pub fn take_panic_location() -> Option<FaultLocation> {
    LAST_PANIC.with(|slot| slot.borrow_mut().take())
}

/// Logs one summary line per request. Event streams are logged when their
/// headers go out; the stream's own lifetime is logged by the session.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started_at = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started_at.elapsed().as_millis();
    let streaming = response
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|value| value.as_bytes().starts_with(b"text/event-stream"));

    if streaming {
        info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            setup_ms = elapsed_ms,
            "event stream established"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = elapsed_ms,
            "request summary"
        );
    }

    if status.is_server_error() {
        warn!(method = %method, path = %path, status = status.as_u16(), "request failed");
    }

    response
}


#[cfg(test)]
mod tests {
    use super::{capture::LogCapture, install_panic_hook, take_panic_location};

    #[test]
    fn panic_hook_logs_and_records_panic_site() {
        install_panic_hook();
        let logs = LogCapture::default();

        let expected_line = line!() + 2;
        let result = tracing::subscriber::with_default(logs.subscriber(), || {
            std::panic::catch_unwind(|| panic!("worker exploded"))
        });

        assert!(result.is_err());
        let location = take_panic_location().expect("panic site recorded");
        assert!(location.file.ends_with("logging.rs"));
        assert_eq!(location.line, expected_line);

        let output = logs.contents();
        assert!(output.contains("worker exploded"));
        assert!(output.contains(&format!("logging.rs:{expected_line}")));
        assert!(output.contains("backtrace"));
    }

    #[test]
    fn panic_location_is_taken_once() {
        install_panic_hook();
        let _ = std::panic::catch_unwind(|| panic!("first"));

        assert!(take_panic_location().is_some());
        assert!(take_panic_location().is_none());
    }
}
