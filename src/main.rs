use brrtdispatch::app::App;
use brrtdispatch::dispatcher::{query_map, route_params, Dispatcher};
use brrtdispatch::logging::{init_logging_with_config, LogConfig, LogFormat};
use brrtdispatch::middleware::{Middlewares, RequestIdMiddleware, TracingMiddleware};
use brrtdispatch::response::write_json;
use brrtdispatch::runtime_config::RuntimeConfig;
use brrtdispatch::server::HttpServer;
use clap::{Parser, ValueEnum};
use http::StatusCode;
use serde_json::json;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Pretty,
}

/// Demo server for the brrtdispatch dispatcher.
#[derive(Parser, Debug)]
#[command(name = "brrtdispatch-demo", version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "BRRTD_ADDR", default_value = "127.0.0.1:8080")]
    addr: String,

    /// Maximum request body in bytes (<= 0 disables); defaults to BRRTD_MAX_BODY_BYTES
    #[arg(long)]
    body_limit: Option<i64>,

    /// Worker threads; defaults to BRRTD_WORKERS
    #[arg(long)]
    workers: Option<usize>,

    /// Log level; defaults to BRRTD_LOG_LEVEL
    #[arg(long)]
    log_level: Option<String>,

    /// Log format; defaults to BRRTD_LOG_FORMAT
    #[arg(long, value_enum)]
    log_format: Option<Format>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut log_config = LogConfig::from_env();
    if let Some(level) = args.log_level {
        log_config.log_level = level;
    }
    if let Some(format) = args.log_format {
        log_config.format = match format {
            Format::Json => LogFormat::Json,
            Format::Pretty => LogFormat::Pretty,
        };
    }
    let _log_guard = init_logging_with_config(&log_config)?;

    let mut config = RuntimeConfig::from_env();
    if let Some(limit) = args.body_limit {
        config.max_body_bytes = limit;
    }
    if let Some(workers) = args.workers {
        config.workers = workers.max(1);
    }

    let app = App::from_builder(Dispatcher::builder().from_config(&config));
    let layers = Middlewares::new()
        .add(RequestIdMiddleware)
        .add(TracingMiddleware);

    app.get("/health", |w, _req| {
        if let Err(e) = write_json(w, StatusCode::OK, &json!({"status": "ok"})) {
            warn!(error = %e, "health response failed");
        }
    })
    .with_middlewares(layers.clone());

    app.get("/users/:id", |w, req| {
        let id = route_params(&req).and_then(|p| p.get("id")).unwrap_or_default();
        let query = query_map(&req).cloned().unwrap_or_default();
        if let Err(e) = write_json(w, StatusCode::OK, &json!({"id": id, "query": query})) {
            warn!(error = %e, "user response failed");
        }
    })
    .with_middlewares(layers.clone());

    app.post("/echo", |w, mut req| match req.body_mut().read_all() {
        Ok(body) => {
            if let Err(e) = w.write(&body) {
                warn!(error = %e, "echo write failed");
            }
        }
        Err(e) => warn!(error = %e, "echo read failed"),
    })
    .with_middlewares(layers.clone());

    app.get("/boom", |_w, _req| std::panic::panic_any("demo panic"))
        .with_middlewares(layers);

    let handle = HttpServer::new(app.dispatcher())
        .workers(config.workers)
        .start(args.addr.as_str())?;
    handle.wait_ready()?;
    info!(addr = %handle.addr(), body_limit = config.max_body_bytes, "brrtdispatch demo listening");

    handle
        .join()
        .map_err(|_| anyhow::anyhow!("worker thread panicked"))?;
    Ok(())
}
