//! # Server Module
//!
//! Blocking HTTP/1.1 front end for a [`crate::dispatcher::Dispatcher`], built on
//! `tiny_http`.
//!
//! ```rust,no_run
//! use brrtdispatch::app::App;
//! use brrtdispatch::server::HttpServer;
//!
//! let app = App::new();
//! app.get("/health", |w, _req| {
//!     let _ = w.write(b"ok");
//! });
//! let handle = HttpServer::new(app.dispatcher()).workers(2).start("127.0.0.1:8080")?;
//! handle.wait_ready()?;
//! handle.stop();
//! # Ok::<(), std::io::Error>(())
//! ```

mod http_server;

pub use http_server::{HttpServer, ServerHandle};
