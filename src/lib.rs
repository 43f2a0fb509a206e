// Suzaku shared HTTP cache library
// RFC 9111 cache semantics behind two entry points: a reverse proxy
// (proxy + server) and a client-side transport decorator (transport).

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod proxy;
pub mod server;
pub mod transport;
