pub mod astro_ephemeris;
pub mod chart;
pub mod ephemeris_trait;
pub mod error;
pub mod http_server;
pub mod position_resolver;
pub mod query;
pub mod renderer;
pub mod sequence;
pub mod snapshot;
