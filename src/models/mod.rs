// Domain models

mod growth;
mod sample;
mod server;
mod status;

pub use growth::GrowthStat;
pub use sample::{StatPoint, StatSample};
pub use server::{DEFAULT_PORT, NewServer, Server};
pub use status::ServerStatus;
