#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

use rocket::{Build, Rocket};

pub mod api;
pub mod audit;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

/// Build the rocket, ready for launch. Configuration and the database
/// connection are handled by the ignite fairings, so a failure in either
/// aborts the launch before any request is served.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(config::ConfigFairing)
        .attach(config::DatabaseFairing)
        .attach(logging::LoggerFairing)
        .manage(audit::AuditLog)
}
