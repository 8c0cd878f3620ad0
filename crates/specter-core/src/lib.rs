#![deny(warnings)]

pub mod belief;
pub mod log;
pub mod model;
pub mod rules;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "specter-locator"
    }

    pub const fn codename() -> &'static str {
        "Hunter's Ledger"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
