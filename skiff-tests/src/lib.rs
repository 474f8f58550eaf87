mod cursors;
mod departments;
mod extraction;
mod kinds;
mod odd;
#[cfg(not(feature = "disable-returning"))]
mod returning;
mod schema;
mod units;

use cursors::cursors;
use departments::departments;
use extraction::extraction;
use kinds::kinds;
pub use log;
use log::LevelFilter;
use odd::odd;
#[cfg(not(feature = "disable-returning"))]
use returning::returning;
use skiff::ConnectionSource;
use std::env;
use units::units;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Runs the whole suite against the database behind `source`.
///
/// Every table the suite uses is dropped and created again first.
pub fn execute_tests<S: ConnectionSource>(source: &S) {
    departments(source);
    cursors(source);
    kinds(source);
    extraction(source);
    odd(source);
    units(source);
    #[cfg(not(feature = "disable-returning"))]
    returning(source);
}

/// Evaluates the code with logging turned off, for failures the test expects.
#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = $crate::log::max_level();
        $crate::log::set_max_level($crate::log::LevelFilter::Off);
        let result = { $($code)+ };
        $crate::log::set_max_level(level);
        result
    }};
}
