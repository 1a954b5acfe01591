//! Session application services.

mod updater;

pub use updater::SessionUpdater;
