pub mod db;
pub mod simulated;

pub use db::DbAdapter;
pub use simulated::SimulatedBackend;
