//! Document shapes exchanged with the store, and their loaders

pub mod coerce;
mod simulation;
mod project;
mod payment;
pub mod loader;

pub use simulation::{SimulationRecord, Calculation};
pub use project::{ProjectRecord, Association};
pub use payment::{PaymentHistoryEntry, PaymentHistoryPatch};
pub use loader::{load_simulations, load_projects, load_history, load_json};
