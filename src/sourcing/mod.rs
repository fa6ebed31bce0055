//! Asynchronous sourcing of simulation data for the active selection
//!
//! - `store`: the document-store contract and its response envelopes
//! - `memory`: an in-process store for tests and demos
//! - `cache`: simulations already fetched this session
//! - `coordinator`: the selection state machine

pub mod store;
pub mod memory;
mod cache;
pub mod coordinator;

pub use store::{FinanceStore, ReadResponse, WriteResponse};
pub use memory::{InMemoryStore, StoreSnapshot};
pub use cache::SimulationCache;
pub use coordinator::{
    fetch_documents, Dispatch, FetchOutcome, FetchTicket, FetchedDocuments, Phase, Selection,
    Session, SimulationView, SourcingAction, SourcingCoordinator, SourcingState,
};
