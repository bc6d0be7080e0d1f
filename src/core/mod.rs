//! Core business logic - framework-agnostic ledger operations.
//!
//! Each submodule owns the state transitions of one entity family. Processors
//! never perform I/O beyond the entity reads and writes of the operation at
//! hand; every mutating operation is a single linear sequence of reads,
//! in-memory mutations, and one terminal commit.

/// Account CRUD and the balance mutator
pub mod account;
/// Budget CRUD, period resolution, and renewal
pub mod budget;
/// Goal CRUD and contribution processing
pub mod goal;
/// Home dashboard aggregation
pub mod home;
/// Subscription CRUD and billing
pub mod subscription;
/// Transaction processing with compensating balance and budget updates
pub mod transaction;
/// User lookup and registration records
pub mod user;
