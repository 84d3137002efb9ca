// ------------------------------------------------------------
// Module declarations
// ------------------------------------------------------------
//
// Each module represents a well-defined responsibility:
//
// - config:     Configuration structs loaded from JSON
// - error:      Worker and index error types
// - schema:     Outcome, Bid and Verification types
// - metrics:    Global lock-free runtime counters
// - worker:     Panic-safe execution of a single task
// - selector:   Bounded-time selection (one producer vs a deadline)
// - collector:  Fan-out / fan-in collection with a countdown
// - bidding:    Ad auction built on the selector
// - checksum:   Signature index verification built on the collector
// - sleepsort:  Completion-order demo built on the collector
// - util:       Small timing helpers
//
pub mod bidding;
pub mod checksum;
pub mod collector;
pub mod config;
pub mod error;
pub mod metrics;
pub mod schema;
pub mod selector;
pub mod sleepsort;
pub mod util;
pub mod worker;
