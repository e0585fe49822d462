//! End-to-end scenarios against the in-memory block service.

mod e2e_files;
mod shared;
mod wire;
