//! End-to-end tests that drive the built binary through stdin and stdout
//!
//! Every request here fails before the service is contacted, so no network is
//! needed.

mod helpers;
mod test_check;
mod test_in;
mod test_out;
