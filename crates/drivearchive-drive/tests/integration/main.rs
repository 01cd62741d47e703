//! Integration tests for drivearchive-drive
//!
//! Uses wiremock to simulate the Google token endpoint and the Drive v3
//! API, and verifies end-to-end behavior of the credential sources, the
//! listing client and the upload encoder over a real HTTP transport.

mod common;

mod test_listing;
mod test_token_exchange;
mod test_transport;
mod test_upload;
