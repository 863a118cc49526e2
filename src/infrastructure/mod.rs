pub mod callback;
pub mod fetch;
pub mod observability;
pub mod persistence;
pub mod stt;
pub mod transcode;
