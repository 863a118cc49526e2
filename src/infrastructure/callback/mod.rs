mod recording_gateway;

pub use recording_gateway::{HttpRecordingGateway, NoopRecordingGateway};
