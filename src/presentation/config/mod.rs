mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    CallbackSettings, PipelineSettings, ServerSettings, Settings, SpeechSettings,
    TranscodingSettings,
};
