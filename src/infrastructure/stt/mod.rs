mod openai_speech_engine;

pub use openai_speech_engine::OpenAiSpeechEngine;
