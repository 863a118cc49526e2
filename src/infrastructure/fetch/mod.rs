mod http_audio_fetcher;

pub use http_audio_fetcher::HttpAudioFetcher;
