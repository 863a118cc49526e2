mod http_transcoder;

pub use http_transcoder::HttpTranscoder;
