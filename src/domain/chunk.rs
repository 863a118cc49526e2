/// A time-bounded slice of the source audio produced by the transcoding
/// service. `index` defines merge order; offsets are absolute into the
/// source.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub index: usize,
    pub start_sec: f64,
    pub end_sec: f64,
    pub url: String,
}
