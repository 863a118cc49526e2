/// Configuration for tracing initialization. Built from `Settings`, which
/// owns the environment variable surface.
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
}
