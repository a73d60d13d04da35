use std::default::Default;

#[derive(Clone, Debug)]
/// Configuration options for the relay connection and room sizing.
pub struct RelayConfig {
    /// Application id registered with the relay service.
    pub app_id: String,
    /// Application version; participants only meet peers on the same version.
    pub app_version: String,
    /// Preferred relay region. None lets the service pick the best region.
    pub region: Option<String>,
    /// Maximum participants per room. Sizes the connection pool and the
    /// identity map; must match the engine's configured maximum. A mismatch
    /// surfaces as a pool capacity violation when one peer too many connects.
    pub max_participants: usize,
    /// Ask the backend to reuse event instances and deliver payloads as
    /// pooled slices once the connection is established.
    pub reuse_event_buffers: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_version: "1.0".to_string(),
            region: None, // Best region selected by the service
            max_participants: 16,
            reuse_event_buffers: true,
        }
    }
}
