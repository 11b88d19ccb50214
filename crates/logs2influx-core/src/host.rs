//! Host metadata used for the `hostname` tag and `procid` field.

/// Source of machine name and process id.
///
/// Injected into the point builder so tests can pin both values.
pub trait HostInfo: Send + Sync {
    fn machine_name(&self) -> &str;
    fn process_id(&self) -> u32;
}

/// Host metadata captured once and reused for every point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSnapshot {
    machine_name: String,
    process_id: u32,
}

impl HostSnapshot {
    pub fn new(machine_name: impl Into<String>, process_id: u32) -> Self {
        Self {
            machine_name: machine_name.into(),
            process_id,
        }
    }

    /// Capture the current machine name and process id.
    pub fn current() -> Self {
        let machine_name = match hostname::get() {
            Ok(name) => name.to_string_lossy().into_owned(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read hostname, using 'localhost'");
                "localhost".to_string()
            }
        };

        Self {
            machine_name,
            process_id: std::process::id(),
        }
    }
}

impl HostInfo for HostSnapshot {
    fn machine_name(&self) -> &str {
        &self.machine_name
    }

    fn process_id(&self) -> u32 {
        self.process_id
    }
}
