use serde::Deserialize;
use paysim_core::error::{PaysimError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub simulation: SimulationSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            simulation: SimulationSection::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PaysimError::BadRequest(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.server.validate()?;
        self.simulation.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Reported as `service` by `/health`.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Human-readable name and API version reported by `/`.
    #[serde(default = "default_display_name")]
    pub display_name: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            service_name: default_service_name(),
            display_name: default_display_name(),
            api_version: default_api_version(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(PaysimError::BadRequest(format!(
                "server.listen must be a valid socket address, got {:?}",
                self.listen
            )));
        }
        if self.service_name.trim().is_empty() {
            return Err(PaysimError::BadRequest("server.service_name must not be empty".into()));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:5000".into()
}
fn default_service_name() -> String {
    "monri-payment-api".into()
}
fn default_display_name() -> String {
    "Monri Payment API".into()
}
fn default_api_version() -> String {
    "1.0.0".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationSection {
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_error_rate")]
    pub error_rate: f64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            error_rate: default_error_rate(),
        }
    }
}

impl SimulationSection {
    pub fn validate(&self) -> Result<()> {
        if self.max_delay_ms > 60_000 {
            return Err(PaysimError::BadRequest(
                "simulation.max_delay_ms must be at most 60000".into(),
            ));
        }
        if self.min_delay_ms > self.max_delay_ms {
            return Err(PaysimError::BadRequest(
                "simulation.min_delay_ms must not exceed max_delay_ms".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.error_rate) {
            return Err(PaysimError::BadRequest(
                "simulation.error_rate must be between 0 and 1".into(),
            ));
        }
        Ok(())
    }
}

fn default_min_delay_ms() -> u64 {
    100
}
fn default_max_delay_ms() -> u64 {
    3000
}
fn default_error_rate() -> f64 {
    0.1
}
