use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub broker_host: String,
    pub broker_port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub client_id: String,
    /// Topic prefix scoping all announcements handled by this daemon.
    pub namespace: String,
    /// Directory holding local registration entries.  Defaults to the
    /// `applications` directory under the XDG data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applications_dir: Option<PathBuf>,
    /// Delay before subscribing, so retained announcements do not fire a
    /// burst of notifications right at startup.
    pub startup_delay_secs: u64,
    pub connect_timeout_secs: u64,
    /// Auto-dismiss timeout for third-party update notifications.
    pub notify_timeout_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            broker_host: "broker.hivemq.com".into(),
            broker_port: 1883,
            username: None,
            password: None,
            client_id: "upwatch".into(),
            namespace: "p9q358t".into(),
            applications_dir: None,
            startup_delay_secs: 60,
            connect_timeout_secs: 30,
            notify_timeout_ms: 120_000,
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let mut config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("upwatch.toml"))
            .merge(Json::file("upwatch.json"))
            .merge(Env::prefixed("UPWATCH_"))
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        // Support Docker-style secrets
        if let Ok(password_file) = std::env::var("UPWATCH_PASSWORD_FILE") {
            config.password = Some(std::fs::read_to_string(password_file)?.trim().to_string());
        }

        Ok(config)
    }

    /// Resolved registration directory.
    pub fn applications_dir(&self) -> PathBuf {
        self.applications_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("applications")
        })
    }
}
