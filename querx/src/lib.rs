//! Querx Client Library
//!
//! Reads temperature, humidity and dew point values from Querx sensor
//! appliances. The device serves its readings as an XML document behind a
//! form login that sets a session cookie.
//!
//! # Example
//!
//! ```rust,no_run
//! use querx::{DeviceClient, TH_SENSOR_TEMPERATURE};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut client = DeviceClient::new("192.168.192.236", 80, false)?;
//!     client.login("admin", "secret").await?;
//!
//!     let sensor = client.sensor_by_index(TH_SENSOR_TEMPERATURE).await?;
//!     let value = client.current_value(&sensor).await?;
//!     println!("{}: {} {}", sensor.name, value, sensor.unit);
//!
//!     for alert in sensor.alerts() {
//!         println!("alert: {}", alert);
//!     }
//!
//!     // Polling cadence is up to the caller
//!     client.refresh_current().await?;
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod net;
mod types;

pub use client::DeviceClient;
pub use config::{ClientConfig, DEFAULT_TLS_TIMEOUT_SECS};
pub use error::{QuerxError, Result};
pub use net::{HttpTransport, Transport, CURRENT_VALUES_PATH, LOGIN_PATH};
pub use types::*;
