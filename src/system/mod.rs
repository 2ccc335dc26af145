//! System utilities and monitoring
//!
//! Metrics and health reporting.

pub mod metrics;

pub mod health {
    //! Health checks
    use serde::{Deserialize, Serialize};

    /// Health report for the catalog and its store
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct HealthStatus {
        /// Overall service health status
        pub status: ServiceStatus,
        /// Whether the store answered a ping
        pub ping_store: bool,
    }

    /// Service health status levels
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum ServiceStatus {
        /// All systems functional
        Healthy,
        /// The store could not be reached
        Unhealthy,
    }

    impl HealthStatus {
        /// Build a report from the store ping result
        pub fn from_ping(ping_store: bool) -> Self {
            Self {
                status: if ping_store {
                    ServiceStatus::Healthy
                } else {
                    ServiceStatus::Unhealthy
                },
                ping_store,
            }
        }

        /// Whether everything is healthy
        pub fn is_healthy(&self) -> bool {
            self.status == ServiceStatus::Healthy
        }
    }
}

pub use health::{HealthStatus, ServiceStatus};
