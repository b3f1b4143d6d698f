// padwatch-api: async clients for the fleet API, OAuth token endpoint
// and bulk remediation gateway.

pub mod auth;
pub mod error;
pub mod fleet;
pub mod gateway;
pub mod transport;

pub use auth::{AccessToken, ClientCredentials, TokenClient};
pub use error::Error;
pub use fleet::{FleetClient, LaunchpadRecord};
pub use gateway::{BulkResetResponse, GatewayClient};
pub use transport::{TlsMode, TransportConfig};
