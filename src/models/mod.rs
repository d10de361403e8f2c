//! Domain types shared by the registry, proxy, and control-plane layers.

pub mod api_definition;
pub mod notification;
pub mod oas;
pub mod oauth_client;
pub mod policy;
pub mod session;

pub use api_definition::{ApiDefinition, Protocol, VersionDefinition, VersionLocation};
pub use notification::{Notification, NotificationCommand};
pub use oas::{OasDocument, XTykApiGateway};
pub use oauth_client::{OauthClient, OauthToken};
pub use policy::Policy;
pub use session::Session;
