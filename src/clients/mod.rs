pub mod firefighter_client;
pub mod gateway;

pub use firefighter_client::FirefighterClient;
pub use gateway::{DetailsSource, RequestGateway, RequestRepository};
