pub mod push_dispatcher;
pub mod token_store;

pub use push_dispatcher::{notification_data, PushDispatcher, SendPushRequest, ValidatedPush};
pub use token_store::{DeviceTokenStore, RestDeviceTokenStore};
