/// FCM Push Library
///
/// Sends push notifications through the Firebase Cloud Messaging HTTP v1 API
/// using a Google service account.
///
/// It handles:
/// - Service account loading and validation
/// - RS256 JWT-bearer assertions signed with the account's PKCS8 key
/// - Access token exchange (no caching, one token per send)
/// - Single message delivery with Android and APNs image hints
/// - Injectable HTTP transport with explicit timeout budgets

pub mod assertion;
pub mod client;
pub mod clock;
pub mod credential;
pub mod errors;
pub mod models;
pub mod token;
pub mod transport;

pub use client::FcmClient;
pub use clock::{Clock, FixedClock, SystemClock};
pub use credential::ServiceCredential;
pub use errors::{CallFailure, FcmError};
pub use models::{DeliveryReceipt, PushNotification, ServiceAccountKey};
pub use token::AccessTokenProvider;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};
