pub mod auth;
pub mod chat;
pub mod contact;
pub mod ga4;

// 重新导出常用类型
pub use auth::{AuthenticatedSession, GoogleOAuthService};
pub use chat::ChatService;
pub use contact::ContactService;
pub use ga4::Ga4Service;
