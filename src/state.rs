use reqwest::Client;

use crate::{
    config::Config,
    services::{ChatService, ContactService, Ga4Service, GoogleOAuthService},
};

/// 应用程序的共享状态
///
/// Every service shares one `reqwest::Client` and its connection pool.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,

    /// Google 登录
    pub oauth_service: GoogleOAuthService,

    pub ga4_service: Ga4Service,

    pub chat_service: ChatService,

    pub contact_service: ContactService,
}

impl AppState {
    pub fn new(config: Config, http_client: Client) -> Self {
        let oauth_service = GoogleOAuthService::new(&config, http_client.clone());
        let ga4_service = Ga4Service::new(&config, http_client.clone());
        let chat_service = ChatService::new(&config, http_client.clone(), ga4_service.clone());
        let contact_service = ContactService::new(&config, http_client);

        Self {
            config,
            oauth_service,
            ga4_service,
            chat_service,
            contact_service,
        }
    }

    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.config.is_production()
    }
}
