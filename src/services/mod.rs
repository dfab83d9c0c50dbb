pub mod admin_service;
pub mod admin_service_impl;
pub use admin_service::{AdminError, AdminService};
pub use admin_service_impl::SeaOrmAdminService;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginRequest, RegisterRequest, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;

pub mod lottery_service;
pub mod lottery_service_impl;
pub use lottery_service::{DrawView, LotteryError, LotteryService};
pub use lottery_service_impl::SeaOrmLotteryService;

pub mod security_log;
pub use security_log::{SecurityEvent, SecurityLog};

pub mod settlement;
pub mod validation;
