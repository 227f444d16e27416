pub mod base;
pub mod logo_task;

pub use base::BaseDao;
pub use logo_task::LogoTaskDao;
