pub mod chart_service;
pub mod convert_service;
pub mod history_service;
pub mod plot_service;
pub mod rate_service;
