pub mod settings;

pub use settings::{
    AppSettings, DatabaseSettings, JwtSettings, RealtimeSettings, Settings,
};
