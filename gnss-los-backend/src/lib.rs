pub mod catalog;
pub mod clock;
pub mod config;
pub mod console;
pub mod driver;
pub mod export;
pub mod logging;
pub mod presenter;
pub mod propagation;
