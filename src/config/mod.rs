//! Загрузка настроек процесса (`config` + переменные `TOPICAL_*`).

pub mod settings;

pub use settings::Settings;
