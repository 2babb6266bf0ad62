//! Ошибки реестра тем: коды статуса, `RegistryError`, `ListenerError` и
//! `StackError` с цепочкой контекстов для внешних границ.

pub mod ext;
pub mod stack;
pub mod status_code;
pub mod types;

pub use ext::*;
pub use stack::*;
pub use status_code::*;
pub use types::*;
