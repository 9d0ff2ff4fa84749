//! CLI commands for askeval

pub mod dispatch;
pub mod input;
pub mod inspect;
pub mod refresh;
pub mod score;
pub mod split;
pub mod summary;
