//! # 数据模型模块
//!
//! 定义物理量、物理属性、模型体系、收敛参数和模拟归档。
//!
//! ## 依赖关系
//! - 被 `outputs/`, `parsers/` 和 `commands/` 使用
//! - 子模块: quantity, property, numerical_settings, model_system, simulation

pub mod model_system;
pub mod numerical_settings;
pub mod property;
pub mod quantity;
pub mod simulation;

pub use model_system::ModelSystem;
pub use numerical_settings::{SelfConsistency, SelfConsistencyRef};
pub use property::FermiLevel;
pub use quantity::{Quantity, Unit};
pub use simulation::Simulation;
