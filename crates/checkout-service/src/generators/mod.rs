//! 生成器模块
//!
//! 提供演示数据的批量生成功能。

pub mod data_generator;

pub use data_generator::{DataGenerator, DemoDataset, GenerationStats, GeneratorConfig, user_id};
