//! 基础设施层
//!
//! 持有进程外资源（本地存储文件），只暴露读写能力，不认识业务流程

pub mod order_store;

pub use order_store::{
    clear_order, load_order, save_order, JsonFileStore, KeyValueStore, MemoryStore,
    ORDER_STORE_KEY, VIEW_MODE_KEY,
};
