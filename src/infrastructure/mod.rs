//! 基础设施层
//!
//! 持有远程资源（HTTP 客户端、凭据），只暴露能力，不认识 Quiz / Feedback 等业务概念。
//!
//! - `DocumentStore` - 文档存储能力（按集合增、查、删、自增）
//! - `FirestoreStore` - 基于 Firestore REST 的实现
//! - `MemoryStore` - 进程内实现，用于离线运行和测试
//! - `IdentityClient` - 通过 ID Token 查询当前用户

pub mod document_store;
pub mod firestore;
pub mod firestore_value;
pub mod identity_client;
pub mod memory_store;

pub use document_store::{DocumentStore, JsonMap, OrderBy, StoredDocument};
pub use firestore::FirestoreStore;
pub use identity_client::IdentityClient;
pub use memory_store::MemoryStore;
