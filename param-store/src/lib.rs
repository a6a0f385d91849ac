pub mod store;
pub mod memory_store;
pub mod local_store;
pub mod ssm_store;

pub use store::{Parameter, ParameterStore, ParamResult, ParameterType, PutOptions, StoreLimits};
pub use memory_store::{BatchOrder, CallCounts, MemoryParameterStore};
pub use local_store::LocalParameterStore;
pub use ssm_store::{SsmConfig, SsmParameterStore};
