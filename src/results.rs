mod execution;
mod row;

pub use execution::ExecutionResult;
pub use row::Row;
