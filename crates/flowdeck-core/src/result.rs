use crate::error::FlowdeckError;

pub type FlowdeckResult<T> = Result<T, FlowdeckError>;
