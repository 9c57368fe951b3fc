use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum DrawError {
    #[error("ball number {value} is outside {min}..={max}")]
    OutOfRange { value: u8, min: u8, max: u8 },
    #[error("ball number {value} appears more than once")]
    Duplicate { value: u8 },
    #[error("a draw needs exactly {expected} numbers, got {actual}")]
    WrongCount { expected: usize, actual: usize },
    #[error("random source failed to produce distinct numbers after {attempts} attempts")]
    SamplingExhausted { attempts: usize },
}
