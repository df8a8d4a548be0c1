//! Command argument readers

use plume_core::CommandError;
use serde_json::Value;

fn invalid(name: &str, message: String) -> CommandError {
    CommandError::InvalidArguments {
        name: name.to_string(),
        message,
    }
}

pub(crate) fn string<'a>(name: &str, args: &'a [Value], index: usize) -> Result<&'a str, CommandError> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(name, format!("argument {index} must be a string")))
}

pub(crate) fn optional_string<'a>(args: &'a [Value], index: usize) -> Option<&'a str> {
    args.get(index).and_then(Value::as_str)
}

pub(crate) fn position(name: &str, args: &[Value], index: usize) -> Result<usize, CommandError> {
    args.get(index)
        .and_then(Value::as_u64)
        .and_then(|value| usize::try_from(value).ok())
        .ok_or_else(|| invalid(name, format!("argument {index} must be a position")))
}
